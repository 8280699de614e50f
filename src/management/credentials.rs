use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use tokio::{sync::RwLock, task::JoinHandle, time::sleep};

use crate::{
    error::{Error, Result},
    info,
    management::TokenManager,
    types::Token,
    warning,
};

/// Seconds before expiry at which the access token is renewed.
pub const REFRESH_MARGIN_SECS: u64 = 240;

const REFRESH_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Exchanges a refresh token for a new access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<Token>;
}

/// Process-wide holder of the access/refresh token pair.
///
/// Requests read the access token through [`Credentials::access_token`];
/// only the refresh routine writes it. The lock guarantees readers never see
/// a half-replaced token.
pub struct Credentials {
    token: RwLock<Token>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    store: Option<TokenManager>,
}

impl Credentials {
    /// Holds a fixed token. Without a refresher the token is never renewed.
    pub fn new(token: Token) -> Self {
        Self {
            token: RwLock::new(token),
            refresher: None,
            store: None,
        }
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Persists every refreshed token through `store`.
    pub fn with_store(mut self, store: TokenManager) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn access_token(&self) -> String {
        self.token.read().await.access_token.clone()
    }

    pub async fn current(&self) -> Token {
        self.token.read().await.clone()
    }

    /// Refreshes right away if the token is inside the refresh margin, so a
    /// run never starts with a token about to expire.
    pub async fn ensure_fresh(&self) -> Result<()> {
        let due_in = self.token.read().await.refresh_due_in(now(), REFRESH_MARGIN_SECS);
        if due_in == 0 {
            self.refresh_now().await?;
        }
        Ok(())
    }

    /// Replaces the token with a freshly refreshed one.
    ///
    /// Fails with [`Error::AuthExpired`] when no refresher is configured.
    pub async fn refresh_now(&self) -> Result<()> {
        let refresher = self.refresher.as_ref().ok_or(Error::AuthExpired)?;
        let refresh_token = self.token.read().await.refresh_token.clone();

        let mut fresh = refresher.refresh(&refresh_token).await?;
        if fresh.refresh_token.is_empty() {
            fresh.refresh_token = refresh_token;
        }

        if let Some(store) = &self.store {
            if let Err(e) = store.persist(&fresh).await {
                warning!("Failed to save refreshed token to {}: {}", store.path().display(), e);
            }
        }

        *self.token.write().await = fresh;
        Ok(())
    }

    /// Spawns the background task that renews the token
    /// [`REFRESH_MARGIN_SECS`] before it expires. A failed refresh is retried
    /// shortly after; the task ends when it is aborted or no refresher is set.
    pub fn spawn_refresh_task(self: &Arc<Self>) -> JoinHandle<()> {
        let credentials = Arc::clone(self);
        tokio::spawn(async move {
            if credentials.refresher.is_none() {
                return;
            }

            loop {
                let due_in = credentials
                    .token
                    .read()
                    .await
                    .refresh_due_in(now(), REFRESH_MARGIN_SECS);
                sleep(Duration::from_secs(due_in)).await;

                match credentials.refresh_now().await {
                    Ok(()) => info!("Access token refreshed."),
                    Err(e) => {
                        warning!("Token refresh failed: {}", e);
                        sleep(REFRESH_RETRY_DELAY).await;
                    }
                }
            }
        })
    }
}

fn now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}
