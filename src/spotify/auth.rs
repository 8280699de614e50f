use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{
    config::Config,
    error::{Error, Result},
    management::{TokenManager, TokenRefresher},
    server::{bind_api_server, start_api_server},
    types::{PkceToken, Token},
    utils, warning,
};

const LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    #[serde(default)]
    scope: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

impl TokenResponse {
    fn into_token(self, previous_refresh_token: &str) -> Token {
        Token {
            access_token: self.access_token,
            refresh_token: self
                .refresh_token
                .unwrap_or_else(|| previous_refresh_token.to_string()),
            scope: self.scope,
            expires_in: self.expires_in,
            obtained_at: Utc::now().timestamp().max(0) as u64,
        }
    }
}

/// Client of the Spotify accounts service.
///
/// Builds the authorization URL, exchanges authorization codes for tokens
/// and refreshes expired access tokens. Uses the PKCE flow, so no client
/// secret is stored or transmitted.
pub struct SpotifyAuth {
    http: Client,
    auth_url: String,
    token_url: String,
    client_id: String,
    redirect_uri: String,
}

impl SpotifyAuth {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }

    /// Builds the URL the user opens to grant `scope` to the application.
    ///
    /// # Arguments
    ///
    /// * `scope` - Space separated list of requested scopes
    /// * `code_challenge` - SHA256 challenge derived from the PKCE verifier
    pub fn authorize_url(&self, scope: &str, code_challenge: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", code_challenge),
                ("scope", scope),
            ],
        )
        .map_err(|e| Error::Config(format!("invalid authorize URL {}: {}", self.auth_url, e)))?;

        Ok(url.to_string())
    }

    /// Exchanges an authorization code for an access token using PKCE.
    ///
    /// # Arguments
    ///
    /// * `code` - Authorization code received from the OAuth callback
    /// * `verifier` - PKCE code verifier generated at the start of the flow
    ///
    /// # Errors
    ///
    /// Returns [`Error::UpstreamFailure`] when the accounts service rejects
    /// the code (expired, reused, verifier mismatch) or cannot be reached.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Token> {
        let scope = "token exchange";
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("code", code),
                ("code_verifier", verifier),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::upstream(scope, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(
                scope,
                format!("HTTP {}: {}", status.as_u16(), body.trim()),
            ));
        }

        let json: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(scope, format!("malformed payload: {e}")))?;

        if json.refresh_token.is_none() {
            return Err(Error::upstream(scope, "response carries no refresh token"));
        }
        Ok(json.into_token(""))
    }

    /// Refreshes an expired access token using a refresh token.
    ///
    /// Spotify may or may not rotate the refresh token; when the response
    /// carries none, the given one is kept.
    ///
    /// # Errors
    ///
    /// - [`Error::AuthExpired`] when the refresh token was revoked or is invalid
    /// - [`Error::UpstreamFailure`] for network or service errors
    pub async fn refresh(&self, refresh_token: &str) -> Result<Token> {
        let scope = "token refresh";
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::upstream(scope, e))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(Error::AuthExpired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(
                scope,
                format!("HTTP {}: {}", status.as_u16(), body.trim()),
            ));
        }

        let json: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(scope, format!("malformed payload: {e}")))?;
        Ok(json.into_token(refresh_token))
    }
}

#[async_trait]
impl TokenRefresher for SpotifyAuth {
    async fn refresh(&self, refresh_token: &str) -> Result<Token> {
        SpotifyAuth::refresh(self, refresh_token).await
    }
}

/// Runs the complete OAuth 2.0 PKCE login flow.
///
/// 1. **PKCE Setup**: Generates a code verifier and its SHA256 challenge
/// 2. **Server Start**: Binds and launches the local callback server, before
///    the browser is opened
/// 3. **Browser Launch**: Opens the authorization URL in the default browser
/// 4. **Callback Handling**: The server exchanges the returned code for a token
/// 5. **Token Persistence**: The token is saved for later `spotviz data` runs
///
/// Browser launch failures only print the URL for manual navigation.
///
/// # Errors
///
/// - [`Error::Config`] / [`Error::Io`] when the callback server address is
///   invalid or cannot be bound
/// - [`Error::AuthExpired`] when no token arrives within two minutes
/// - IO/JSON errors when the token cannot be saved
pub async fn login(config: &Config) -> Result<Token> {
    let auth = Arc::new(SpotifyAuth::new(config));
    let shared_state: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));

    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let auth_url = auth.authorize_url(&config.scope, &code_challenge)?;

    // store verifier before the browser can hit the callback
    {
        let mut lock = shared_state.lock().await;
        *lock = Some(PkceToken {
            code_verifier,
            token: None,
        });
    }

    let listener = bind_api_server(&config.server_addr).await?;
    let server = tokio::spawn(start_api_server(
        listener,
        Arc::clone(&shared_state),
        Arc::clone(&auth),
    ));

    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let token = wait_for_callback(server, shared_state, LOGIN_TIMEOUT).await?;
    TokenManager::new(config.token_path()).persist(&token).await?;
    Ok(token)
}

/// Waits until the callback handler stored a token in `shared_state`.
///
/// The callback `server` task is aborted once the wait is over. A server
/// that stops early ends the wait with the server's error.
///
/// # Errors
///
/// - The server's own error when it fails while waiting
/// - [`Error::AuthExpired`] when no token arrives within `timeout`
pub async fn wait_for_callback(
    mut server: JoinHandle<Result<()>>,
    shared_state: Arc<Mutex<Option<PkceToken>>>,
    timeout: Duration,
) -> Result<Token> {
    let outcome = tokio::select! {
        token = wait_for_token(shared_state, timeout) => token.ok_or(Error::AuthExpired),
        stopped = &mut server => match stopped {
            Ok(Err(e)) => Err(e),
            Ok(Ok(())) => Err(Error::upstream("callback server", "stopped before a token arrived")),
            Err(e) => Err(Error::upstream("callback server", e)),
        },
    };

    server.abort();
    outcome
}

/// Polls the shared state until the callback handler stored a token or
/// `timeout` elapsed.
async fn wait_for_token(
    shared_state: Arc<Mutex<Option<PkceToken>>>,
    timeout: Duration,
) -> Option<Token> {
    let start = Instant::now();

    while start.elapsed() < timeout {
        let lock = shared_state.lock().await;
        if let Some(token) = lock.as_ref().and_then(|pkce| pkce.token.clone()) {
            return Some(token);
        }
        drop(lock);
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    None
}
