use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    api,
    error::{Error, Result},
    spotify::SpotifyAuth,
    types::PkceToken,
};

/// Binds the callback server address.
///
/// # Errors
///
/// - [`Error::Config`] when `addr` is not a socket address
/// - [`Error::Io`] when the port cannot be bound (already in use, no permission)
pub async fn bind_api_server(addr: &str) -> Result<TcpListener> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| Error::Config(format!("failed to parse server address {addr}: {e}")))?;

    Ok(TcpListener::bind(&addr).await?)
}

/// Serves `/health` and the OAuth `/callback` on `listener` until the task is
/// aborted by the login flow.
pub async fn start_api_server(
    listener: TcpListener,
    state: Arc<Mutex<Option<PkceToken>>>,
    auth: Arc<SpotifyAuth>,
) -> Result<()> {
    let app = Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback))
        .layer(Extension(state))
        .layer(Extension(auth));

    axum::serve(listener, app).await?;
    Ok(())
}
