mod auth;
mod credentials;

pub use auth::TokenManager;
pub use credentials::{Credentials, REFRESH_MARGIN_SECS, TokenRefresher};
