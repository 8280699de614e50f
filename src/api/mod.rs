//! # Local Callback API
//!
//! HTTP endpoints served by the temporary server that runs during
//! `spotviz auth`.
//!
//! - [`callback`] - Receives the OAuth authorization code, exchanges it
//!   together with the stored PKCE verifier for a token and hands the token
//!   back to the waiting login flow.
//! - [`health`] - Reports status and version, useful to check that the
//!   redirect URI points at the running server.
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use spotviz::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .route("/health", get(health));
//! ```

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
