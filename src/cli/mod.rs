//! # CLI Module
//!
//! Command-line layer of spotviz. It resolves configuration, wires the
//! credential holder, HTTP client and pipeline together, and turns results
//! into user-facing output.
//!
//! ## Commands
//!
//! - [`auth`] - Runs the Spotify OAuth PKCE login and saves the token
//! - [`data`] - Produces the visualization document for the logged-in user
//!
//! ## Data Flow of `data`
//!
//! 1. **Authentication Check**: Load the saved token, refresh it if it is
//!    about to expire, start the background refresh task
//! 2. **Pipeline Run**: List playlists and aggregate them concurrently
//! 3. **Output**: Write the document, plus a failure manifest when some
//!    playlists could not be aggregated
//! 4. **Summary**: Print one table row per playlist
//!
//! Ctrl-C cancels the run; nothing is written for a cancelled run.
//!
//! ## Exit Status
//!
//! `data` exits with 0 when a document was written, complete or partial,
//! and with 1 on configuration, authentication or listing errors.
//!
//! ## Usage
//!
//! ```bash
//! spotviz auth                                  # Authenticate with Spotify
//! spotviz data                                  # Write playlists_data.json
//! spotviz data --output web/data.json --concurrency 3
//! ```

mod auth;
mod data;

pub use auth::auth;
pub use data::data;
