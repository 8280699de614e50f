//! Spotify Playlist Visualization Data Library
//!
//! This library collects the authenticated user's Spotify playlists, the audio
//! features of every track and the genres and images of every primary artist,
//! and flattens them into one JSON document consumed by the visualization
//! front-end (artist graph, track table, genre ranking, radar chart).
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by every layer
//! - `management` - Token persistence and the shared credential holder
//! - `pipeline` - Batching, fetching, zipping and the concurrent driver
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API client and the upstream abstraction
//! - `types` - Upstream payloads and the output document schema
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use spotviz::{
//!     config::Config,
//!     management::{Credentials, TokenManager},
//!     pipeline::Pipeline,
//!     spotify::SpotifyClient,
//! };
//!
//! #[tokio::main]
//! async fn main() -> spotviz::Result<()> {
//!     let config = Config::from_env()?;
//!     let token = TokenManager::new(config.token_path()).load().await?;
//!     let credentials = Arc::new(Credentials::new(token));
//!     let client = SpotifyClient::new(&config, credentials)?;
//!     let report = Pipeline::new(Arc::new(client), config.concurrency).run().await?;
//!     println!("{} playlists", report.document.len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod pipeline;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::{Error, Result};

/// Prints an informational message with a blue bullet point.
///
/// Creates a formatted output line with a distinctive blue "o" indicator
/// followed by the provided message. Used for general information and
/// status updates throughout the application.
///
/// # Example
///
/// ```
/// info!("Fetching playlists...");
/// info!("Found {} playlists", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Authentication completed successfully");
/// success!("Wrote {} playlists", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Terminates the program with exit code 1 after printing. Only the CLI
/// layer uses it; library code returns [`Error`] instead.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration");
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues the user should notice, such as a skipped
/// playlist entry or a retried request.
///
/// # Example
///
/// ```
/// warning!("Skipped {} local tracks", skipped);
/// warning!("Rate limited, retrying in {} seconds", secs);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
