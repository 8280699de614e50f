//! Configuration management for spotviz.
//!
//! This module handles loading and resolving configuration values from
//! environment variables and `.env` files. It provides a centralized way to
//! manage Spotify API credentials, the OAuth callback server and the tuning
//! knobs of the aggregation pipeline.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_SCOPE: &str = "playlist-read-private playlist-read-collaborative user-read-private";
pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_OUTPUT: &str = "playlists_data.json";

/// Returns the platform-specific directory holding `.env` and the token cache.
///
/// - Linux: `~/.local/share/spotviz`
/// - macOS: `~/Library/Application Support/spotviz`
/// - Windows: `%LOCALAPPDATA%/spotviz`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotviz");
    path
}

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the directory if it doesn't exist. A missing `.env` file is not an
/// error: every value can also come from the process environment.
///
/// # Errors
///
/// Returns [`Error::Io`] if the directory cannot be created and
/// [`Error::Config`] if an existing `.env` file cannot be parsed.
///
/// # Example
///
/// ```
/// use spotviz::config;
///
/// #[tokio::main]
/// async fn main() {
///     if let Err(e) = config::load_env().await {
///         eprintln!("Configuration error: {}", e);
///     }
/// }
/// ```
pub async fn load_env() -> Result<()> {
    let dir = data_dir();
    async_fs::create_dir_all(&dir).await?;

    let path = dir.join(".env");
    if path.is_file() {
        dotenv::from_path(&path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    }
    Ok(())
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Spotify Web API (`SPOTIFY_API_URL`).
    pub api_url: String,
    /// OAuth authorization endpoint (`SPOTIFY_API_AUTH_URL`).
    pub auth_url: String,
    /// OAuth token endpoint (`SPOTIFY_API_TOKEN_URL`).
    pub token_url: String,
    /// Client id of the registered Spotify application (`SPOTIFY_API_AUTH_CLIENT_ID`).
    pub client_id: String,
    /// Callback URL registered with the application (`SPOTIFY_API_REDIRECT_URI`).
    pub redirect_uri: String,
    /// Space separated scopes requested at login (`SPOTIFY_API_AUTH_SCOPE`).
    pub scope: String,
    /// Bind address of the local callback server (`SERVER_ADDRESS`).
    pub server_addr: String,
    /// Playlists aggregated at the same time (`SPOTVIZ_CONCURRENCY`).
    pub concurrency: usize,
    /// Retries of a failed upstream request before giving up (`SPOTVIZ_MAX_RETRIES`).
    pub max_retries: u32,
    /// Where `spotviz data` writes the document (`SPOTVIZ_OUTPUT`).
    pub output: PathBuf,
}

impl Config {
    /// Resolves the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves the configuration through an arbitrary key lookup.
    ///
    /// Only the client id is mandatory; every other value has a default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let client_id = lookup("SPOTIFY_API_AUTH_CLIENT_ID")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config("SPOTIFY_API_AUTH_CLIENT_ID must be set".to_string()))?;

        let concurrency = parse_number(
            "SPOTVIZ_CONCURRENCY",
            lookup("SPOTVIZ_CONCURRENCY"),
            DEFAULT_CONCURRENCY,
        )?;
        if concurrency == 0 {
            return Err(Error::Config(
                "SPOTVIZ_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let max_retries = parse_number(
            "SPOTVIZ_MAX_RETRIES",
            lookup("SPOTVIZ_MAX_RETRIES"),
            DEFAULT_MAX_RETRIES,
        )?;

        Ok(Self {
            api_url: value("SPOTIFY_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            auth_url: value("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: value("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            client_id,
            redirect_uri: value("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI),
            scope: value("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE),
            server_addr: value("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            concurrency,
            max_retries,
            output: PathBuf::from(value("SPOTVIZ_OUTPUT", DEFAULT_OUTPUT)),
        })
    }

    /// Path of the persisted OAuth token.
    pub fn token_path(&self) -> PathBuf {
        data_dir().join("cache/token.json")
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw.filter(|v| !v.trim().is_empty()) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| Error::Config(format!("{key} must be a non-negative number, got {v:?}"))),
        None => Ok(default),
    }
}
