//! Error types for spotviz.

use std::time::Duration;

use thiserror::Error;

/// Main error type for spotviz operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The access token was rejected or could not be refreshed.
    #[error("access token expired or revoked, run `spotviz auth` again")]
    AuthExpired,

    /// Network failure, server error or malformed payload from the upstream API.
    #[error("upstream request failed for {scope}: {reason}")]
    UpstreamFailure { scope: String, reason: String },

    /// The upstream API answered 429 Too Many Requests.
    #[error("rate limited by upstream (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Track, feature and artist lists of a playlist differ in length.
    #[error(
        "misaligned data for playlist {playlist_id}: {tracks} tracks, {features} feature records, {artists} artist records"
    )]
    Alignment {
        playlist_id: String,
        tracks: usize,
        features: usize,
        artists: usize,
    },

    /// A caller passed an argument outside the function's contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing or malformed configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The run was cancelled before it completed.
    #[error("run cancelled")]
    Cancelled,
}

impl Error {
    pub fn upstream(scope: impl Into<String>, reason: impl ToString) -> Self {
        Error::UpstreamFailure {
            scope: scope.into(),
            reason: reason.to_string(),
        }
    }

    /// Attaches the playlist id to upstream failures so the failure manifest
    /// says which playlist a batch belonged to.
    pub fn for_playlist(self, playlist_id: &str) -> Self {
        match self {
            Error::UpstreamFailure { scope, reason } => Error::UpstreamFailure {
                scope: format!("playlist {playlist_id} ({scope})"),
                reason,
            },
            other => other,
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::AuthExpired => "auth_expired",
            Error::UpstreamFailure { .. } => "upstream_failure",
            Error::RateLimited { .. } => "rate_limited",
            Error::Alignment { .. } => "alignment",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Cancelled => "cancelled",
        }
    }

    /// Errors that end the whole run instead of a single playlist.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::AuthExpired | Error::Cancelled)
    }
}

/// Result type for spotviz operations.
pub type Result<T> = std::result::Result<T, Error>;
