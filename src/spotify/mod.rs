//! # Spotify Integration Module
//!
//! This module is the integration layer between spotviz and the Spotify Web
//! API. It defines the [`Upstream`] abstraction the aggregation pipeline is
//! written against, the HTTP implementation of it, and the OAuth 2.0 PKCE
//! flow that produces the bearer credential every request carries.
//!
//! ## Architecture
//!
//! ```text
//! Pipeline (aggregator, driver)
//!          ↓
//! Upstream trait
//!     ├── SpotifyClient (reqwest, retries, rate limiting)
//!     └── in-memory fakes (tests)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Core Modules
//!
//! ### Authentication Module
//!
//! [`auth`] - Implements the OAuth 2.0 PKCE flow:
//! - **Authorize URL**: Builds the consent URL with the code challenge
//! - **Code Exchange**: Trades the callback code plus verifier for a token
//! - **Refresh**: Renews the access token, keeping the refresh token when
//!   Spotify does not rotate it
//! - **Login Flow**: Browser launch, local callback server, token persistence
//!
//! ### Client Module
//!
//! [`client`] - The HTTP [`Upstream`] implementation:
//! - **Pagination**: Returns the `next` URL as continuation cursor
//! - **Batch Endpoints**: `/audio-features` (100 ids) and `/artists` (50 ids)
//! - **Rate Limiting**: 429 responses honor `Retry-After` and are always retried
//! - **Transient Errors**: Network errors and 5xx are retried with exponential
//!   backoff up to a bounded count
//! - **Authentication Errors**: 401 surfaces as [`crate::Error::AuthExpired`]
//!   and is never retried
//!
//! ## API Coverage
//!
//! - `GET /me/playlists` - Playlists of the current user
//! - `GET /playlists/{id}/tracks` - Entries of one playlist
//! - `GET /audio-features` - Audio attributes for up to 100 tracks
//! - `GET /artists` - Artist details for up to 50 artists
//! - `POST /api/token` - Code exchange and token refresh

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{Artist, AudioFeatures, Page, PlaylistRef, TrackRef},
};

pub mod auth;
pub mod client;

pub use auth::SpotifyAuth;
pub use client::{RetryPolicy, SpotifyClient};

/// Maximum number of track ids accepted by one audio-features request.
pub const AUDIO_FEATURES_BATCH: usize = 100;

/// Maximum number of artist ids accepted by one artists request.
pub const ARTISTS_BATCH: usize = 50;

/// The upstream operations the aggregation pipeline depends on.
///
/// Paginated listings take the continuation cursor of the previous page
/// (`None` for the first page). Batch lookups return one slot per requested
/// id; a slot is `None` when the upstream answered `null` for that id.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Lists one page of the current user's playlists.
    async fn list_playlists(&self, cursor: Option<String>) -> Result<Page<PlaylistRef>>;

    /// Lists one page of entries of a playlist.
    async fn list_tracks(&self, playlist_id: &str, cursor: Option<String>)
    -> Result<Page<TrackRef>>;

    /// Fetches audio features for at most [`AUDIO_FEATURES_BATCH`] tracks.
    async fn audio_features(&self, track_ids: &[String]) -> Result<Vec<Option<AudioFeatures>>>;

    /// Fetches artist details for at most [`ARTISTS_BATCH`] artists.
    async fn artists(&self, artist_ids: &[String]) -> Result<Vec<Option<Artist>>>;
}
