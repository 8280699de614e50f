use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::{
    config::Config,
    error::{Error, Result},
    management::Credentials,
    spotify::{ARTISTS_BATCH, AUDIO_FEATURES_BATCH, Upstream},
    types::{
        Artist, ArtistsResponse, AudioFeatures, AudioFeaturesResponse, Page, PlaylistRef,
        PlaylistTrackItem, TrackRef,
    },
    warning,
};

const PLAYLIST_PAGE_LIMIT: &str = "50";
const TRACK_PAGE_LIMIT: &str = "100";
const TRACK_FIELDS: &str = "items(track(id,name,popularity,album(name),artists(id,name))),next";

/// How failed requests are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries of a transient failure (network error, 5xx) before giving up.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on every further attempt.
    pub base_delay: Duration,
    /// Upper bound for a single wait, including waits asked for by `Retry-After`.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Outcome of a single failed request attempt.
enum Attempt {
    Retry(Error),
    Fatal(Error),
}

/// HTTP implementation of [`Upstream`] against the Spotify Web API.
///
/// Every request reads the current access token from the shared
/// [`Credentials`], so a background refresh is picked up by the next request
/// without restarting the run.
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    credentials: Arc<Credentials>,
    retry: RetryPolicy,
}

impl SpotifyClient {
    /// Creates a client for the API configured in `config`.
    pub fn new(config: &Config, credentials: Arc<Credentials>) -> Result<Self> {
        let retry = RetryPolicy {
            max_retries: config.max_retries,
            ..RetryPolicy::default()
        };
        Self::with_base_url(&config.api_url, credentials, retry)
    }

    /// Creates a client for an arbitrary API base URL.
    pub fn with_base_url(
        api_url: &str,
        credentials: Arc<Credentials>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("spotviz/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            credentials,
            retry,
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        Url::parse_with_params(&format!("{}{}", self.api_url, path), params)
            .map_err(|e| Error::Config(format!("invalid API URL {}: {}", self.api_url, e)))
    }

    fn cursor_url(cursor: &str, scope: &str) -> Result<Url> {
        Url::parse(cursor).map_err(|e| Error::upstream(scope, format!("invalid next URL: {e}")))
    }

    /// Performs a GET request and decodes the JSON body.
    ///
    /// # Retry Logic
    ///
    /// - `429 Too Many Requests` waits for `Retry-After` (or the backoff delay
    ///   when the header is missing) and retries without limit
    /// - Network errors and `5xx` responses are retried with exponential
    ///   backoff up to `max_retries` times
    /// - `401 Unauthorized` returns [`Error::AuthExpired`] immediately
    /// - Any other status returns [`Error::UpstreamFailure`] immediately
    async fn get_json<T: DeserializeOwned>(&self, url: &Url, scope: &str) -> Result<T> {
        let mut failures = 0u32;
        let mut throttled = 0u32;

        loop {
            match self.try_get(url, scope).await {
                Ok(value) => return Ok(value),
                Err(Attempt::Retry(Error::RateLimited { retry_after })) => {
                    let wait = retry_after
                        .unwrap_or_else(|| self.retry.backoff(throttled))
                        .min(self.retry.max_delay);
                    throttled += 1;
                    warning!(
                        "Rate limited while fetching {}, retrying in {}s",
                        scope,
                        wait.as_secs_f32()
                    );
                    sleep(wait).await;
                }
                Err(Attempt::Retry(err)) if failures < self.retry.max_retries => {
                    let wait = self.retry.backoff(failures);
                    failures += 1;
                    warning!(
                        "{} (attempt {}/{}), retrying in {}s",
                        err,
                        failures,
                        self.retry.max_retries,
                        wait.as_secs_f32()
                    );
                    sleep(wait).await;
                }
                Err(Attempt::Retry(err)) | Err(Attempt::Fatal(err)) => return Err(err),
            }
        }
    }

    async fn try_get<T: DeserializeOwned>(
        &self,
        url: &Url,
        scope: &str,
    ) -> std::result::Result<T, Attempt> {
        let token = self.credentials.access_token().await;
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Attempt::Retry(Error::upstream(scope, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Attempt::Fatal(Error::AuthExpired));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(Attempt::Retry(Error::RateLimited { retry_after }));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = Error::upstream(scope, format!("HTTP {}: {}", status.as_u16(), body.trim()));
            return Err(if status.is_server_error() {
                Attempt::Retry(err)
            } else {
                Attempt::Fatal(err)
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Attempt::Fatal(Error::upstream(scope, format!("malformed payload: {e}"))))
    }
}

#[async_trait]
impl Upstream for SpotifyClient {
    async fn list_playlists(&self, cursor: Option<String>) -> Result<Page<PlaylistRef>> {
        let scope = "playlist listing";
        let url = match cursor {
            Some(next) => Self::cursor_url(&next, scope)?,
            None => self.endpoint("/me/playlists", &[("limit", PLAYLIST_PAGE_LIMIT)])?,
        };

        // collaborative and followed playlists can come back as null slots
        let page: Page<Option<PlaylistRef>> = self.get_json(&url, scope).await?;
        Ok(Page {
            items: page.items.into_iter().flatten().collect(),
            next: page.next,
        })
    }

    async fn list_tracks(
        &self,
        playlist_id: &str,
        cursor: Option<String>,
    ) -> Result<Page<TrackRef>> {
        let scope = format!("tracks of playlist {playlist_id}");
        let url = match cursor {
            Some(next) => Self::cursor_url(&next, &scope)?,
            None => self.endpoint(
                &format!("/playlists/{playlist_id}/tracks"),
                &[("limit", TRACK_PAGE_LIMIT), ("fields", TRACK_FIELDS)],
            )?,
        };

        let page: Page<PlaylistTrackItem> = self.get_json(&url, &scope).await?;
        let total = page.items.len();
        let items: Vec<TrackRef> = page
            .items
            .into_iter()
            .filter_map(PlaylistTrackItem::into_track_ref)
            .collect();

        if items.len() < total {
            warning!(
                "Skipped {} entries of playlist {} without track or artist id (local files or unavailable tracks)",
                total - items.len(),
                playlist_id
            );
        }

        Ok(Page {
            items,
            next: page.next,
        })
    }

    async fn audio_features(&self, track_ids: &[String]) -> Result<Vec<Option<AudioFeatures>>> {
        if track_ids.len() > AUDIO_FEATURES_BATCH {
            return Err(Error::InvalidArgument(format!(
                "at most {} track ids per audio-features request, got {}",
                AUDIO_FEATURES_BATCH,
                track_ids.len()
            )));
        }
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = track_ids.join(",");
        let url = self.endpoint("/audio-features", &[("ids", ids.as_str())])?;
        let response: AudioFeaturesResponse = self.get_json(&url, "audio features").await?;
        Ok(response.audio_features)
    }

    async fn artists(&self, artist_ids: &[String]) -> Result<Vec<Option<Artist>>> {
        if artist_ids.len() > ARTISTS_BATCH {
            return Err(Error::InvalidArgument(format!(
                "at most {} artist ids per artists request, got {}",
                ARTISTS_BATCH,
                artist_ids.len()
            )));
        }
        if artist_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = artist_ids.join(",");
        let url = self.endpoint("/artists", &[("ids", ids.as_str())])?;
        let response: ArtistsResponse = self.get_json(&url, "artists").await?;
        Ok(response.artists)
    }
}
