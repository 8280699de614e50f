use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tabled::Tabled;

/// Placeholder used for artists the upstream no longer knows about.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

impl Token {
    /// Unix timestamp at which the access token stops being accepted.
    pub fn expires_at(&self) -> u64 {
        self.obtained_at + self.expires_in
    }

    /// Seconds from `now` until the token should be refreshed, keeping
    /// `margin` seconds of headroom before expiry.
    pub fn refresh_due_in(&self, now: u64, margin: u64) -> u64 {
        self.expires_at().saturating_sub(margin).saturating_sub(now)
    }
}

#[derive(Debug, Clone)]
pub struct PkceToken {
    pub code_verifier: String,
    pub token: Option<Token>,
}

/// One page of a paginated upstream listing. `next` is the continuation
/// cursor, `None` once the listing is exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaylistRef {
    pub id: String,
    pub href: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrackItem {
    pub track: Option<PlaylistTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrack {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub popularity: u32,
    pub album: Option<AlbumRef>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub id: Option<String>,
    pub name: String,
}

impl PlaylistTrackItem {
    /// Flattens a playlist entry into a [`TrackRef`]. Entries without a
    /// track id or primary artist id (local files, removed tracks, podcast
    /// episodes) cannot be looked up upstream and yield `None`.
    pub fn into_track_ref(self) -> Option<TrackRef> {
        let track = self.track?;
        let track_id = track.id?;
        let primary = track.artists.into_iter().next()?;
        let artist_id = primary.id?;

        Some(TrackRef {
            track_id,
            artist_id,
            artist_name: primary.name,
            album_name: track.album.map(|a| a.name).unwrap_or_default(),
            track_name: track.name,
            popularity: track.popularity,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackRef {
    pub track_id: String,
    pub artist_id: String,
    pub artist_name: String,
    pub album_name: String,
    pub track_name: String,
    pub popularity: u32,
}

/// Per-track audio attributes. Attributes not named here are kept verbatim
/// in `extra` so the document carries everything the upstream returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AudioFeatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub energy: f64,
    pub valence: f64,
    pub acousticness: f64,
    pub danceability: f64,
    pub speechiness: f64,
    pub liveness: f64,
    pub loudness: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<AudioFeatures>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistsResponse {
    pub artists: Vec<Option<Artist>>,
}

/// Artist images as rendered in the document: the image list, or the
/// string `"unknown"` for artists the upstream could not resolve.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtistImages {
    Known(Vec<Image>),
    Unknown,
}

impl Serialize for ArtistImages {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ArtistImages::Known(images) => images.serialize(serializer),
            ArtistImages::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ArtistInfo {
    pub genres: Vec<String>,
    pub images: ArtistImages,
}

impl ArtistInfo {
    /// Sentinel substituted when the upstream returns `null` for an artist id.
    pub fn unknown() -> Self {
        Self {
            genres: vec![UNKNOWN.to_string()],
            images: ArtistImages::Unknown,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.images == ArtistImages::Unknown
    }
}

impl From<Artist> for ArtistInfo {
    fn from(artist: Artist) -> Self {
        Self {
            genres: artist.genres,
            images: ArtistImages::Known(artist.images),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SongArtist {
    pub name: String,
    pub genres: Vec<String>,
    pub image: ArtistImages,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SongRecord {
    pub track_id: String,
    pub album_name: String,
    pub song_name: String,
    pub popularity: u32,
    pub artists: SongArtist,
    pub genres: Vec<String>,
    pub statistics: Option<AudioFeatures>,
}

impl SongRecord {
    pub fn new(track: TrackRef, statistics: Option<AudioFeatures>, artist: ArtistInfo) -> Self {
        Self {
            track_id: track.track_id,
            album_name: track.album_name,
            song_name: track.track_name,
            popularity: track.popularity,
            genres: artist.genres.clone(),
            artists: SongArtist {
                name: track.artist_name,
                genres: artist.genres,
                image: artist.images,
            },
            statistics,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlaylistRecord {
    pub name: String,
    pub songs: Vec<SongRecord>,
}

/// Manifest entry for a playlist that could not be aggregated.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistFailure {
    pub playlist_id: String,
    pub name: String,
    pub kind: String,
    pub message: String,
}

/// Outcome of one pipeline run: the document in playlist listing order plus
/// every playlist left out of it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub document: Vec<PlaylistRecord>,
    pub failures: Vec<PlaylistFailure>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn song_count(&self) -> usize {
        self.document.iter().map(|p| p.songs.len()).sum()
    }
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub playlist: String,
    pub songs: String,
    pub status: String,
}
