use crate::{
    error::{Error, Result},
    pipeline::{drain, fetch_artist_info, fetch_audio_features},
    spotify::Upstream,
    types::{ArtistInfo, AudioFeatures, PlaylistRecord, PlaylistRef, SongRecord, TrackRef},
    warning,
};

/// Builds the [`PlaylistRecord`] of one playlist.
///
/// Stages run strictly in order: list every track (following pagination to
/// the end), derive the track and primary-artist id lists, fetch audio
/// features and artist details concurrently, zip the three lists by index.
/// Errors are returned to the caller, which decides whether they end the run.
pub async fn aggregate_playlist<U>(upstream: &U, playlist: &PlaylistRef) -> Result<PlaylistRecord>
where
    U: Upstream + ?Sized,
{
    let tracks = drain(|cursor| upstream.list_tracks(&playlist.id, cursor))
        .await
        .map_err(|e| e.for_playlist(&playlist.id))?;

    let (track_ids, artist_ids): (Vec<String>, Vec<String>) = tracks
        .iter()
        .map(|t| (t.track_id.clone(), t.artist_id.clone()))
        .unzip();

    let (features, artists) = futures::try_join!(
        fetch_audio_features(upstream, &playlist.id, &track_ids),
        fetch_artist_info(upstream, &playlist.id, &artist_ids),
    )?;

    let songs = zip_songs(&playlist.id, tracks, features, artists)?;

    Ok(PlaylistRecord {
        name: playlist.name.clone(),
        songs,
    })
}

/// Merges track `i`, features `i` and artist `i` into song `i`.
///
/// Fails with [`Error::Alignment`] without producing any song when the three
/// lists differ in length.
pub fn zip_songs(
    playlist_id: &str,
    tracks: Vec<TrackRef>,
    features: Vec<Option<AudioFeatures>>,
    artists: Vec<ArtistInfo>,
) -> Result<Vec<SongRecord>> {
    if tracks.len() != features.len() || tracks.len() != artists.len() {
        let err = Error::Alignment {
            playlist_id: playlist_id.to_string(),
            tracks: tracks.len(),
            features: features.len(),
            artists: artists.len(),
        };
        warning!("{}", err);
        return Err(err);
    }

    Ok(tracks
        .into_iter()
        .zip(features)
        .zip(artists)
        .map(|((track, statistics), artist)| SongRecord::new(track, statistics, artist))
        .collect())
}
