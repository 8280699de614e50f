use crate::{
    error::Result,
    pipeline::align_batch,
    spotify::{AUDIO_FEATURES_BATCH, Upstream},
    types::AudioFeatures,
    utils,
};

/// Fetches audio features for the tracks of one playlist.
///
/// Issues one request per batch of [`AUDIO_FEATURES_BATCH`] ids and returns
/// exactly one slot per input id, in input order. A slot is `None` when the
/// upstream has no analysis for that track. A failed batch fails the whole
/// fetch; the error names the playlist.
pub async fn fetch_audio_features<U>(
    upstream: &U,
    playlist_id: &str,
    track_ids: &[String],
) -> Result<Vec<Option<AudioFeatures>>>
where
    U: Upstream + ?Sized,
{
    let mut features = Vec::with_capacity(track_ids.len());

    for batch in utils::chunk(track_ids, AUDIO_FEATURES_BATCH)? {
        let response = upstream
            .audio_features(batch)
            .await
            .map_err(|e| e.for_playlist(playlist_id))?;

        let aligned = align_batch("audio features", batch, response, |f: &AudioFeatures| {
            f.id.as_deref()
        })
        .map_err(|e| e.for_playlist(playlist_id))?;

        features.extend(aligned);
    }

    Ok(features)
}
