use crate::{
    error::Result,
    pipeline::align_batch,
    spotify::{ARTISTS_BATCH, Upstream},
    types::{Artist, ArtistInfo},
    utils,
};

/// Fetches genres and images for the primary artist of every track.
///
/// `artist_ids` has one entry per track, so the same artist usually appears
/// many times; ids are not deduplicated and the output keeps one
/// [`ArtistInfo`] per input slot, in input order. Artists the upstream
/// answers with `null` (removed or invalid ids) get [`ArtistInfo::unknown`].
pub async fn fetch_artist_info<U>(
    upstream: &U,
    playlist_id: &str,
    artist_ids: &[String],
) -> Result<Vec<ArtistInfo>>
where
    U: Upstream + ?Sized,
{
    let mut infos = Vec::with_capacity(artist_ids.len());

    for batch in utils::chunk(artist_ids, ARTISTS_BATCH)? {
        let response = upstream
            .artists(batch)
            .await
            .map_err(|e| e.for_playlist(playlist_id))?;

        let aligned = align_batch("artists", batch, response, |a: &Artist| Some(a.id.as_str()))
            .map_err(|e| e.for_playlist(playlist_id))?;

        infos.extend(aligned.into_iter().map(|artist| match artist {
            Some(artist) => ArtistInfo::from(artist),
            None => ArtistInfo::unknown(),
        }));
    }

    Ok(infos)
}
