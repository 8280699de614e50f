//! # Aggregation Pipeline
//!
//! Turns paginated, batched upstream responses into the flattened
//! playlist/song/artist document.
//!
//! ```text
//! driver      list playlists ─┬─ aggregator (bounded concurrency, listing order kept)
//!                             │
//! aggregator  list tracks → derive ids → ┬ features fetcher ┬→ zip → PlaylistRecord
//!                                        └ artists fetcher  ┘
//! fetchers    chunk ids → one request per batch → align to requested ids
//! ```
//!
//! Per-playlist failures end up in the [`crate::types::RunReport`] failure
//! manifest; only [`crate::Error::AuthExpired`] and cancellation abort a run.

use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    warning,
};

pub mod aggregator;
pub mod artists;
pub mod driver;
pub mod features;
pub mod paging;

pub use aggregator::{aggregate_playlist, zip_songs};
pub use artists::fetch_artist_info;
pub use driver::Pipeline;
pub use features::fetch_audio_features;
pub use paging::drain;

/// Lines up one batch response with the ids it was requested for.
///
/// The response must have one slot per requested id. When every returned
/// record names its id, slots are matched by id, so a reordered response
/// still lands in the right place; otherwise they are matched by position.
/// A requested id that no record names (the upstream answered with a
/// canonical id instead) takes the record at its own position.
pub(crate) fn align_batch<T, K>(
    scope: &str,
    requested: &[String],
    response: Vec<Option<T>>,
    key: K,
) -> Result<Vec<Option<T>>>
where
    T: Clone,
    K: Fn(&T) -> Option<&str>,
{
    if response.len() != requested.len() {
        return Err(Error::upstream(
            scope,
            format!(
                "batch of {} ids answered with {} records",
                requested.len(),
                response.len()
            ),
        ));
    }

    let keyed = response.iter().flatten().all(|record| key(record).is_some());
    if !keyed {
        return Ok(response);
    }

    let mut position: HashMap<&str, usize> = HashMap::with_capacity(response.len());
    for (i, record) in response.iter().enumerate() {
        if let Some(id) = record.as_ref().and_then(|r| key(r)) {
            position.entry(id).or_insert(i);
        }
    }

    let mut fallbacks = 0;
    let aligned: Vec<Option<T>> = requested
        .iter()
        .enumerate()
        .map(|(i, id)| match position.get(id.as_str()) {
            Some(&j) => response[j].clone(),
            None => {
                if response[i].is_some() {
                    fallbacks += 1;
                }
                response[i].clone()
            }
        })
        .collect();

    if fallbacks > 0 {
        warning!(
            "{} {} records carry ids that were not requested, matched them by position",
            fallbacks,
            scope
        );
    }

    Ok(aligned)
}
