use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{Error, Result},
    info,
    pipeline::{aggregate_playlist, drain},
    spotify::Upstream,
    types::{PlaylistFailure, PlaylistRecord, PlaylistRef, RunReport},
    warning,
};

/// Produces the document for the currently authenticated user.
///
/// Playlists are aggregated with at most `concurrency` of them in flight.
/// A finished playlist frees its slot right away; results are put back in
/// the order the upstream listed the playlists when the run is collected.
pub struct Pipeline<U: ?Sized> {
    upstream: Arc<U>,
    concurrency: usize,
}

impl<U> Pipeline<U>
where
    U: Upstream + ?Sized,
{
    pub fn new(upstream: Arc<U>, concurrency: usize) -> Self {
        Self {
            upstream,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs the whole pipeline once.
    ///
    /// A playlist that fails is reported in [`RunReport::failures`] and the
    /// remaining playlists still complete. [`Error::AuthExpired`] aborts the
    /// run, dropping every request still in flight.
    pub async fn run(&self) -> Result<RunReport> {
        let upstream = &*self.upstream;
        let playlists = drain(|cursor| upstream.list_playlists(cursor)).await?;
        info!("Found {} playlists.", playlists.len());

        let mut outcomes: Vec<(usize, std::result::Result<PlaylistRecord, PlaylistFailure>)> =
            stream::iter(playlists.iter().enumerate())
                .map(|(index, playlist)| async move {
                    settle(playlist, aggregate_playlist(upstream, playlist).await)
                        .map(|outcome| (index, outcome))
                })
                .buffer_unordered(self.concurrency)
                .try_collect()
                .await?;
        outcomes.sort_by_key(|(index, _)| *index);

        let mut report = RunReport::default();
        for (_, outcome) in outcomes {
            match outcome {
                Ok(record) => report.document.push(record),
                Err(failure) => report.failures.push(failure),
            }
        }

        Ok(report)
    }

    /// Runs the pipeline until it completes or `cancel` fires. Cancelling
    /// drops all outstanding requests of the run and returns
    /// [`Error::Cancelled`].
    pub async fn run_until_cancelled(&self, cancel: &CancellationToken) -> Result<RunReport> {
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            report = self.run() => report,
        }
    }
}

/// Splits a playlist result into run-ending errors and per-playlist outcomes.
fn settle(
    playlist: &PlaylistRef,
    result: Result<PlaylistRecord>,
) -> Result<std::result::Result<PlaylistRecord, PlaylistFailure>> {
    match result {
        Ok(record) => Ok(Ok(record)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warning!("Playlist {} left out of the document: {}", playlist.name, e);
            Ok(Err(PlaylistFailure {
                playlist_id: playlist.id.clone(),
                name: playlist.name.clone(),
                kind: e.kind().to_string(),
                message: e.to_string(),
            }))
        }
    }
}
