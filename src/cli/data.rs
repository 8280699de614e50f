use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    error,
    error::{Error, Result},
    management::{Credentials, TokenManager},
    pipeline::Pipeline,
    spotify::{SpotifyAuth, SpotifyClient},
    success,
    types::{PlaylistTableRow, RunReport},
    warning,
};

pub async fn data(output: Option<PathBuf>, concurrency: Option<usize>) {
    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("Cannot load configuration. Err: {}", e),
    };
    if let Some(output) = output {
        config.output = output;
    }
    if let Some(concurrency) = concurrency {
        config.concurrency = concurrency.max(1);
    }

    let report = match produce_document(&config).await {
        Ok(report) => report,
        Err(Error::AuthExpired) => {
            error!("Access token missing, expired or revoked. Please run spotviz auth")
        }
        Err(e) => error!("Cannot produce document. Err: {}", e),
    };

    print_summary(&report);

    if report.is_complete() {
        success!(
            "Wrote {} playlists with {} songs to {}",
            report.document.len(),
            report.song_count(),
            config.output.display()
        );
    } else {
        warning!(
            "Wrote a partial document with {} playlists to {}; {} playlists failed, see {}",
            report.document.len(),
            config.output.display(),
            report.failures.len(),
            failures_path(&config.output).display()
        );
    }
}

async fn produce_document(config: &Config) -> Result<RunReport> {
    let store = TokenManager::new(config.token_path());
    let token = store.load().await.map_err(|_| Error::AuthExpired)?;

    let credentials = Arc::new(
        Credentials::new(token)
            .with_refresher(Arc::new(SpotifyAuth::new(config)))
            .with_store(store),
    );
    credentials.ensure_fresh().await?;
    let refresh_task = credentials.spawn_refresh_task();

    let client = SpotifyClient::new(config, Arc::clone(&credentials))?;
    let pipeline = Pipeline::new(Arc::new(client), config.concurrency);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let pb = ProgressBar::new_spinner();
    pb.set_message("Collecting playlists, audio features and artists...");
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let result = pipeline.run_until_cancelled(&cancel).await;

    pb.finish_and_clear();
    interrupt.abort();
    refresh_task.abort();

    let report = result?;
    write_report(&config.output, &report).await?;
    Ok(report)
}

/// Writes the document, and the failure manifest next to it when any
/// playlist is missing from the document.
async fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        async_fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string(&report.document)?;
    async_fs::write(path, json).await?;

    if !report.failures.is_empty() {
        let manifest = serde_json::to_string_pretty(&report.failures)?;
        async_fs::write(failures_path(path), manifest).await?;
    }
    Ok(())
}

fn failures_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().unwrap_or_default().to_os_string();
    name.push(".failures.json");
    output.with_file_name(name)
}

fn print_summary(report: &RunReport) {
    let mut rows: Vec<PlaylistTableRow> = report
        .document
        .iter()
        .map(|p| PlaylistTableRow {
            playlist: p.name.clone(),
            songs: p.songs.len().to_string(),
            status: "ok".to_string(),
        })
        .collect();

    rows.extend(report.failures.iter().map(|f| PlaylistTableRow {
        playlist: f.name.clone(),
        songs: "-".to_string(),
        status: format!("failed ({})", f.kind),
    }));

    if !rows.is_empty() {
        println!("{}", Table::new(rows));
    }
}
