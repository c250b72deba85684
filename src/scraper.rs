// src/scraper.rs - Collection pipeline: playlist -> ordered CSV rows
//
// Per-playlist flow: fetch video ids, batch-fetch metadata, drop unavailable
// videos, build rows in playlist order. Empty playlists and playlists whose
// every video is filtered out are skips, not failures.
use std::path::{Path, PathBuf};

use crate::models::{ChannelRef, PlaylistRef, Row, ScrapeError};
use crate::utils::{iso_to_hms, sanitize_title};
use crate::youtube_client::PlaylistCatalog;

/// Recompute the in-playlist percentage every N processed videos to bound
/// progress event volume.
const PROGRESS_STRIDE: usize = 5;

/// Narrow progress interface the pipeline reports through. The run controller
/// adapts it onto the shared run state; tests plug in recorders.
pub trait ProgressSink: Send + Sync {
    /// Percentage within the current unit plus a human-readable message.
    fn report(&self, percent: u8, message: &str);
    /// A new playlist is being processed.
    fn begin_playlist(&self, title: &str);
    /// More playlists were discovered (channel enumeration).
    fn add_total(&self, count: usize);
    /// One playlist finished (written, skipped or failed).
    fn mark_processed(&self);
}

/// No-op sink for callers that don't track progress.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _percent: u8, _message: &str) {}
    fn begin_playlist(&self, _title: &str) {}
    fn add_total(&self, _count: usize) {}
    fn mark_processed(&self) {}
}

/// Where a processed playlist's rows should go.
#[derive(Debug, Clone, Copy)]
pub enum OutputMode<'a> {
    /// Accumulate rows in memory for a later merged write. No filesystem
    /// access happens in this mode.
    ReturnRows,
    /// Write one CSV per playlist into the given channel directory,
    /// created lazily on first write.
    WriteFile { channel_dir: &'a Path },
}

#[derive(Debug)]
pub enum PlaylistOutcome {
    Rows(Vec<Row>),
    FileWritten { path: PathBuf, rows: usize },
    SkippedEmpty,
    SkippedAllUnavailable,
}

/// Aggregate result of processing every playlist of a channel.
#[derive(Debug, Default)]
pub struct ChannelOutcome {
    pub channel_title: String,
    /// Merged rows (merge mode only)
    pub rows: Vec<Row>,
    /// Files written (split mode only)
    pub files: Vec<PathBuf>,
    /// Failures of individual playlists, reported verbatim in the summary
    pub failures: Vec<String>,
    pub videos: usize,
}

/// Run the per-playlist state machine: fetch ids, fetch metadata, filter,
/// build rows, and either return or persist them.
pub async fn process_playlist<C: PlaylistCatalog + ?Sized>(
    catalog: &C,
    playlist: &PlaylistRef,
    channel_title: &str,
    mode: OutputMode<'_>,
    progress: &dyn ProgressSink,
) -> Result<PlaylistOutcome, ScrapeError> {
    progress.begin_playlist(&playlist.title);
    progress.report(0, &format!("Fetching playlist '{}'", playlist.title));

    let video_ids = catalog.list_playlist_video_ids(&playlist.id).await?;
    if video_ids.is_empty() {
        tracing::info!("Playlist '{}' is empty, skipping", playlist.title);
        return Ok(PlaylistOutcome::SkippedEmpty);
    }

    let meta = catalog.videos_metadata(&video_ids).await?;

    let mut rows = Vec::with_capacity(video_ids.len());
    let mut skipped = 0usize;
    let total = video_ids.len();

    // Playlist order is significant; iterate ids, not the metadata map
    for (index, video_id) in video_ids.iter().enumerate() {
        let info = match meta.get(video_id) {
            Some(info) => info,
            None => {
                skipped += 1;
                continue;
            }
        };

        rows.push(Row {
            channel: channel_title.to_string(),
            playlist: playlist.title.clone(),
            video_title: info.title.clone(),
            description: info.description.clone(),
            duration: iso_to_hms(&info.duration),
        });

        let done = index + 1;
        if done % PROGRESS_STRIDE == 0 {
            let percent = (done * 100 / total) as u8;
            progress.report(
                percent,
                &format!("'{}': {}/{} videos", playlist.title, done, total),
            );
        }
    }

    if skipped > 0 {
        tracing::info!(
            "{} unavailable video(s) in playlist '{}'",
            skipped,
            playlist.title
        );
    }

    if rows.is_empty() {
        tracing::info!("No public videos in playlist '{}', skipping", playlist.title);
        return Ok(PlaylistOutcome::SkippedAllUnavailable);
    }

    progress.report(100, &format!("'{}' done ({} rows)", playlist.title, rows.len()));

    match mode {
        OutputMode::ReturnRows => Ok(PlaylistOutcome::Rows(rows)),
        OutputMode::WriteFile { channel_dir } => {
            let path = playlist_csv_path(channel_dir, playlist);
            std::fs::create_dir_all(channel_dir)?;
            write_rows_csv(&path, &rows)?;
            tracing::info!("Wrote {} rows to {}", rows.len(), path.display());
            Ok(PlaylistOutcome::FileWritten {
                path,
                rows: rows.len(),
            })
        }
    }
}

/// Resolve a channel handle, fetch its title once, enumerate its playlists
/// and run the per-playlist machine for each. A failing playlist is recorded
/// and does not abort its siblings.
pub async fn process_channel<C: PlaylistCatalog + ?Sized>(
    catalog: &C,
    handle: &str,
    split: bool,
    output_root: &Path,
    progress: &dyn ProgressSink,
) -> Result<ChannelOutcome, ScrapeError> {
    let channel_id = catalog
        .resolve_channel_id(handle)
        .await?
        .ok_or_else(|| ScrapeError::ChannelNotFound(handle.to_string()))?;
    let channel = ChannelRef {
        handle: handle.to_string(),
        title: catalog.channel_title(&channel_id).await?,
        id: channel_id,
    };

    let playlists = catalog.list_playlists(&channel.id).await?;
    progress.add_total(playlists.len());
    tracing::info!(
        "Channel '{}' ({}) has {} playlist(s)",
        channel.title,
        channel.handle,
        playlists.len()
    );

    let channel_dir = output_root.join(channel.handle.trim_start_matches('@'));
    let mut outcome = ChannelOutcome {
        channel_title: channel.title.clone(),
        ..Default::default()
    };

    for playlist in &playlists {
        let mode = if split {
            OutputMode::WriteFile {
                channel_dir: &channel_dir,
            }
        } else {
            OutputMode::ReturnRows
        };

        match process_playlist(catalog, playlist, &channel.title, mode, progress).await {
            Ok(PlaylistOutcome::Rows(rows)) => {
                outcome.videos += rows.len();
                outcome.rows.extend(rows);
            }
            Ok(PlaylistOutcome::FileWritten { path, rows }) => {
                outcome.videos += rows;
                outcome.files.push(path);
            }
            Ok(PlaylistOutcome::SkippedEmpty) | Ok(PlaylistOutcome::SkippedAllUnavailable) => {}
            Err(e) => {
                tracing::warn!("Playlist '{}' failed: {}", playlist.title, e);
                outcome
                    .failures
                    .push(format!("playlist '{}': {}", playlist.title, e));
            }
        }
        progress.mark_processed();
    }

    Ok(outcome)
}

/// CSV path for a playlist: sanitized title (falling back to the playlist id
/// when sanitization leaves nothing) under the channel directory.
fn playlist_csv_path(channel_dir: &Path, playlist: &PlaylistRef) -> PathBuf {
    let stem = sanitize_title(&playlist.title);
    let stem = if stem.is_empty() {
        playlist.id.clone()
    } else {
        stem
    };
    channel_dir.join(format!("{}.csv", stem))
}

/// Write rows as UTF-8 CSV with every field quoted.
pub fn write_rows_csv(path: &Path, rows: &[Row]) -> Result<(), ScrapeError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_path(path)?;

    writer.write_record(["channel", "playlist", "videoTitle", "description", "duration"])?;
    for row in rows {
        writer.write_record([
            row.channel.as_str(),
            row.playlist.as_str(),
            row.video_title.as_str(),
            row.description.as_str(),
            row.duration.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
