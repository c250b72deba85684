// src/jobs/scrape_job.rs
//! Run controller: executes one user-triggered run across an optional
//! channel handle and a list of playlist URLs. Per-unit failures are
//! collected and reported; they never abort the remaining units.
use std::path::PathBuf;
use std::sync::Arc;

use super::SharedRunManager;
use crate::models::{DownloadRequest, PlaylistRef, Row, RunStatus, ScrapeError};
use crate::scraper::{
    self, OutputMode, PlaylistOutcome, ProgressSink,
};
use crate::utils::{parse_playlist_url, sanitize_title};
use crate::youtube_client::PlaylistCatalog;

pub const MERGED_FILE_NAME: &str = "all_playlists.csv";

pub struct ScrapeJob {
    catalog: Arc<dyn PlaylistCatalog>,
    run: SharedRunManager,
    config: DownloadRequest,
    output_root: PathBuf,
}

impl ScrapeJob {
    pub fn new(
        catalog: Arc<dyn PlaylistCatalog>,
        run: SharedRunManager,
        config: DownloadRequest,
        output_root: PathBuf,
    ) -> Self {
        Self {
            catalog,
            run,
            config,
            output_root,
        }
    }

    /// Execute the run to completion, publishing progress and the final
    /// summary through the run manager. Never panics on unit failures.
    pub async fn execute(self) {
        let channel = self
            .config
            .channel
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        // Indices are 1-based positions in the submitted list, so failure
        // messages line up with what the user typed even around blank entries.
        let urls: Vec<(usize, &str)> = self
            .config
            .playlists
            .iter()
            .enumerate()
            .map(|(i, u)| (i + 1, u.trim()))
            .filter(|(_, u)| !u.is_empty())
            .collect();
        let split = self.config.split;

        // Each playlist URL is one playlist up front; channel playlists are
        // added to the total once enumerated.
        self.run.start(urls.len());
        tracing::info!(
            "Starting run: channel={:?}, playlist_urls={}, split={}",
            channel,
            urls.len(),
            split
        );

        let mut failures: Vec<String> = Vec::new();
        let mut merged_rows: Vec<Row> = Vec::new();
        let mut files_written = 0usize;
        let mut videos_total = 0usize;

        // Channel unit first, then the playlist URL units in order
        if let Some(handle) = channel {
            self.run
                .report(0, &format!("Processing channel {}", handle));
            match scraper::process_channel(
                self.catalog.as_ref(),
                handle,
                split,
                &self.output_root,
                self.run.as_ref(),
            )
            .await
            {
                Ok(outcome) => {
                    videos_total += outcome.videos;
                    files_written += outcome.files.len();
                    merged_rows.extend(outcome.rows);
                    failures.extend(outcome.failures);
                }
                Err(e) => {
                    tracing::warn!("Channel unit '{}' failed: {}", handle, e);
                    failures.push(e.to_string());
                }
            }
        }

        for &(index, url) in &urls {
            self.run
                .report(0, &format!("Processing playlist URL #{}", index));

            match self.process_url_unit(url, index, split).await {
                Ok(UrlUnitResult::Rows(rows)) => {
                    videos_total += rows.len();
                    merged_rows.extend(rows);
                }
                Ok(UrlUnitResult::File { rows }) => {
                    videos_total += rows;
                    files_written += 1;
                }
                Ok(UrlUnitResult::Skipped) => {}
                Err(e) => {
                    tracing::warn!("Playlist URL unit #{} failed: {}", index, e);
                    failures.push(e.to_string());
                }
            }
            self.run.mark_processed();
        }

        // Merge step: a single combined CSV, suppressed entirely when no
        // rows were collected so we never leave an empty artifact behind.
        if !split && !merged_rows.is_empty() {
            match self.write_merged(channel, &merged_rows) {
                Ok(path) => {
                    files_written += 1;
                    tracing::info!(
                        "Merged {} rows into {}",
                        merged_rows.len(),
                        path.display()
                    );
                }
                Err(e) => failures.push(format!("failed to write merged CSV: {}", e)),
            }
        }

        let status = if failures.is_empty() {
            RunStatus::Completed
        } else {
            RunStatus::Error
        };
        let message = format_summary(files_written, videos_total, &failures);
        tracing::info!("Run finished ({:?}): {}", status, message);
        self.run.finish(status, message);
    }

    /// One playlist-URL unit: parse the URL, look the playlist up, run the
    /// pipeline on it.
    async fn process_url_unit(
        &self,
        url: &str,
        index: usize,
        split: bool,
    ) -> Result<UrlUnitResult, ScrapeError> {
        let playlist_id =
            parse_playlist_url(url).ok_or_else(|| ScrapeError::InvalidPlaylistUrl {
                index,
                url: url.to_string(),
            })?;

        let playlist: PlaylistRef = self
            .catalog
            .playlist_info(&playlist_id)
            .await?
            .ok_or_else(|| ScrapeError::PlaylistNotFound(playlist_id.clone()))?;

        let channel_title = playlist.channel_title.clone().unwrap_or_default();
        let channel_dir = self.output_root.join(channel_dir_name(&channel_title));
        let mode = if split {
            OutputMode::WriteFile {
                channel_dir: &channel_dir,
            }
        } else {
            OutputMode::ReturnRows
        };

        let outcome = scraper::process_playlist(
            self.catalog.as_ref(),
            &playlist,
            &channel_title,
            mode,
            self.run.as_ref() as &dyn ProgressSink,
        )
        .await?;

        Ok(match outcome {
            PlaylistOutcome::Rows(rows) => UrlUnitResult::Rows(rows),
            PlaylistOutcome::FileWritten { rows, .. } => UrlUnitResult::File { rows },
            PlaylistOutcome::SkippedEmpty | PlaylistOutcome::SkippedAllUnavailable => {
                UrlUnitResult::Skipped
            }
        })
    }

    fn write_merged(
        &self,
        channel: Option<&str>,
        rows: &[Row],
    ) -> Result<PathBuf, ScrapeError> {
        let dir = match channel {
            Some(handle) => self.output_root.join(handle.trim_start_matches('@')),
            None => self.output_root.clone(),
        };
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(MERGED_FILE_NAME);
        scraper::write_rows_csv(&path, rows)?;
        Ok(path)
    }
}

enum UrlUnitResult {
    Rows(Vec<Row>),
    File { rows: usize },
    Skipped,
}

/// Directory name for a playlist-URL unit, derived from its channel title.
fn channel_dir_name(channel_title: &str) -> String {
    let name = sanitize_title(channel_title);
    if name.is_empty() {
        "channel".to_string()
    } else {
        name
    }
}

/// Final user-visible summary: output units and videos, correctly
/// pluralized, with any per-unit failures enumerated verbatim.
fn format_summary(files: usize, videos: usize, failures: &[String]) -> String {
    let mut message = format!(
        "Wrote {} file{} ({} video{})",
        files,
        if files == 1 { "" } else { "s" },
        videos,
        if videos == 1 { "" } else { "s" },
    );
    if !failures.is_empty() {
        message.push_str(&format!(
            "; {} unit{} failed: {}",
            failures.len(),
            if failures.len() == 1 { "" } else { "s" },
            failures.join("; ")
        ));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::RunManager;
    use crate::models::VideoMetadata;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;

    /// Catalog stub where every known playlist has one public video.
    #[derive(Default)]
    struct StubCatalog {
        known_playlists: HashMap<String, PlaylistRef>,
    }

    impl StubCatalog {
        fn with(mut self, id: &str, title: &str, channel: &str) -> Self {
            self.known_playlists.insert(
                id.to_string(),
                PlaylistRef {
                    id: id.to_string(),
                    title: title.to_string(),
                    channel_title: Some(channel.to_string()),
                },
            );
            self
        }
    }

    #[async_trait]
    impl PlaylistCatalog for StubCatalog {
        async fn resolve_channel_id(&self, _handle: &str) -> Result<Option<String>, ScrapeError> {
            // No handle ever resolves in this stub
            Ok(None)
        }

        async fn channel_title(&self, channel_id: &str) -> Result<String, ScrapeError> {
            Err(ScrapeError::Api(format!("unknown channel {}", channel_id)))
        }

        async fn list_playlists(
            &self,
            _channel_id: &str,
        ) -> Result<Vec<PlaylistRef>, ScrapeError> {
            Ok(vec![])
        }

        async fn list_playlist_video_ids(
            &self,
            playlist_id: &str,
        ) -> Result<Vec<String>, ScrapeError> {
            if self.known_playlists.contains_key(playlist_id) {
                Ok(vec![format!("{}-v1", playlist_id)])
            } else {
                Ok(vec![])
            }
        }

        async fn videos_metadata(
            &self,
            video_ids: &[String],
        ) -> Result<HashMap<String, VideoMetadata>, ScrapeError> {
            Ok(video_ids
                .iter()
                .map(|id| {
                    (
                        id.clone(),
                        VideoMetadata {
                            title: format!("video {}", id),
                            description: "desc".to_string(),
                            duration: "PT1M".to_string(),
                        },
                    )
                })
                .collect())
        }

        async fn playlist_info(
            &self,
            playlist_id: &str,
        ) -> Result<Option<PlaylistRef>, ScrapeError> {
            Ok(self.known_playlists.get(playlist_id).cloned())
        }
    }

    fn job(catalog: StubCatalog, config: DownloadRequest, root: &Path) -> (ScrapeJob, SharedRunManager) {
        let run = Arc::new(RunManager::new());
        let job = ScrapeJob::new(Arc::new(catalog), run.clone(), config, root.to_path_buf());
        (job, run)
    }

    #[tokio::test]
    async fn test_failed_channel_does_not_abort_playlist_units() {
        let catalog = StubCatalog::default()
            .with("PL1", "First", "Some Channel")
            .with("PL2", "Second", "Some Channel");
        let dir = tempfile::tempdir().unwrap();
        let (job, run) = job(
            catalog,
            DownloadRequest {
                channel: Some("@missing".to_string()),
                playlists: vec![
                    "https://www.youtube.com/playlist?list=PL1".to_string(),
                    "https://www.youtube.com/playlist?list=PL2".to_string(),
                ],
                split: false,
            },
            dir.path(),
        );

        job.execute().await;

        let state = run.snapshot();
        assert_eq!(state.status, RunStatus::Error);
        assert!(!state.is_running);
        assert!(state.message.contains("1 unit failed"));
        assert!(state.message.contains("@missing"));
        // Rows from both successful units were still merged and persisted
        let merged = dir.path().join("missing").join(MERGED_FILE_NAME);
        let contents = std::fs::read_to_string(merged).unwrap();
        assert_eq!(contents.lines().count(), 3); // header + 2 rows
        assert!(state.message.contains("2 videos"));
    }

    #[tokio::test]
    async fn test_malformed_url_is_recorded_and_remaining_urls_continue() {
        let catalog = StubCatalog::default().with("PL2", "Second", "Chan");
        let dir = tempfile::tempdir().unwrap();
        let (job, run) = job(
            catalog,
            DownloadRequest {
                channel: None,
                playlists: vec![
                    "https://vimeo.com/playlist?list=PL1".to_string(),
                    "https://www.youtube.com/playlist?list=PL2".to_string(),
                ],
                split: false,
            },
            dir.path(),
        );

        job.execute().await;

        let state = run.snapshot();
        assert_eq!(state.status, RunStatus::Error);
        assert!(state.message.contains("playlist URL #1"));
        assert_eq!(state.processed_playlists, 2);
        assert!(dir.path().join(MERGED_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_failure_index_matches_submitted_position_across_blanks() {
        let catalog = StubCatalog::default();
        let dir = tempfile::tempdir().unwrap();
        let (job, run) = job(
            catalog,
            DownloadRequest {
                channel: None,
                playlists: vec![
                    "   ".to_string(),
                    "https://vimeo.com/playlist?list=PL1".to_string(),
                ],
                split: false,
            },
            dir.path(),
        );

        job.execute().await;

        let state = run.snapshot();
        assert_eq!(state.status, RunStatus::Error);
        // The bad URL was the second submitted entry, blank line included
        assert!(state.message.contains("playlist URL #2"));
        assert_eq!(state.total_playlists, 1);
        assert_eq!(state.processed_playlists, 1);
    }

    #[tokio::test]
    async fn test_merge_suppressed_when_no_rows_collected() {
        let catalog = StubCatalog::default();
        let dir = tempfile::tempdir().unwrap();
        let (job, run) = job(
            catalog,
            DownloadRequest {
                channel: None,
                playlists: vec!["not a url".to_string()],
                split: false,
            },
            dir.path(),
        );

        job.execute().await;

        let state = run.snapshot();
        assert_eq!(state.status, RunStatus::Error);
        assert!(!dir.path().join(MERGED_FILE_NAME).exists());
        assert!(state.message.starts_with("Wrote 0 files (0 videos)"));
    }

    #[tokio::test]
    async fn test_split_writes_one_file_per_url_unit() {
        let catalog = StubCatalog::default().with("PL9", "My List", "Great Channel");
        let dir = tempfile::tempdir().unwrap();
        let (job, run) = job(
            catalog,
            DownloadRequest {
                channel: None,
                playlists: vec!["https://youtube.com/playlist?list=PL9".to_string()],
                split: true,
            },
            dir.path(),
        );

        job.execute().await;

        let state = run.snapshot();
        assert_eq!(state.status, RunStatus::Completed);
        assert_eq!(state.message, "Wrote 1 file (1 video)");
        assert!(dir
            .path()
            .join("Great Channel")
            .join("My List.csv")
            .exists());
        assert!(!dir.path().join(MERGED_FILE_NAME).exists());
    }

    #[test]
    fn test_summary_pluralization() {
        assert_eq!(format_summary(1, 1, &[]), "Wrote 1 file (1 video)");
        assert_eq!(format_summary(3, 120, &[]), "Wrote 3 files (120 videos)");
        assert_eq!(
            format_summary(0, 0, &["channel '@x' not found".to_string()]),
            "Wrote 0 files (0 videos); 1 unit failed: channel '@x' not found"
        );
        assert_eq!(
            format_summary(2, 5, &["a".to_string(), "b".to_string()]),
            "Wrote 2 files (5 videos); 2 units failed: a; b"
        );
    }
}
