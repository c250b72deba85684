// src/models.rs - Shared domain types for the playlist scraper
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("YOUTUBE_API_KEY is not set")]
    MissingApiKey,
    #[error("channel '{0}' not found")]
    ChannelNotFound(String),
    #[error("playlist URL #{index} is not a valid YouTube playlist URL: {url}")]
    InvalidPlaylistUrl { index: usize, url: String },
    #[error("playlist '{0}' not found")]
    PlaylistNotFound(String),
    #[error("YouTube API request failed: {0}")]
    Api(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A channel as discovered through the search API
#[derive(Debug, Clone)]
pub struct ChannelRef {
    pub handle: String,
    pub id: String,
    pub title: String,
}

/// A playlist as returned by playlist enumeration (or looked up from a URL)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistRef {
    pub id: String,
    pub title: String,
    /// Display title of the owning channel, when the API reports it
    pub channel_title: Option<String>,
}

/// Metadata for a single public video. Videos the API omits from its
/// response, or marks non-public, never get one of these - callers detect
/// unavailable videos by absence from the metadata map.
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub title: String,
    /// Description with newlines collapsed to single spaces, trimmed
    pub description: String,
    /// Raw ISO 8601 duration token (e.g. "PT1H2M3S"), not yet normalized
    pub duration: String,
}

/// One CSV row - the unit persisted to disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub channel: String,
    pub playlist: String,
    #[serde(rename = "videoTitle")]
    pub video_title: String,
    pub description: String,
    pub duration: String,
}

/// Lifecycle of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Idle,
    InProgress,
    Completed,
    Error,
}

/// Snapshot of the current run, written only by the run's worker task and
/// exposed read-only to the progress poller.
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    pub is_running: bool,
    /// 0-100
    pub progress: u8,
    pub message: String,
    pub status: RunStatus,
    pub current_playlist: String,
    pub total_playlists: usize,
    pub processed_playlists: usize,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            is_running: false,
            progress: 0,
            message: String::new(),
            status: RunStatus::Idle,
            current_playlist: String::new(),
            total_playlists: 0,
            processed_playlists: 0,
        }
    }
}

/// Payload of POST /download
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadRequest {
    pub channel: Option<String>,
    #[serde(default)]
    pub playlists: Vec<String>,
    #[serde(default)]
    pub split: bool,
}

impl DownloadRequest {
    /// A run needs at least a channel or one playlist URL
    pub fn is_empty(&self) -> bool {
        self.channel.as_deref().map_or(true, |c| c.trim().is_empty())
            && self.playlists.iter().all(|p| p.trim().is_empty())
    }
}
