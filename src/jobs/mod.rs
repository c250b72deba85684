// src/jobs/mod.rs
//! Background run management: a single scrape run executes on its own tokio
//! task and publishes progress through a shared, snapshot-only state object.
use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::{RunState, RunStatus};
use crate::scraper::ProgressSink;

pub mod scrape_job;

/// Owns the state of the current (single) run. The run's worker task is the
/// only writer; pollers get complete clones, never partial reads.
pub struct RunManager {
    state: RwLock<RunState>,
}

impl RunManager {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RunState::default()),
        }
    }

    /// Complete snapshot of the current run state.
    pub fn snapshot(&self) -> RunState {
        self.state.read().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.read().is_running
    }

    /// Reset state for a fresh run. A new run overwrites whatever the
    /// previous run left behind.
    pub fn start(&self, total_playlists: usize) {
        let mut state = self.state.write();
        *state = RunState {
            is_running: true,
            progress: 0,
            message: "Starting download...".to_string(),
            status: RunStatus::InProgress,
            current_playlist: String::new(),
            total_playlists,
            processed_playlists: 0,
        };
    }

    /// Terminal transition; `message` is the final summary shown to the user.
    pub fn finish(&self, status: RunStatus, message: String) {
        let mut state = self.state.write();
        state.is_running = false;
        state.progress = 100;
        state.status = status;
        state.message = message;
        state.current_playlist = String::new();
    }
}

impl Default for RunManager {
    fn default() -> Self {
        Self::new()
    }
}

// The pipeline reports progress through this narrow interface; the manager
// adapts it onto the shared state.
impl ProgressSink for RunManager {
    fn report(&self, percent: u8, message: &str) {
        let mut state = self.state.write();
        state.progress = percent.min(100);
        state.message = message.to_string();
    }

    fn begin_playlist(&self, title: &str) {
        self.state.write().current_playlist = title.to_string();
    }

    fn add_total(&self, count: usize) {
        self.state.write().total_playlists += count;
    }

    fn mark_processed(&self) {
        self.state.write().processed_playlists += 1;
    }
}

pub type SharedRunManager = Arc<RunManager>;
