// src/handlers/scrape.rs - Trigger and progress endpoints
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::jobs::scrape_job::ScrapeJob;
use crate::models::DownloadRequest;
use crate::AppState;

pub fn scrape_routes() -> Router {
    Router::new()
        .route("/download", post(start_download))
        .route("/progress", get(get_progress))
        .route("/api/status", get(api_status))
}

/// Start a scrape run in the background. Validation happens synchronously;
/// once accepted the run executes on its own task and the caller polls
/// `/progress`.
async fn start_download(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<DownloadRequest>,
) -> impl IntoResponse {
    if request.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Either channel or playlist(s) must be provided"
            })),
        );
    }

    let job = ScrapeJob::new(
        state.youtube_client.clone(),
        state.run_manager.clone(),
        request,
        state.output_root.clone(),
    );
    tokio::spawn(job.execute());

    (
        StatusCode::OK,
        Json(json!({ "message": "Download started" })),
    )
}

/// Current run state snapshot for the front end's poller.
async fn get_progress(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(state.run_manager.snapshot())
}

async fn api_status(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "run_in_progress": state.run_manager.is_running(),
        "output_root": state.output_root.display().to_string(),
    }))
}
