// src/handlers/output.rs - CSV artifact download
use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use std::path::{Component, PathBuf};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::AppState;

pub fn output_routes() -> Router {
    Router::new().route("/download_file/*path", get(download_file))
}

/// Serve a CSV from the output root as an attachment. Only plain relative
/// paths resolve; absolute paths and any traversal component are rejected
/// before touching the filesystem.
async fn download_file(
    Path(path): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let relative = PathBuf::from(&path);
    let is_plain = !relative.is_absolute()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !is_plain {
        tracing::warn!("Rejected download path: {}", path);
        return Err(StatusCode::BAD_REQUEST);
    }

    let file_path = state.output_root.join(relative);
    if !file_path.is_file() {
        return Err(StatusCode::NOT_FOUND);
    }

    match tokio::fs::File::open(&file_path).await {
        Ok(file) => {
            let stream = ReaderStream::new(file);
            let filename = file_path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("playlist.csv");

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
                .header(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                )
                .body(axum::body::Body::from_stream(stream))
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            tracing::error!("Failed to open {} for download: {}", file_path.display(), e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
