use axum::{Extension, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod handlers;
mod jobs;
mod middleware;
mod models;
mod scraper;
mod utils;
mod youtube_client;

use jobs::{RunManager, SharedRunManager};
use youtube_client::YouTubeClient;

/// Shared application state: the catalog client, the single-run manager and
/// the root directory CSV artifacts are written under.
pub struct AppState {
    pub youtube_client: Arc<YouTubeClient>,
    pub run_manager: SharedRunManager,
    pub output_root: PathBuf,
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    // The API key is a hard precondition - fail before any network activity
    let youtube_client = match YouTubeClient::from_env() {
        Ok(client) => Arc::new(client),
        Err(err) => {
            tracing::error!("{}. Get a YouTube Data API v3 key and export it before starting.", err);
            std::process::exit(1);
        }
    };

    let output_root = PathBuf::from(
        std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "playlists".to_string()),
    );
    tracing::info!("CSV output root: {}", output_root.display());

    let shared_state = Arc::new(AppState {
        youtube_client,
        run_manager: Arc::new(RunManager::new()),
        output_root,
    });

    let app = Router::new()
        .merge(handlers::ui::ui_routes())
        .merge(handlers::scrape::scrape_routes())
        .merge(handlers::output::output_routes())
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(shared_state));

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind listener");
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Server error");
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,playlist_scraper=trace,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,playlist_scraper=info,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for production (easier for log aggregation)
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Playlist scraper starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) { "development" } else { "production" }
    );

    Ok(())
}
