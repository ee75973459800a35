//! mediagrab-server library
//!
//! HTTP front-end over an external media-extraction tool: accepts a URL,
//! runs the extractor, records history, and serves the resulting file.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use mediagrab_common::config::ServerConfig;
use mediagrab_common::history::HistoryStore;
use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};
use tower_http::compression::{CompressionLayer, DefaultPredicate};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod extractor;
pub mod storage;
pub mod sweeper;

pub use crate::error::{ApiError, ApiResult};

use crate::extractor::MediaExtractor;
use crate::sweeper::Sweeper;

/// Responses smaller than this are sent uncompressed
const COMPRESSION_MIN_BYTES: u16 = 1000;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Directory holding downloads and the history log
    pub download_dir: PathBuf,
    /// Download history (serialized writes)
    pub history: Arc<HistoryStore>,
    /// Extraction tool
    pub extractor: Arc<dyn MediaExtractor>,
    /// Age-based cleanup
    pub sweeper: Sweeper,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        download_dir: PathBuf,
        history: Arc<HistoryStore>,
        extractor: Arc<dyn MediaExtractor>,
        sweeper: Sweeper,
    ) -> Self {
        Self {
            download_dir,
            history,
            extractor,
            sweeper,
            startup_time: Utc::now(),
        }
    }

    /// Wire state from resolved configuration
    pub fn from_config(config: &ServerConfig, extractor: Arc<dyn MediaExtractor>) -> Self {
        let history = Arc::new(HistoryStore::new(
            config.history_path(),
            config.max_history_items,
        ));
        let sweeper = Sweeper::new(config.download_dir.clone(), config.max_file_age());
        Self::new(config.download_dir.clone(), history, extractor, sweeper)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    // Media files are already compressed and streamed with a known length
    let compress_when = DefaultPredicate::new()
        .and(SizeAbove::new(COMPRESSION_MIN_BYTES))
        .and(NotForContentType::new("application/octet-stream"));

    Router::new()
        .merge(api::ui_routes())
        .merge(api::health_routes())
        .merge(api::stats_routes())
        .merge(api::history_routes())
        .merge(api::download_routes())
        .merge(api::media_routes())
        .merge(api::files_routes())
        .with_state(state)
        .layer(CompressionLayer::new().compress_when(compress_when))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
