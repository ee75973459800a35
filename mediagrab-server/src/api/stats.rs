//! Download statistics endpoint

use axum::{extract::State, routing::get, Json, Router};
use mediagrab_common::time;
use serde::Serialize;
use tracing::warn;

use crate::{storage, AppState};

/// GET /stats response
#[derive(Debug, Default, Serialize)]
pub struct StatsResponse {
    pub total_downloads: usize,
    pub total_size_mb: f64,
    pub available_space_mb: f64,
    pub history_count: usize,
    /// Timestamp of the most recent history entry
    pub last_download: Option<String>,
}

/// GET /stats
///
/// File count, total size and free space of the download directory plus
/// history size. Failures degrade to zeros.
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let dir_stats = match storage::directory_stats(&state.download_dir).await {
        Ok(stats) => stats,
        Err(e) => {
            warn!("Error getting stats: {}", e);
            return Json(StatsResponse::default());
        }
    };

    let dir = state.download_dir.clone();
    let available_space_mb = tokio::task::spawn_blocking(move || storage::available_space_mb(&dir))
        .await
        .ok()
        .flatten()
        .unwrap_or(0.0);

    let history = state.history.load().await;

    Json(StatsResponse {
        total_downloads: dir_stats.file_count,
        total_size_mb: time::bytes_to_mb(dir_stats.total_bytes),
        available_space_mb,
        history_count: history.len(),
        last_download: history.last().map(|e| e.timestamp.clone()),
    })
}

pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}
