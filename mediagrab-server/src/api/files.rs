//! Download directory listing and manual cleanup

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::storage::{self, FileInfo};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub success: bool,
    pub message: String,
    pub deleted: usize,
}

/// GET /list
///
/// Downloaded files, newest first. Errors degrade to an empty list.
pub async fn list_files(State(state): State<AppState>) -> Json<ListResponse> {
    let files = storage::list_files(&state.download_dir)
        .await
        .unwrap_or_else(|e| {
            warn!("Error listing files: {}", e);
            Vec::new()
        });
    Json(ListResponse { files })
}

/// POST /cleanup
///
/// Runs the age-based sweep immediately.
pub async fn cleanup(State(state): State<AppState>) -> ApiResult<Json<CleanupResponse>> {
    let deleted = state.sweeper.sweep().await.map_err(|e| {
        error!("Cleanup failed: {}", e);
        ApiError::Internal(e.to_string())
    })?;

    info!("Manual cleanup deleted {} file(s)", deleted);
    Ok(Json(CleanupResponse {
        success: true,
        message: "Cleanup completed".to_string(),
        deleted,
    }))
}

pub fn files_routes() -> Router<AppState> {
    Router::new()
        .route("/list", get(list_files))
        .route("/cleanup", post(cleanup))
}
