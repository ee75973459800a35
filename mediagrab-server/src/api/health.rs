//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use mediagrab_common::time;
use serde::Serialize;

use crate::AppState;

/// Features advertised to clients
const FEATURES: &[&str] = &["download", "history", "stats", "cleanup"];

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub git_hash: String,
    pub timestamp: String,
    pub uptime_seconds: i64,
    pub features: Vec<String>,
}

/// GET /health
///
/// Liveness and version information for monitoring.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = Utc::now();
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "mediagrab-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        timestamp: time::to_rfc3339(now),
        uptime_seconds: (now - state.startup_time).num_seconds().max(0),
        features: FEATURES.iter().map(|f| f.to_string()).collect(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
