//! Download history endpoints

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use mediagrab_common::history::{HistoryEntry, DEFAULT_RECENT_LIMIT};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::SuccessResponse;
use crate::{ApiError, ApiResult, AppState};

/// Raw query; `limit` is parsed leniently so a bad value never rejects the request
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<String>,
}

impl HistoryQuery {
    /// Requested limit, falling back to the default when absent or not a count
    pub fn limit(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse().ok())
            .unwrap_or(DEFAULT_RECENT_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

/// GET /history?limit=N
///
/// Most recent `limit` entries (default 50), newest first. A missing or
/// unparsable `limit` uses the default.
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let limit = query.limit();
    Json(HistoryResponse {
        history: state.history.recent(limit).await,
    })
}

/// DELETE /history
pub async fn clear_history(State(state): State<AppState>) -> ApiResult<Json<SuccessResponse>> {
    state.history.clear().await.map_err(|e| {
        error!("Error clearing history: {}", e);
        ApiError::Internal(e.to_string())
    })?;

    info!("History cleared");
    Ok(Json(SuccessResponse::ok("History cleared successfully")))
}

pub fn history_routes() -> Router<AppState> {
    Router::new().route("/history", get(get_history).delete(clear_history))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: Option<&str>) -> HistoryQuery {
        HistoryQuery {
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn test_limit_parsing() {
        assert_eq!(query(Some("5")).limit(), 5);
        assert_eq!(query(Some("0")).limit(), 0);
        assert_eq!(query(None).limit(), DEFAULT_RECENT_LIMIT);
        assert_eq!(query(Some("abc")).limit(), DEFAULT_RECENT_LIMIT);
        assert_eq!(query(Some("-1")).limit(), DEFAULT_RECENT_LIMIT);
        assert_eq!(query(Some("")).limit(), DEFAULT_RECENT_LIMIT);
    }
}
