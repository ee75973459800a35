//! Error types for mediagrab-server
//!
//! Four classes reach the client: invalid input (400), downloader failure
//! (400, tool message passed through), missing file (404), and unexpected
//! (500, message passed through).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extractor::ExtractorError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Extraction tool reported a failure (400)
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// mediagrab-common error
    #[error("{0}")]
    Common(#[from] mediagrab_common::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::DownloadFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::Common(mediagrab_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) | ApiError::Io(_) | ApiError::Common(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::DownloadFailed(_) => "DOWNLOAD_FAILED",
            ApiError::Io(_) => "IO_ERROR",
            ApiError::Common(_) => "COMMON_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<ExtractorError> for ApiError {
    fn from(err: ExtractorError) -> Self {
        if err.is_tool_failure() {
            ApiError::DownloadFailed(err.to_string())
        } else {
            ApiError::Internal(format!("An unexpected error occurred: {}", err))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
