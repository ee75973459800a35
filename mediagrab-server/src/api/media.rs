//! Downloaded file retrieval and deletion

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use super::SuccessResponse;
use crate::{storage, ApiError, ApiResult, AppState};

fn not_found() -> ApiError {
    ApiError::NotFound("File not found".to_string())
}

/// GET /media/:filename
///
/// Streams the file as an attachment.
pub async fn serve_media(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let path = storage::resolve_media_path(&state.download_dir, &filename).map_err(|_| not_found())?;

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        debug!("Open failed for {}: {}", filename, e);
        not_found()
    })?;
    let len = file.metadata().await?.len();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    let disposition = format!("attachment; filename=\"{}\"", filename);
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_bytes(disposition.as_bytes())
            .map_err(|e| ApiError::Internal(e.to_string()))?,
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((headers, body))
}

/// DELETE /media/:filename
pub async fn delete_media(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let path = storage::resolve_media_path(&state.download_dir, &filename).map_err(|_| not_found())?;

    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            info!("Deleted {}", filename);
            Ok(Json(SuccessResponse::ok("File deleted successfully")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}

pub fn media_routes() -> Router<AppState> {
    Router::new().route("/media/:filename", get(serve_media).delete(delete_media))
}
