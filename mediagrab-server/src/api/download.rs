//! Download endpoint
//!
//! Runs the extractor synchronously within the request, renames the result to
//! its sanitized name and records a history entry.

use axum::{extract::State, routing::post, Form, Json, Router};
use mediagrab_common::history::NewHistoryEntry;
use mediagrab_common::{time, FormatType, Platform, Quality};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::extractor::DownloadRequest;
use crate::{storage, ApiError, ApiResult, AppState};

/// URL characters echoed into logs
const LOG_URL_CHARS: usize = 80;

/// POST /download form body
#[derive(Debug, Deserialize)]
pub struct DownloadForm {
    #[serde(default)]
    pub url: String,
    pub quality: Option<String>,
    pub format_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DownloadMetadata {
    pub title: String,
    pub uploader: String,
    pub duration: f64,
    pub thumbnail: String,
    /// Delivered quality label, e.g. "1280x720 @30fps"
    pub quality: String,
    pub format_type: FormatType,
    /// Bytes
    pub filesize: u64,
    pub platform: Platform,
    pub views: u64,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    pub download_url: String,
    pub metadata: DownloadMetadata,
}

fn has_http_scheme(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn truncate_for_log(url: &str) -> &str {
    match url.char_indices().nth(LOG_URL_CHARS) {
        Some((idx, _)) => &url[..idx],
        None => url,
    }
}

/// POST /download
pub async fn download(
    State(state): State<AppState>,
    Form(form): Form<DownloadForm>,
) -> ApiResult<Json<DownloadResponse>> {
    let url = form.url.trim().to_string();
    if !has_http_scheme(&url) {
        return Err(ApiError::BadRequest(
            "URL must start with http:// or https://".to_string(),
        ));
    }

    let quality = form
        .quality
        .as_deref()
        .map(Quality::from_param)
        .unwrap_or_default();
    let format_type = form
        .format_type
        .as_deref()
        .map(FormatType::from_param)
        .unwrap_or_default();
    let platform = Platform::classify(&url);

    info!(
        "Download request: {} ({}, {}, {})",
        truncate_for_log(&url),
        platform,
        quality.as_str(),
        format_type.as_str()
    );

    let request = DownloadRequest {
        url: url.clone(),
        quality,
        format_type,
        output_dir: state.download_dir.clone(),
        filename_prefix: time::unix_seconds().to_string(),
    };

    let media = state.extractor.extract(&request).await.map_err(|e| {
        error!("Download failed via {}: {}", state.extractor.name(), e);
        ApiError::from(e)
    })?;

    let (filename, path) = storage::finalize_download(&state.download_dir, &media.path).await?;

    let filesize = if media.filesize > 0 {
        media.filesize
    } else {
        tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0)
    };
    let quality_label = media.quality_label(format_type);

    let entry = NewHistoryEntry {
        url,
        title: media.title.clone(),
        filename: filename.clone(),
        platform,
        quality: quality_label.clone(),
        format: format_type,
        size_mb: time::bytes_to_mb(filesize),
        duration: media.duration,
    };
    if let Err(e) = state.history.append(entry).await {
        warn!("Error saving history: {}", e);
    }

    info!(
        "Download completed: {} ({}, {}, {:.2} MB)",
        filename,
        media.title,
        quality_label,
        time::bytes_to_mb(filesize)
    );

    Ok(Json(DownloadResponse {
        success: true,
        message: "Download completed successfully".to_string(),
        download_url: storage::media_url(&filename),
        filename,
        metadata: DownloadMetadata {
            title: media.title,
            uploader: media.uploader,
            duration: media.duration,
            thumbnail: media.thumbnail,
            quality: quality_label,
            format_type,
            filesize,
            platform,
            views: media.view_count,
        },
    }))
}

pub fn download_routes() -> Router<AppState> {
    Router::new().route("/download", post(download))
}
