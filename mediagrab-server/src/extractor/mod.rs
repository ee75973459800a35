//! Media extraction
//!
//! The extraction tool is an opaque collaborator: given a URL it locates,
//! fetches and post-processes the media, then reports metadata. Handlers only
//! see the [`MediaExtractor`] trait; [`YtDlpExtractor`] is the production
//! implementation.

mod format;
mod ytdlp;

pub use format::format_selector;
pub use ytdlp::{YtDlpConfig, YtDlpExtractor};

use async_trait::async_trait;
use mediagrab_common::{FormatType, Quality};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Label stored for audio downloads
pub const AUDIO_QUALITY_LABEL: &str = "MP3 Audio (192kbps)";

/// One download job handed to the extractor
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: Quality,
    pub format_type: FormatType,
    /// Directory the file must land in
    pub output_dir: PathBuf,
    /// Disambiguating filename prefix (Unix seconds)
    pub filename_prefix: String,
}

/// What the extractor reports after a successful download
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMedia {
    /// Final file on disk (inside the request's output directory)
    pub path: PathBuf,
    pub title: String,
    pub uploader: String,
    /// Seconds
    pub duration: f64,
    pub thumbnail: String,
    pub view_count: u64,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub fps: Option<f64>,
    /// Tool-reported size in bytes, 0 when unknown
    pub filesize: u64,
}

impl ExtractedMedia {
    /// Display string for the delivered quality
    pub fn quality_label(&self, format_type: FormatType) -> String {
        if format_type == FormatType::Audio {
            return AUDIO_QUALITY_LABEL.to_string();
        }

        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => {
                let mut label = format!("{}x{}", w, h);
                if let Some(fps) = self.fps.filter(|f| *f > 0.0) {
                    if fps.fract() == 0.0 {
                        label.push_str(&format!(" @{}fps", fps as u64));
                    } else {
                        label.push_str(&format!(" @{}fps", fps));
                    }
                }
                label
            }
            _ => "Unknown".to_string(),
        }
    }
}

/// Extraction failures
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// Tool binary missing
    #[error("extraction tool not found: {0}")]
    NotFound(String),

    /// Tool ran and reported an error
    #[error("{message}")]
    Failed { message: String },

    /// Tool did not finish in time (process was killed)
    #[error("extraction timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// Tool succeeded but its output could not be used
    #[error("invalid extraction output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractorError {
    /// True for failures attributable to the tool and the URL, not to this service
    pub fn is_tool_failure(&self) -> bool {
        matches!(self, ExtractorError::Failed { .. } | ExtractorError::Timeout(_))
    }
}

/// Seam between the HTTP layer and the extraction tool
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Human-readable name of the extractor
    fn name(&self) -> &'static str;

    /// Download the media described by `request`
    async fn extract(&self, request: &DownloadRequest) -> Result<ExtractedMedia, ExtractorError>;
}
