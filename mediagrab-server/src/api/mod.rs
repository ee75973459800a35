//! HTTP API handlers for mediagrab-server

pub mod download;
pub mod files;
pub mod health;
pub mod history;
pub mod media;
pub mod stats;
pub mod ui;

pub use download::download_routes;
pub use files::files_routes;
pub use health::health_routes;
pub use history::history_routes;
pub use media::media_routes;
pub use stats::stats_routes;
pub use ui::ui_routes;

use serde::Serialize;

/// Generic `{success, message}` acknowledgement
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
