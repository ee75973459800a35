//! Format selection strings for the extraction tool

use mediagrab_common::{FormatType, Quality};

/// Format selector for a quality preset and output kind
///
/// Video prefers an mp4 video stream merged with m4a audio, then a single
/// mp4 file, then whatever is best, each capped at the preset's height.
pub fn format_selector(quality: Quality, format_type: FormatType) -> String {
    if format_type == FormatType::Audio {
        return "bestaudio/best".to_string();
    }

    match quality.max_height() {
        None => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string(),
        Some(h) => format!(
            "bestvideo[height<={h}][ext=mp4]+bestaudio[ext=m4a]/best[height<={h}][ext=mp4]/best"
        ),
    }
}
