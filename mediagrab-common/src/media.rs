//! Download request vocabulary: quality presets and output format

use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Best,
    /// Up to 1080p
    High,
    /// Up to 720p
    Medium,
    /// Up to 480p
    Low,
}

impl Quality {
    /// Lenient parse: unknown values fall back to `Best`
    pub fn from_param(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Quality::High,
            "medium" => Quality::Medium,
            "low" => Quality::Low,
            _ => Quality::Best,
        }
    }

    /// Maximum video height, `None` for unbounded
    pub fn max_height(&self) -> Option<u32> {
        match self {
            Quality::Best => None,
            Quality::High => Some(1080),
            Quality::Medium => Some(720),
            Quality::Low => Some(480),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Best => "best",
            Quality::High => "high",
            Quality::Medium => "medium",
            Quality::Low => "low",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested output kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    #[default]
    Video,
    /// Audio only, converted to MP3
    Audio,
}

impl FormatType {
    /// Lenient parse: unknown values fall back to `Video`
    pub fn from_param(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("audio") {
            FormatType::Audio
        } else {
            FormatType::Video
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatType::Video => "video",
            FormatType::Audio => "audio",
        }
    }
}

impl fmt::Display for FormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_from_param() {
        assert_eq!(Quality::from_param("best"), Quality::Best);
        assert_eq!(Quality::from_param("HIGH"), Quality::High);
        assert_eq!(Quality::from_param(" medium "), Quality::Medium);
        assert_eq!(Quality::from_param("low"), Quality::Low);
        assert_eq!(Quality::from_param("ultra"), Quality::Best);
        assert_eq!(Quality::from_param(""), Quality::Best);
    }

    #[test]
    fn test_quality_max_height() {
        assert_eq!(Quality::Best.max_height(), None);
        assert_eq!(Quality::High.max_height(), Some(1080));
        assert_eq!(Quality::Medium.max_height(), Some(720));
        assert_eq!(Quality::Low.max_height(), Some(480));
    }

    #[test]
    fn test_format_type_from_param() {
        assert_eq!(FormatType::from_param("audio"), FormatType::Audio);
        assert_eq!(FormatType::from_param("Audio"), FormatType::Audio);
        assert_eq!(FormatType::from_param("video"), FormatType::Video);
        assert_eq!(FormatType::from_param("gif"), FormatType::Video);
    }

    #[test]
    fn test_format_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&FormatType::Audio).unwrap(), "\"audio\"");
        assert_eq!(serde_json::to_string(&FormatType::Video).unwrap(), "\"video\"");
    }
}
