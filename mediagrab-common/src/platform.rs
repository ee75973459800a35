//! Platform classifier
//!
//! Maps a URL to the site it points at with a fixed substring table.
//! First match wins; anything unrecognized is `Other`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Known source platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "YouTube")]
    YouTube,
    #[serde(rename = "TikTok")]
    TikTok,
    #[serde(rename = "Instagram")]
    Instagram,
    #[serde(rename = "Twitter/X")]
    Twitter,
    #[serde(rename = "Facebook")]
    Facebook,
    #[serde(rename = "Vimeo")]
    Vimeo,
    #[serde(rename = "Reddit")]
    Reddit,
    #[serde(rename = "Twitch")]
    Twitch,
    #[serde(rename = "Other")]
    Other,
}

/// Domain fragments in match order
const PLATFORM_TABLE: &[(&[&str], Platform)] = &[
    (&["youtube.com", "youtu.be"], Platform::YouTube),
    (&["tiktok.com"], Platform::TikTok),
    (&["instagram.com"], Platform::Instagram),
    (&["twitter.com", "x.com"], Platform::Twitter),
    (&["facebook.com", "fb.watch"], Platform::Facebook),
    (&["vimeo.com"], Platform::Vimeo),
    (&["reddit.com"], Platform::Reddit),
    (&["twitch.tv"], Platform::Twitch),
];

impl Platform {
    /// Classify a URL (case-insensitive)
    pub fn classify(url: &str) -> Platform {
        let url = url.to_lowercase();
        PLATFORM_TABLE
            .iter()
            .find(|(fragments, _)| fragments.iter().any(|f| url.contains(f)))
            .map(|(_, platform)| *platform)
            .unwrap_or(Platform::Other)
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::TikTok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::Twitter => "Twitter/X",
            Platform::Facebook => "Facebook",
            Platform::Vimeo => "Vimeo",
            Platform::Reddit => "Reddit",
            Platform::Twitch => "Twitch",
            Platform::Other => "Other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_domains() {
        let cases = [
            ("https://www.youtube.com/watch?v=abc", Platform::YouTube),
            ("https://youtu.be/abc", Platform::YouTube),
            ("https://www.tiktok.com/@user/video/1", Platform::TikTok),
            ("https://www.instagram.com/reel/xyz/", Platform::Instagram),
            ("https://twitter.com/user/status/1", Platform::Twitter),
            ("https://x.com/user/status/1", Platform::Twitter),
            ("https://www.facebook.com/watch?v=1", Platform::Facebook),
            ("https://fb.watch/abc/", Platform::Facebook),
            ("https://vimeo.com/12345", Platform::Vimeo),
            ("https://www.reddit.com/r/videos/comments/1", Platform::Reddit),
            ("https://www.twitch.tv/videos/1", Platform::Twitch),
        ];

        for (url, expected) in cases {
            assert_eq!(Platform::classify(url), expected, "url: {}", url);
        }
    }

    #[test]
    fn test_unknown_domain_is_other() {
        assert_eq!(Platform::classify("https://example.org/video.mp4"), Platform::Other);
        assert_eq!(Platform::classify(""), Platform::Other);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(Platform::classify("HTTPS://WWW.YOUTUBE.COM/watch"), Platform::YouTube);
        assert_eq!(Platform::classify("https://Vimeo.Com/1"), Platform::Vimeo);
    }

    #[test]
    fn test_first_match_wins() {
        // A YouTube link shared through Reddit is still YouTube
        assert_eq!(
            Platform::classify("https://youtube.com/watch?v=1&ref=reddit.com"),
            Platform::YouTube
        );
    }

    #[test]
    fn test_labels_and_serde_agree() {
        for platform in [
            Platform::YouTube,
            Platform::TikTok,
            Platform::Instagram,
            Platform::Twitter,
            Platform::Facebook,
            Platform::Vimeo,
            Platform::Reddit,
            Platform::Twitch,
            Platform::Other,
        ] {
            let json = serde_json::to_string(&platform).unwrap();
            assert_eq!(json, format!("\"{}\"", platform.label()));
            assert_eq!(platform.to_string(), platform.label());
        }
    }
}
