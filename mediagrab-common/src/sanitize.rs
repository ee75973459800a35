//! Filename sanitizer
//!
//! Turns whatever title the extraction tool produced into a name that is
//! safe on every common filesystem and safe to embed in a URL path segment.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default upper bound on sanitized filename length, in characters
pub const DEFAULT_MAX_LENGTH: usize = 100;

/// Returned when nothing survives sanitizing
pub const FALLBACK_NAME: &str = "download";

static RESERVED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());
static CONTROL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x00-\x1F\x7F-\x{9F}]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.+").unwrap());
static UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

/// Sanitize a filename with the default length bound
pub fn sanitize(name: &str) -> String {
    sanitize_filename(name, DEFAULT_MAX_LENGTH)
}

/// Sanitize a filename
///
/// Removes reserved and control characters, turns whitespace runs into `_`,
/// collapses repeated `.` and `_`, strips leading/trailing `.`/`_`, and
/// truncates to `max_length` characters while keeping the extension.
/// Never returns an empty string.
pub fn sanitize_filename(name: &str, max_length: usize) -> String {
    let cleaned = RESERVED.replace_all(name, "");
    let cleaned = CONTROL.replace_all(&cleaned, "");
    let cleaned = WHITESPACE.replace_all(&cleaned, "_");
    let cleaned = DOTS.replace_all(&cleaned, ".");
    let cleaned = UNDERSCORES.replace_all(&cleaned, "_");
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');

    let truncated = truncate_keeping_extension(cleaned, max_length);

    if truncated.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        truncated
    }
}

/// Truncate by characters, preserving the extension when it fits
fn truncate_keeping_extension(name: &str, max_length: usize) -> String {
    if name.chars().count() <= max_length {
        return name.to_string();
    }

    let (stem, ext) = split_extension(name);
    let ext_len = ext.chars().count();

    if ext_len >= max_length {
        return name.chars().take(max_length).collect();
    }

    let mut out: String = stem.chars().take(max_length - ext_len).collect();
    out.push_str(ext);
    out
}

/// Split `name` into stem and extension (extension includes the dot)
///
/// A leading dot does not start an extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// True when `name` is a bare filename with nothing that could escape a directory
pub fn is_path_safe(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !RESERVED.is_match(name)
        && !CONTROL.is_match(name)
}
