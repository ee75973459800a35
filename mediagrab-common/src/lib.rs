//! # mediagrab common library
//!
//! Shared code for the mediagrab service:
//! - Error type
//! - Configuration resolution (CLI/env overrides, TOML file, defaults)
//! - Filename sanitizer
//! - Platform classifier
//! - Download request vocabulary (quality, format)
//! - Download history store
//! - Time helpers

pub mod config;
pub mod error;
pub mod history;
pub mod media;
pub mod platform;
pub mod sanitize;
pub mod time;

pub use error::{Error, Result};
pub use media::{FormatType, Quality};
pub use platform::Platform;
