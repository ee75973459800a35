//! Configuration loading and resolution
//!
//! Every setting resolves in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 are parsed by the binary (clap with `env`) and arrive here
//! as [`ConfigOverrides`]. Tier 3 is [`TomlConfig`].

use crate::history::HISTORY_FILE_NAME;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MEDIAGRAB_CONFIG";

/// Compiled defaults
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
pub const DEFAULT_MAX_FILE_AGE_DAYS: u64 = 1;
pub const DEFAULT_MAX_HISTORY_ITEMS: usize = 100;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";
pub const DEFAULT_COOKIE_FILE: &str = "cookies.txt";
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 900;
pub const DEFAULT_CLEANUP_INTERVAL_MINUTES: u64 = 60;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_DAY: u64 = 24 * 60 * SECS_PER_MINUTE;

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Directory holding downloaded files and the history log
    pub download_dir: PathBuf,
    /// Files older than this many days are swept
    pub max_file_age_days: u64,
    /// History cap
    pub max_history_items: usize,
    pub host: String,
    pub port: u16,
    /// Extraction tool binary (absolute path or name looked up on PATH)
    pub ytdlp_path: PathBuf,
    /// Cookie jar handed to the extraction tool when it exists
    pub cookie_file: PathBuf,
    pub download_timeout_secs: u64,
    /// 0 disables the periodic sweep (the startup sweep still runs)
    pub cleanup_interval_minutes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            max_file_age_days: DEFAULT_MAX_FILE_AGE_DAYS,
            max_history_items: DEFAULT_MAX_HISTORY_ITEMS,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            ytdlp_path: PathBuf::from(DEFAULT_YTDLP_PATH),
            cookie_file: PathBuf::from(DEFAULT_COOKIE_FILE),
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            cleanup_interval_minutes: DEFAULT_CLEANUP_INTERVAL_MINUTES,
        }
    }
}

impl ServerConfig {
    /// Path of the history log
    pub fn history_path(&self) -> PathBuf {
        self.download_dir.join(HISTORY_FILE_NAME)
    }

    /// Age cutoff for the sweep
    pub fn max_file_age(&self) -> Duration {
        Duration::from_secs(self.max_file_age_days.saturating_mul(SECS_PER_DAY))
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Periodic sweep interval, `None` when disabled
    pub fn cleanup_interval(&self) -> Option<Duration> {
        match self.cleanup_interval_minutes {
            0 => None,
            minutes => Some(Duration::from_secs(minutes.saturating_mul(SECS_PER_MINUTE))),
        }
    }

    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Create the download directory if missing
    pub fn ensure_download_dir(&self) -> Result<()> {
        if !self.download_dir.exists() {
            std::fs::create_dir_all(&self.download_dir)?;
            info!("Created download directory: {}", self.download_dir.display());
        }
        Ok(())
    }

    fn validate(self) -> Result<Self> {
        if self.max_history_items == 0 {
            return Err(Error::Config(
                "max_history_items must be at least 1".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        if self.download_timeout_secs == 0 {
            return Err(Error::Config(
                "download_timeout_secs must be non-zero".to_string(),
            ));
        }
        if self.download_dir.as_os_str().is_empty() {
            return Err(Error::Config("download folder must not be empty".to_string()));
        }
        if self.max_file_age_days.checked_mul(SECS_PER_DAY).is_none() {
            return Err(Error::Config(format!(
                "max_file_age_days out of range: {}",
                self.max_file_age_days
            )));
        }
        if self
            .cleanup_interval_minutes
            .checked_mul(SECS_PER_MINUTE)
            .is_none()
        {
            return Err(Error::Config(format!(
                "cleanup_interval_minutes out of range: {}",
                self.cleanup_interval_minutes
            )));
        }
        Ok(self)
    }
}

/// Settings from command line or environment (tiers 1 and 2)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub download_dir: Option<PathBuf>,
    pub max_file_age_days: Option<u64>,
    pub max_history_items: Option<usize>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub ytdlp_path: Option<PathBuf>,
    pub cookie_file: Option<PathBuf>,
    pub download_timeout_secs: Option<u64>,
    pub cleanup_interval_minutes: Option<u64>,
}

/// TOML config file schema (tier 3); every key optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub download_folder: Option<PathBuf>,
    pub max_file_age_days: Option<u64>,
    pub max_history_items: Option<usize>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub ytdlp_path: Option<PathBuf>,
    pub cookie_file: Option<PathBuf>,
    pub download_timeout_secs: Option<u64>,
    pub cleanup_interval_minutes: Option<u64>,
}

/// Merge overrides over the TOML file over compiled defaults, then validate
pub fn resolve(overrides: ConfigOverrides, file: Option<TomlConfig>) -> Result<ServerConfig> {
    let file = file.unwrap_or_default();
    let defaults = ServerConfig::default();

    ServerConfig {
        download_dir: overrides
            .download_dir
            .or(file.download_folder)
            .unwrap_or(defaults.download_dir),
        max_file_age_days: overrides
            .max_file_age_days
            .or(file.max_file_age_days)
            .unwrap_or(defaults.max_file_age_days),
        max_history_items: overrides
            .max_history_items
            .or(file.max_history_items)
            .unwrap_or(defaults.max_history_items),
        host: overrides.host.or(file.host).unwrap_or(defaults.host),
        port: overrides.port.or(file.port).unwrap_or(defaults.port),
        ytdlp_path: overrides
            .ytdlp_path
            .or(file.ytdlp_path)
            .unwrap_or(defaults.ytdlp_path),
        cookie_file: overrides
            .cookie_file
            .or(file.cookie_file)
            .unwrap_or(defaults.cookie_file),
        download_timeout_secs: overrides
            .download_timeout_secs
            .or(file.download_timeout_secs)
            .unwrap_or(defaults.download_timeout_secs),
        cleanup_interval_minutes: overrides
            .cleanup_interval_minutes
            .or(file.cleanup_interval_minutes)
            .unwrap_or(defaults.cleanup_interval_minutes),
    }
    .validate()
}

/// Default config file location: `{config_dir}/mediagrab/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mediagrab").join("config.toml"))
}

/// Find the config file to load
///
/// An explicit path (argument, then `MEDIAGRAB_CONFIG`) must exist. The
/// default location is used only when present.
pub fn locate_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(Some(path));
        }
        return Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    Ok(default_config_path().filter(|p| p.is_file()))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Locate and parse the config file; a missing default file is not an error
pub fn load_config_file(explicit: Option<&Path>) -> Result<Option<TomlConfig>> {
    match locate_config_file(explicit)? {
        Some(path) => {
            let config = load_toml_config(&path)?;
            info!("Loaded config file: {}", path.display());
            Ok(Some(config))
        }
        None => {
            warn!("No config file found, using command line, environment and defaults");
            Ok(None)
        }
    }
}
