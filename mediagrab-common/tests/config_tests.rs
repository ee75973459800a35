//! Unit tests for configuration resolution
//!
//! Covers:
//! - Priority order: overrides (CLI/env) > TOML file > compiled defaults
//! - Missing default config file is not an error
//! - Explicit config file must exist and parse
//! - Validation of out-of-range values
//!
//! Note: Uses serial_test because tests that manipulate MEDIAGRAB_CONFIG
//! must not run in parallel.

use mediagrab_common::config::{
    load_config_file, load_toml_config, locate_config_file, resolve, ConfigOverrides,
    ServerConfig, TomlConfig, CONFIG_ENV_VAR, DEFAULT_CLEANUP_INTERVAL_MINUTES,
};
use mediagrab_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_defaults_when_nothing_configured() {
    let config = resolve(ConfigOverrides::default(), None).unwrap();
    assert_eq!(config, ServerConfig::default());
    assert_eq!(config.download_dir, PathBuf::from("downloads"));
    assert_eq!(config.max_file_age_days, 1);
    assert_eq!(config.max_history_items, 100);
    assert_eq!(config.port, 8000);
    assert_eq!(config.cleanup_interval_minutes, DEFAULT_CLEANUP_INTERVAL_MINUTES);
}

#[test]
fn test_toml_overrides_defaults() {
    let file = TomlConfig {
        download_folder: Some(PathBuf::from("/srv/media")),
        port: Some(9000),
        max_history_items: Some(10),
        ..Default::default()
    };

    let config = resolve(ConfigOverrides::default(), Some(file)).unwrap();
    assert_eq!(config.download_dir, PathBuf::from("/srv/media"));
    assert_eq!(config.port, 9000);
    assert_eq!(config.max_history_items, 10);
    // Untouched keys keep defaults
    assert_eq!(config.max_file_age_days, 1);
    assert_eq!(config.host, "0.0.0.0");
}

#[test]
fn test_overrides_take_precedence_over_toml() {
    let file = TomlConfig {
        port: Some(9000),
        max_file_age_days: Some(7),
        ..Default::default()
    };
    let overrides = ConfigOverrides {
        port: Some(9100),
        ..Default::default()
    };

    let config = resolve(overrides, Some(file)).unwrap();
    assert_eq!(config.port, 9100);
    assert_eq!(config.max_file_age_days, 7);
}

#[test]
fn test_zero_history_cap_rejected() {
    let overrides = ConfigOverrides {
        max_history_items: Some(0),
        ..Default::default()
    };
    let err = resolve(overrides, None).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_oversized_durations_rejected() {
    let overrides = ConfigOverrides {
        max_file_age_days: Some(u64::MAX / 1000),
        ..Default::default()
    };
    assert!(matches!(resolve(overrides, None), Err(Error::Config(_))));

    let file = TomlConfig {
        cleanup_interval_minutes: Some(u64::MAX / 2),
        ..Default::default()
    };
    assert!(matches!(
        resolve(ConfigOverrides::default(), Some(file)),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_large_but_valid_durations_convert() {
    let overrides = ConfigOverrides {
        max_file_age_days: Some(36_500),
        cleanup_interval_minutes: Some(525_600),
        ..Default::default()
    };
    let config = resolve(overrides, None).unwrap();
    assert_eq!(config.max_file_age().as_secs(), 36_500 * 86_400);
    assert_eq!(config.cleanup_interval().unwrap().as_secs(), 525_600 * 60);
}

#[test]
fn test_zero_port_rejected() {
    let file = TomlConfig {
        port: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        resolve(ConfigOverrides::default(), Some(file)),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_parse_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
download_folder = "/var/lib/mediagrab"
max_file_age_days = 3
max_history_items = 250
port = 8080
ytdlp_path = "/usr/local/bin/yt-dlp"
cleanup_interval_minutes = 0
"#,
    )
    .unwrap();

    let file = load_toml_config(&path).unwrap();
    assert_eq!(file.download_folder, Some(PathBuf::from("/var/lib/mediagrab")));
    assert_eq!(file.max_file_age_days, Some(3));
    assert_eq!(file.max_history_items, Some(250));
    assert_eq!(file.port, Some(8080));
    assert_eq!(file.ytdlp_path, Some(PathBuf::from("/usr/local/bin/yt-dlp")));

    let config = resolve(ConfigOverrides::default(), Some(file)).unwrap();
    assert_eq!(config.cleanup_interval(), None);
}

#[test]
fn test_invalid_toml_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = \"not a number\"").unwrap();

    assert!(matches!(load_toml_config(&path), Err(Error::Config(_))));
}

#[test]
fn test_unknown_key_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "download_dir = \"typo\"").unwrap();

    assert!(matches!(load_toml_config(&path), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_explicit_missing_config_is_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let missing = PathBuf::from("/nonexistent/mediagrab/config.toml");
    assert!(matches!(
        locate_config_file(Some(&missing)),
        Err(Error::Config(_))
    ));
}

#[test]
#[serial]
fn test_config_env_var_is_used() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("from-env.toml");
    std::fs::write(&path, "port = 8123").unwrap();

    env::set_var(CONFIG_ENV_VAR, &path);
    let loaded = load_config_file(None);
    env::remove_var(CONFIG_ENV_VAR);

    let file = loaded.unwrap().expect("config file should be found via env");
    assert_eq!(file.port, Some(8123));
}

#[test]
#[serial]
fn test_explicit_path_beats_env_var() {
    let dir = TempDir::new().unwrap();
    let env_path = dir.path().join("env.toml");
    let arg_path = dir.path().join("arg.toml");
    std::fs::write(&env_path, "port = 1111").unwrap();
    std::fs::write(&arg_path, "port = 2222").unwrap();

    env::set_var(CONFIG_ENV_VAR, &env_path);
    let located = locate_config_file(Some(&arg_path));
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(located.unwrap(), Some(arg_path));
}

#[test]
fn test_ensure_download_dir_creates_nested_directory() {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig {
        download_dir: dir.path().join("a").join("b"),
        ..Default::default()
    };

    config.ensure_download_dir().unwrap();
    assert!(config.download_dir.is_dir());

    // Idempotent
    config.ensure_download_dir().unwrap();
}
