//! mediagrab-server - Main entry point
//!
//! HTTP front-end over yt-dlp: downloads media on request, keeps a bounded
//! download history and sweeps old files.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mediagrab_common::config::{self, ConfigOverrides};
use mediagrab_server::extractor::{YtDlpConfig, YtDlpExtractor};
use mediagrab_server::{build_router, AppState};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for mediagrab-server
///
/// Every flag falls back to its environment variable, then to the config
/// file, then to the compiled default.
#[derive(Parser, Debug)]
#[command(name = "mediagrab-server")]
#[command(about = "HTTP media download service backed by yt-dlp")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(long, env = "MEDIAGRAB_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for downloaded files and the history log
    #[arg(long, env = "DOWNLOAD_FOLDER")]
    download_dir: Option<PathBuf>,

    /// Files older than this many days are swept
    #[arg(long, env = "MAX_FILE_AGE_DAYS")]
    max_file_age_days: Option<u64>,

    /// History entries kept
    #[arg(long, env = "MAX_HISTORY_ITEMS")]
    max_history_items: Option<usize>,

    /// Address to bind
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// yt-dlp binary
    #[arg(long, env = "YTDLP_PATH")]
    ytdlp_path: Option<PathBuf>,

    /// Cookie jar passed to yt-dlp when present
    #[arg(long, env = "COOKIE_FILE")]
    cookie_file: Option<PathBuf>,

    /// Per-download timeout in seconds
    #[arg(long, env = "DOWNLOAD_TIMEOUT_SECS")]
    download_timeout_secs: Option<u64>,

    /// Minutes between periodic sweeps, 0 disables
    #[arg(long, env = "CLEANUP_INTERVAL_MINUTES")]
    cleanup_interval_minutes: Option<u64>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            download_dir: self.download_dir.clone(),
            max_file_age_days: self.max_file_age_days,
            max_history_items: self.max_history_items,
            host: self.host.clone(),
            port: self.port,
            ytdlp_path: self.ytdlp_path.clone(),
            cookie_file: self.cookie_file.clone(),
            download_timeout_secs: self.download_timeout_secs,
            cleanup_interval_minutes: self.cleanup_interval_minutes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mediagrab_server=info,mediagrab_common=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting mediagrab-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let file_config = config::load_config_file(args.config.as_deref())
        .context("Failed to load config file")?;
    let config = config::resolve(args.overrides(), file_config).context("Invalid configuration")?;

    config
        .ensure_download_dir()
        .with_context(|| format!("Failed to create {}", config.download_dir.display()))?;

    info!("Download directory: {}", config.download_dir.display());
    info!("Files kept for {} day(s)", config.max_file_age_days);
    info!("History cap: {} entries", config.max_history_items);
    info!("yt-dlp binary: {}", config.ytdlp_path.display());

    let extractor = YtDlpExtractor::new(YtDlpConfig {
        cookie_file: Some(config.cookie_file.clone()),
        timeout: config.download_timeout(),
        ..YtDlpConfig::new(config.ytdlp_path.clone())
    });

    let state = AppState::from_config(&config, Arc::new(extractor));

    let deleted = state.sweeper.sweep_once().await;
    info!("Startup cleanup removed {} file(s)", deleted);
    info!("Loaded {} history entries", state.history.len().await);

    let sweep_task = config
        .cleanup_interval()
        .map(|interval| state.sweeper.clone().spawn_periodic(interval));

    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("mediagrab-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(task) = sweep_task {
        task.abort();
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
