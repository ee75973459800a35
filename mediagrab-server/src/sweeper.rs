//! Age-based sweep of the download directory
//!
//! One sweep runs at startup; when an interval is configured a background
//! task repeats it until the process exits.

use std::path::PathBuf;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::storage;

/// Sweep parameters
#[derive(Debug, Clone)]
pub struct Sweeper {
    download_dir: PathBuf,
    max_age: Duration,
}

impl Sweeper {
    pub fn new(download_dir: PathBuf, max_age: Duration) -> Self {
        Self {
            download_dir,
            max_age,
        }
    }

    /// Run one sweep, returning how many files were deleted
    pub async fn sweep(&self) -> mediagrab_common::Result<usize> {
        storage::sweep_older_than(&self.download_dir, self.max_age).await
    }

    /// Run one sweep; failures are logged and reported as zero deletions
    pub async fn sweep_once(&self) -> usize {
        match self.sweep().await {
            Ok(deleted) => deleted,
            Err(e) => {
                error!("Error cleaning old files: {}", e);
                0
            }
        }
    }

    /// Spawn the periodic sweep
    pub fn spawn_periodic(self, interval: Duration) -> JoinHandle<()> {
        info!("Periodic cleanup every {:?}", interval);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately; the startup sweep already ran
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let deleted = self.sweep_once().await;
                debug!("Periodic cleanup deleted {} file(s)", deleted);
            }
        })
    }
}
