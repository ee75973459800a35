//! Download history store
//!
//! History is a JSON array on disk, oldest first, capped to the most recent
//! `cap` entries. Entries are immutable once written.
//!
//! Every read-modify-write cycle runs under the store's mutex, so concurrent
//! appends from simultaneous requests cannot drop each other's entries.
//! Writes go to a sibling temp file first and are renamed into place.

use crate::media::FormatType;
use crate::platform::Platform;
use crate::{time, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error};
use uuid::Uuid;

/// File name of the history log inside the download directory
pub const HISTORY_FILE_NAME: &str = ".history.json";

/// Default number of entries returned by `recent` callers
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// Fields supplied by the download handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHistoryEntry {
    pub url: String,
    pub title: String,
    pub filename: String,
    pub platform: Platform,
    /// Display string, e.g. "1920x1080 @30fps" or "MP3 Audio (192kbps)"
    pub quality: String,
    pub format: FormatType,
    pub size_mb: f64,
    /// Seconds
    pub duration: f64,
}

/// One completed download as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub url: String,
    pub title: String,
    pub filename: String,
    pub platform: Platform,
    pub quality: String,
    pub format: FormatType,
    pub size_mb: f64,
    pub duration: f64,
    /// RFC 3339 UTC, assigned on append
    pub timestamp: String,
    /// 8 hex characters, assigned on append
    pub id: String,
}

impl HistoryEntry {
    fn stamp(new: NewHistoryEntry) -> Self {
        let id = Uuid::new_v4().simple().to_string()[..8].to_string();
        Self {
            url: new.url,
            title: new.title,
            filename: new.filename,
            platform: new.platform,
            quality: new.quality,
            format: new.format,
            size_mb: new.size_mb,
            duration: new.duration,
            timestamp: time::to_rfc3339(time::now()),
            id,
        }
    }
}

/// Append-only, capped history log with serialized writes
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    cap: usize,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    /// Create a store backed by `path`, keeping at most `cap` entries
    pub fn new(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            path: path.into(),
            cap: cap.max(1),
            write_lock: Mutex::new(()),
        }
    }

    /// Store at `{download_dir}/.history.json`
    pub fn in_dir(download_dir: &Path, cap: usize) -> Self {
        Self::new(download_dir.join(HISTORY_FILE_NAME), cap)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Load all entries, oldest first
    ///
    /// A missing file is an empty history. An unreadable or corrupt file is
    /// logged and treated as empty.
    pub async fn load(&self) -> Vec<HistoryEntry> {
        match self.read_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Error loading history from {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Append an entry, trimming to the cap; returns the stored entry
    pub async fn append(&self, new: NewHistoryEntry) -> Result<HistoryEntry> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await;
        let entry = HistoryEntry::stamp(new);
        entries.push(entry.clone());
        self.write_entries(entries).await?;

        debug!("History entry {} appended ({})", entry.id, entry.filename);
        Ok(entry)
    }

    /// Most recent `limit` entries, newest first
    pub async fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        let entries = self.load().await;
        entries.into_iter().rev().take(limit).collect()
    }

    /// Most recent entry
    pub async fn last(&self) -> Option<HistoryEntry> {
        self.load().await.pop()
    }

    pub async fn len(&self) -> usize {
        self.load().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Truncate history to an empty array
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_entries(Vec::new()).await
    }

    async fn read_entries(&self) -> Result<Vec<HistoryEntry>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_entries(&self, mut entries: Vec<HistoryEntry>) -> Result<()> {
        if entries.len() > self.cap {
            let excess = entries.len() - self.cap;
            entries.drain(..excess);
        }

        let json = serde_json::to_vec_pretty(&entries)?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}
