//! Download directory operations
//!
//! Hidden files (leading `.`) are bookkeeping, never downloads: they are not
//! listed, counted, served, deleted by name, or swept. The history log is one
//! of them.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use mediagrab_common::{sanitize, time, Error, Result};
use serde::Serialize;
use sysinfo::Disks;
use tracing::{info, warn};

/// Collision suffixes tried before giving up on a name
const MAX_NAME_SUFFIX: u32 = 1000;

/// One downloaded file as reported by GET /list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub filename: String,
    pub size_mb: f64,
    /// RFC 3339 creation time (modification time where unsupported)
    pub created: String,
    pub download_url: String,
    #[serde(skip)]
    created_at: SystemTime,
}

/// Aggregate over the download directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryStats {
    pub file_count: usize,
    pub total_bytes: u64,
}

/// Retrieval URL for a downloaded file
pub fn media_url(filename: &str) -> String {
    format!("/media/{}", filename)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Non-hidden regular files in `dir` with their metadata
async fn download_entries(dir: &Path) -> Result<Vec<(String, PathBuf, std::fs::Metadata)>> {
    let mut out = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        if is_hidden(&name) {
            continue;
        }
        let metadata = match entry.metadata().await {
            Ok(m) => m,
            Err(e) => {
                warn!("Skipping {}: {}", name, e);
                continue;
            }
        };
        if metadata.is_file() {
            out.push((name, entry.path(), metadata));
        }
    }

    Ok(out)
}

/// List downloaded files, newest first
pub async fn list_files(dir: &Path) -> Result<Vec<FileInfo>> {
    let mut files: Vec<FileInfo> = download_entries(dir)
        .await?
        .into_iter()
        .map(|(name, _, metadata)| {
            let created_at = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            FileInfo {
                download_url: media_url(&name),
                size_mb: time::bytes_to_mb(metadata.len()),
                created: time::system_time_to_rfc3339(created_at),
                filename: name,
                created_at,
            }
        })
        .collect();

    files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(files)
}

/// Count and total size of downloaded files
pub async fn directory_stats(dir: &Path) -> Result<DirectoryStats> {
    let entries = download_entries(dir).await?;
    Ok(DirectoryStats {
        file_count: entries.len(),
        total_bytes: entries.iter().map(|(_, _, m)| m.len()).sum(),
    })
}

/// Free space (MiB, 2dp) on the disk holding `dir`
///
/// Picks the disk with the longest mount point that prefixes the directory's
/// canonical path. `None` when no disk matches.
pub fn available_space_mb(dir: &Path) -> Option<f64> {
    let dir = dir.canonicalize().ok()?;
    let disks = Disks::new_with_refreshed_list();

    disks
        .list()
        .iter()
        .filter(|d| dir.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
        .map(|d| time::bytes_to_mb(d.available_space()))
}

/// Delete downloaded files older than `max_age`; returns how many were deleted
pub async fn sweep_older_than(dir: &Path, max_age: Duration) -> Result<usize> {
    let cutoff = SystemTime::now()
        .checked_sub(max_age)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    sweep_before(dir, cutoff).await
}

/// Delete downloaded files last modified before `cutoff`
///
/// Hidden files and subdirectories are never touched. Files that fail to
/// delete are logged and skipped.
pub async fn sweep_before(dir: &Path, cutoff: SystemTime) -> Result<usize> {
    let mut deleted = 0;

    for (name, path, metadata) in download_entries(dir).await? {
        let modified = match metadata.modified() {
            Ok(m) => m,
            Err(_) => continue,
        };
        if modified >= cutoff {
            continue;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => deleted += 1,
            Err(e) => warn!("Failed to delete old file {}: {}", name, e),
        }
    }

    if deleted > 0 {
        info!("Cleaned up {} old file(s)", deleted);
    }
    Ok(deleted)
}

/// Resolve a client-supplied name to a downloaded file path
///
/// Only bare, non-hidden, path-safe names resolve; anything else, or a name
/// with no regular file behind it, is `NotFound`.
pub fn resolve_media_path(dir: &Path, name: &str) -> Result<PathBuf> {
    if !sanitize::is_path_safe(name) || is_hidden(name) {
        return Err(Error::NotFound("File not found".to_string()));
    }

    let path = dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::NotFound("File not found".to_string()))
    }
}

/// Give a freshly downloaded file its sanitized name
///
/// Renames on disk when sanitizing changed the name so the served name
/// always exists. Returns the final filename and path.
pub async fn finalize_download(dir: &Path, downloaded: &Path) -> Result<(String, PathBuf)> {
    if !tokio::fs::try_exists(downloaded).await.unwrap_or(false) {
        return Err(Error::Internal(format!(
            "downloaded file missing: {}",
            downloaded.display()
        )));
    }

    let original = downloaded
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sanitized = sanitize::sanitize(&original);
    if dir.join(&sanitized) == downloaded {
        return Ok((sanitized, downloaded.to_path_buf()));
    }

    let name = free_name(dir, &sanitized).await?;
    let target = dir.join(&name);
    tokio::fs::rename(downloaded, &target).await?;
    info!("Renamed {} -> {}", original, name);

    Ok((name, target))
}

/// `name`, or `{stem}_{n}{ext}` when `name` is already taken in `dir`
async fn free_name(dir: &Path, name: &str) -> Result<String> {
    if !tokio::fs::try_exists(dir.join(name)).await? {
        return Ok(name.to_string());
    }

    let (stem, ext) = sanitize::split_extension(name);
    for n in 1..=MAX_NAME_SUFFIX {
        let candidate = format!("{}_{}{}", stem, n, ext);
        if !tokio::fs::try_exists(dir.join(&candidate)).await? {
            warn!("{} already exists, using {}", name, candidate);
            return Ok(candidate);
        }
    }

    Err(Error::Internal(format!("no free filename for {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediagrab_common::history::HISTORY_FILE_NAME;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, bytes: usize) {
        std::fs::write(dir.join(name), vec![0u8; bytes]).unwrap();
    }

    #[tokio::test]
    async fn test_list_skips_hidden_and_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "1_a.mp4", 10);
        write(dir.path(), HISTORY_FILE_NAME, 10);
        std::fs::create_dir(dir.path().join("subdir")).unwrap();

        let files = list_files(dir.path()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "1_a.mp4");
        assert_eq!(files[0].download_url, "/media/1_a.mp4");
        assert!(chrono::DateTime::parse_from_rfc3339(&files[0].created).is_ok());
    }

    #[tokio::test]
    async fn test_stats_counts_only_downloads() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "1_a.mp4", 1024 * 1024);
        write(dir.path(), "2_b.mp3", 1024 * 1024);
        write(dir.path(), HISTORY_FILE_NAME, 4096);

        let stats = directory_stats(dir.path()).await.unwrap();
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.total_bytes, 2 * 1024 * 1024);
    }

    fn backdate(path: &Path, age: Duration) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[tokio::test]
    async fn test_sweep_removes_only_files_older_than_cutoff() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "1_old.mp4", 10);
        write(dir.path(), "2_new.mp3", 10);
        write(dir.path(), HISTORY_FILE_NAME, 10);
        backdate(&dir.path().join("1_old.mp4"), Duration::from_secs(3 * 86_400));
        backdate(&dir.path().join(HISTORY_FILE_NAME), Duration::from_secs(3 * 86_400));

        let deleted = sweep_older_than(dir.path(), Duration::from_secs(86_400))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert!(!dir.path().join("1_old.mp4").exists());
        assert!(dir.path().join("2_new.mp3").exists());
        // History log survives even when old
        assert!(dir.path().join(HISTORY_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_sweep_before_future_cutoff_takes_every_download() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "1_a.mp4", 10);
        write(dir.path(), "2_b.mp3", 10);

        let past = SystemTime::now() - Duration::from_secs(3600);
        assert_eq!(sweep_before(dir.path(), past).await.unwrap(), 0);

        let future = SystemTime::now() + Duration::from_secs(3600);
        assert_eq!(sweep_before(dir.path(), future).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_sweep_older_than_keeps_fresh_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "1_fresh.mp4", 10);

        let deleted = sweep_older_than(dir.path(), Duration::from_secs(86_400))
            .await
            .unwrap();
        assert_eq!(deleted, 0);
        assert!(dir.path().join("1_fresh.mp4").exists());
    }

    #[tokio::test]
    async fn test_sweep_leaves_subdirectories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("keep")).unwrap();
        write(&dir.path().join("keep"), "inner.mp4", 10);

        let future = SystemTime::now() + Duration::from_secs(3600);
        assert_eq!(sweep_before(dir.path(), future).await.unwrap(), 0);
        assert!(dir.path().join("keep").join("inner.mp4").exists());
    }

    #[test]
    fn test_resolve_media_path() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "1_a.mp4", 1);
        write(dir.path(), HISTORY_FILE_NAME, 1);

        assert_eq!(
            resolve_media_path(dir.path(), "1_a.mp4").unwrap(),
            dir.path().join("1_a.mp4")
        );
        for bad in ["missing.mp4", HISTORY_FILE_NAME, "..", "../1_a.mp4", "", "a/b.mp4"] {
            assert!(
                matches!(resolve_media_path(dir.path(), bad), Err(Error::NotFound(_))),
                "{:?} should not resolve",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_finalize_renames_unsafe_name() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "1700000000_My  Video?.mp4", 3);

        let (name, path) = finalize_download(dir.path(), &dir.path().join("1700000000_My  Video?.mp4"))
            .await
            .unwrap();

        assert_eq!(name, "1700000000_My_Video.mp4");
        assert_eq!(path, dir.path().join("1700000000_My_Video.mp4"));
        assert!(path.exists());
        assert!(!dir.path().join("1700000000_My  Video?.mp4").exists());
    }

    #[tokio::test]
    async fn test_finalize_does_not_overwrite_existing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("1700000000_My_Video.mp4"), b"earlier").unwrap();
        std::fs::write(dir.path().join("1700000000_My Video.mp4"), b"new").unwrap();

        let (name, path) = finalize_download(dir.path(), &dir.path().join("1700000000_My Video.mp4"))
            .await
            .unwrap();

        assert_eq!(name, "1700000000_My_Video_1.mp4");
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        assert_eq!(
            std::fs::read(dir.path().join("1700000000_My_Video.mp4")).unwrap(),
            b"earlier"
        );
        assert!(!dir.path().join("1700000000_My Video.mp4").exists());
    }

    #[tokio::test]
    async fn test_finalize_keeps_safe_name() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "1700000000_clip.mp4", 3);

        let (name, path) = finalize_download(dir.path(), &dir.path().join("1700000000_clip.mp4"))
            .await
            .unwrap();
        assert_eq!(name, "1700000000_clip.mp4");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_finalize_missing_file_is_internal_error() {
        let dir = TempDir::new().unwrap();
        let err = finalize_download(dir.path(), &dir.path().join("nope.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
