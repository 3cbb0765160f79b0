//! Managed chromium revisions
//!
//! Downloads a pinned chromium snapshot into a local cache, streaming
//! progress events while the archive transfers, and keeps the cache at
//! exactly one revision: after a successful download every other cached
//! revision is evicted.

use crate::error::ResolveError;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Default pinned chromium revision, matching the viewer's supported range.
pub const DEFAULT_REVISION: &str = "1002410";

/// Chromium continuous-build snapshot bucket.
const SNAPSHOT_BASE: &str = "https://commondatastorage.googleapis.com/chromium-browser-snapshots";

/// One progress event of an in-flight snapshot download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes transferred so far
    pub bytes_done: u64,
    /// Total bytes expected (0 when the server did not say)
    pub bytes_total: u64,
}

impl DownloadProgress {
    /// Completed fraction in `[0, 1]`, or 0 when the total is unknown.
    pub fn fraction(&self) -> f64 {
        if self.bytes_total == 0 {
            0.0
        } else {
            self.bytes_done as f64 / self.bytes_total as f64
        }
    }
}

/// Provides managed chromium revisions. Abstracted so resolver logic can
/// be exercised without network access.
pub trait RevisionSource {
    /// Return the executable for `revision`, downloading it if absent.
    /// Progress events stream over `progress` while bytes transfer.
    fn ensure(
        &self,
        revision: &str,
        progress: mpsc::Sender<DownloadProgress>,
    ) -> impl std::future::Future<Output = Result<PathBuf, ResolveError>> + Send;
}

/// Snapshot-bucket fetcher with a single-revision on-disk cache.
#[derive(Debug)]
pub struct SnapshotFetcher {
    cache_dir: PathBuf,
    client: reqwest::Client,
}

impl SnapshotFetcher {
    /// Cache lives under `{local_data_dir}/chromium/{revision}/`.
    pub fn new(local_data_dir: &Path) -> Self {
        Self {
            cache_dir: local_data_dir.join("chromium"),
            client: reqwest::Client::new(),
        }
    }

    fn revision_dir(&self, revision: &str) -> PathBuf {
        self.cache_dir.join(revision)
    }

    /// Platform-specific executable path inside an extracted revision.
    pub fn executable_path(&self, revision: &str) -> PathBuf {
        self.revision_dir(revision).join(executable_suffix())
    }

    async fn download_archive(
        &self,
        revision: &str,
        progress: &mpsc::Sender<DownloadProgress>,
    ) -> Result<PathBuf, ResolveError> {
        let (platform_dir, archive_name) =
            snapshot_archive().ok_or(ResolveError::UnsupportedPlatform)?;
        let url = format!("{SNAPSHOT_BASE}/{platform_dir}/{revision}/{archive_name}.zip");
        info!(%url, "downloading chromium snapshot");

        let failed = |reason: String| ResolveError::DownloadFailed {
            revision: revision.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?
            .error_for_status()
            .map_err(|e| failed(e.to_string()))?;
        let bytes_total = response.content_length().unwrap_or(0);

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let archive_path = self.cache_dir.join(format!("{revision}.zip.part"));
        let mut file = tokio::fs::File::create(&archive_path).await?;

        let mut stream = response.bytes_stream();
        let mut bytes_done = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| failed(e.to_string()))?;
            file.write_all(&chunk).await?;
            bytes_done += chunk.len() as u64;
            let _ = progress
                .send(DownloadProgress {
                    bytes_done,
                    bytes_total,
                })
                .await;
        }
        file.flush().await?;

        Ok(archive_path)
    }

    /// Delete every cached revision other than `keep`. Best-effort: cache
    /// eviction never fails a successful download.
    async fn evict_other_revisions(&self, keep: &str) {
        let mut entries = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(_) => return,
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            if name == keep {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                match tokio::fs::remove_dir_all(&path).await {
                    Ok(()) => debug!(path = %path.display(), "evicted cached revision"),
                    Err(err) => warn!(path = %path.display(), error = %err, "eviction failed"),
                }
            }
        }
    }
}

impl RevisionSource for SnapshotFetcher {
    async fn ensure(
        &self,
        revision: &str,
        progress: mpsc::Sender<DownloadProgress>,
    ) -> Result<PathBuf, ResolveError> {
        let executable = self.executable_path(revision);
        if executable.is_file() {
            debug!(path = %executable.display(), "revision already cached");
            return Ok(executable);
        }

        let archive_path = self.download_archive(revision, &progress).await?;

        let destination = self.revision_dir(revision);
        tokio::fs::create_dir_all(&destination).await?;
        extract_and_discard(&archive_path, &destination).await?;

        if !executable.is_file() {
            return Err(ResolveError::ExtractFailed(format!(
                "archive did not contain {}",
                executable.display()
            )));
        }
        #[cfg(unix)]
        ensure_executable_bit(&executable)?;

        self.evict_other_revisions(revision).await;
        info!(path = %destination.display(), "chromium extracted");
        Ok(executable)
    }
}

/// Extract the archive, then remove it whether or not extraction worked;
/// a corrupt `.zip.part` must not linger in the cache dir.
async fn extract_and_discard(archive_path: &Path, destination: &Path) -> Result<(), ResolveError> {
    let archive = archive_path.to_path_buf();
    let dest = destination.to_path_buf();
    let outcome = tokio::task::spawn_blocking(move || extract_zip(&archive, &dest))
        .await
        .map_err(|e| ResolveError::ExtractFailed(e.to_string()))
        .and_then(|inner| inner);
    tokio::fs::remove_file(archive_path).await.ok();
    outcome
}

fn extract_zip(archive: &Path, destination: &Path) -> Result<(), ResolveError> {
    let file = std::fs::File::open(archive)?;
    let mut zip =
        zip::ZipArchive::new(file).map_err(|e| ResolveError::ExtractFailed(e.to_string()))?;
    zip.extract(destination)
        .map_err(|e| ResolveError::ExtractFailed(e.to_string()))
}

#[cfg(unix)]
fn ensure_executable_bit(path: &Path) -> Result<(), ResolveError> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

/// `(bucket directory, archive stem)` for the current platform.
fn snapshot_archive() -> Option<(&'static str, &'static str)> {
    if cfg!(target_os = "windows") {
        Some(("Win_x64", "chrome-win"))
    } else if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
        Some(("Mac_Arm", "chrome-mac"))
    } else if cfg!(target_os = "macos") {
        Some(("Mac", "chrome-mac"))
    } else if cfg!(target_os = "linux") {
        Some(("Linux_x64", "chrome-linux"))
    } else {
        None
    }
}

fn executable_suffix() -> &'static str {
    if cfg!(target_os = "windows") {
        "chrome-win/chrome.exe"
    } else if cfg!(target_os = "macos") {
        "chrome-mac/Chromium.app/Contents/MacOS/Chromium"
    } else {
        "chrome-linux/chrome"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_progress_fraction() {
        let progress = DownloadProgress {
            bytes_done: 25,
            bytes_total: 100,
        };
        assert_eq!(progress.fraction(), 0.25);

        let unknown = DownloadProgress {
            bytes_done: 25,
            bytes_total: 0,
        };
        assert_eq!(unknown.fraction(), 0.0);
    }

    #[test]
    fn test_cache_layout() {
        let fetcher = SnapshotFetcher::new(Path::new("data"));
        let exe = fetcher.executable_path("1002410");
        assert!(exe.starts_with("data/chromium/1002410"));
        assert!(exe.ends_with(executable_suffix()));
    }

    #[tokio::test]
    async fn test_eviction_keeps_only_one_revision() {
        let root = tempfile::tempdir().expect("tempdir");
        let fetcher = SnapshotFetcher::new(root.path());
        for revision in ["100", "200", "300"] {
            std::fs::create_dir_all(fetcher.revision_dir(revision)).expect("mkdir");
        }

        fetcher.evict_other_revisions("200").await;

        assert!(!fetcher.revision_dir("100").exists());
        assert!(fetcher.revision_dir("200").exists());
        assert!(!fetcher.revision_dir("300").exists());
    }

    #[tokio::test]
    async fn test_failed_extraction_removes_partial_archive() {
        let root = tempfile::tempdir().expect("tempdir");
        let archive = root.path().join("1002410.zip.part");
        std::fs::write(&archive, b"not a zip archive").expect("write");
        let destination = root.path().join("1002410");

        let err = extract_and_discard(&archive, &destination)
            .await
            .expect_err("corrupt archive");
        assert!(matches!(err, ResolveError::ExtractFailed(_)));
        assert!(!archive.exists());
    }

    #[tokio::test]
    async fn test_eviction_tolerates_missing_cache() {
        let fetcher = SnapshotFetcher::new(Path::new("/definitely/not/here"));
        fetcher.evict_other_revisions("100").await;
    }
}
