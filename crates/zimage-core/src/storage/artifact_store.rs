//! Bounded on-disk artifact store.
//!
//! # Layout
//!
//! One flat directory of `*.png` files. There is no index: the directory
//! listing and each file's modification time are the only source of truth
//! for ordering and eviction.
//!
//! # Write discipline
//!
//! Artifacts are written to a hidden `.<name>.partial` file and renamed into
//! place. Only `*.png` entries are artifacts, so a listing never includes a
//! file that is still being written.

use std::cmp::Ordering;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use super::error::StorageError;
use crate::domain::ARTIFACT_EXTENSION;
use crate::paths::ensure_output_dir;

/// A stored artifact as seen by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub filename: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Outcome of one eviction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// File names deleted by this pass, oldest first.
    pub removed: Vec<String>,
    /// Deletions that failed and were skipped.
    pub failed: usize,
}

impl EvictionReport {
    pub const fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.failed == 0
    }
}

/// The artifact directory with its configured cap.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    max_stored: usize,
}

impl ArtifactStore {
    /// Open the store, creating `dir` if it does not exist.
    pub fn open(dir: impl Into<PathBuf>, max_stored: usize) -> Result<Self, StorageError> {
        let dir = dir.into();
        ensure_output_dir(&dir)?;
        debug!(dir = %dir.display(), max_stored, "Opened artifact store");
        Ok(Self { dir, max_stored })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub const fn max_stored(&self) -> usize {
        self.max_stored
    }

    /// Persist `png` under `filename`.
    ///
    /// The returned path only exists once the bytes are completely written.
    pub async fn write_png(&self, filename: &str, png: &[u8]) -> Result<PathBuf, StorageError> {
        let final_path = self.dir.join(filename);
        let partial_path = self.dir.join(format!(".{filename}.partial"));

        if let Err(source) = tokio::fs::write(&partial_path, png).await {
            let _ = tokio::fs::remove_file(&partial_path).await;
            return Err(StorageError::Write {
                path: final_path,
                source,
            });
        }

        if let Err(source) = tokio::fs::rename(&partial_path, &final_path).await {
            let _ = tokio::fs::remove_file(&partial_path).await;
            return Err(StorageError::Write {
                path: final_path,
                source,
            });
        }

        Ok(final_path)
    }

    /// List artifacts oldest first.
    ///
    /// Ties in modification time are broken by file name so one pass always
    /// sees the same order.
    pub async fn list(&self) -> Result<Vec<StoredArtifact>, StorageError> {
        let list_err = |source| StorageError::List {
            path: self.dir.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(list_err)?;
        let mut artifacts = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            let Some(filename) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if !is_artifact_name(&filename) {
                continue;
            }
            // Entries can disappear between read_dir and stat when another
            // request evicts concurrently.
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(list_err(e)),
            };
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().map_err(list_err)?;
            artifacts.push(StoredArtifact {
                filename,
                path: entry.path(),
                modified,
            });
        }

        artifacts.sort_by(oldest_first);
        Ok(artifacts)
    }

    /// Number of stored artifacts.
    pub async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.list().await?.len())
    }

    /// Delete the oldest artifacts until at most `max_stored` remain.
    ///
    /// `keep` is never a deletion candidate. Individual deletion failures
    /// are logged and skipped; the pass carries on with the next candidate
    /// in its set and is not retried.
    pub async fn evict(&self, keep: Option<&str>) -> Result<EvictionReport, StorageError> {
        let artifacts = self.list().await?;
        let mut report = EvictionReport::default();

        if artifacts.len() <= self.max_stored {
            return Ok(report);
        }
        let excess = artifacts.len() - self.max_stored;

        let candidates = artifacts
            .into_iter()
            .filter(|artifact| Some(artifact.filename.as_str()) != keep)
            .take(excess);

        for artifact in candidates {
            match tokio::fs::remove_file(&artifact.path).await {
                Ok(()) => {
                    info!("Deleted old image: {}", artifact.filename);
                    report.removed.push(artifact.filename);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("Old image already gone: {}", artifact.filename);
                }
                Err(e) => {
                    warn!("Failed to delete old image {}: {}", artifact.filename, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Path of a stored artifact, or `None` if no such artifact exists.
    ///
    /// Names that are not a single plain `*.png` file name (for example
    /// `../secret.png`) are treated as absent.
    pub async fn resolve_path(&self, filename: &str) -> Option<PathBuf> {
        if !is_artifact_name(filename) || !is_single_component(filename) {
            return None;
        }
        let path = self.dir.join(filename);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Some(path),
            _ => None,
        }
    }
}

fn oldest_first(a: &StoredArtifact, b: &StoredArtifact) -> Ordering {
    a.modified
        .cmp(&b.modified)
        .then_with(|| a.filename.cmp(&b.filename))
}

fn is_artifact_name(name: &str) -> bool {
    !name.starts_with('.')
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(ARTIFACT_EXTENSION))
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(first)), None) if first == name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str, age_secs: u64) {
        let path = dir.join(name);
        std::fs::write(&path, b"png").unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("generated_images");
        let store = ArtifactStore::open(&dir, 3).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_orders_oldest_first_and_ignores_non_artifacts() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::open(temp.path(), 10).unwrap();
        touch(temp.path(), "newest.png", 1);
        touch(temp.path(), "oldest.png", 300);
        touch(temp.path(), "middle.png", 60);
        touch(temp.path(), "notes.txt", 900);
        touch(temp.path(), ".hidden.png.partial", 900);

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.filename)
            .collect();
        assert_eq!(names, ["oldest.png", "middle.png", "newest.png"]);
    }

    #[tokio::test]
    async fn test_equal_mtimes_break_ties_by_name() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::open(temp.path(), 10).unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(30);
        for name in ["b.png", "a.png", "c.png"] {
            let path = temp.path().join(name);
            std::fs::write(&path, b"png").unwrap();
            File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(mtime)
                .unwrap();
        }

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.filename)
            .collect();
        assert_eq!(names, ["a.png", "b.png", "c.png"]);
    }

    #[tokio::test]
    async fn test_evict_removes_oldest_beyond_cap() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::open(temp.path(), 2).unwrap();
        touch(temp.path(), "a.png", 30);
        touch(temp.path(), "b.png", 20);
        touch(temp.path(), "c.png", 10);

        let report = store.evict(None).await.unwrap();
        assert_eq!(report.removed, ["a.png"]);
        assert_eq!(report.failed, 0);
        assert!(!temp.path().join("a.png").exists());
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_evict_under_cap_is_a_no_op() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::open(temp.path(), 5).unwrap();
        touch(temp.path(), "a.png", 30);

        let report = store.evict(None).await.unwrap();
        assert!(report.is_empty());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_evict_never_removes_kept_file() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::open(temp.path(), 1).unwrap();
        // The kept file is the oldest by mtime; the next oldest goes instead.
        touch(temp.path(), "just-written.png", 50);
        touch(temp.path(), "other.png", 10);

        let report = store.evict(Some("just-written.png")).await.unwrap();
        assert_eq!(report.removed, ["other.png"]);
        assert!(temp.path().join("just-written.png").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_evict_counts_undeletable_candidates() {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let dir = temp.path().join("out");
        let store = ArtifactStore::open(&dir, 1).unwrap();
        touch(&dir, "a.png", 30);
        touch(&dir, "b.png", 20);
        touch(&dir, "c.png", 10);
        std::fs::set_permissions(&dir, Permissions::from_mode(0o555)).unwrap();

        // Permission bits do not bind a privileged user.
        if std::fs::write(dir.join(".writable"), b"").is_ok() {
            std::fs::set_permissions(&dir, Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let report = store.evict(None).await;
        std::fs::set_permissions(&dir, Permissions::from_mode(0o755)).unwrap();

        let report = report.unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(report.failed, 2);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_write_png_publishes_complete_file() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::open(temp.path(), 5).unwrap();

        let path = store.write_png("image_a.png", b"\x89PNG data").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG data");
        assert!(!temp.path().join(".image_a.png.partial").exists());
    }

    #[tokio::test]
    async fn test_write_into_removed_directory_fails() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("out");
        let store = ArtifactStore::open(&dir, 5).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        let err = store.write_png("image_a.png", b"x").await.unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
    }

    #[tokio::test]
    async fn test_resolve_path_for_unknown_and_hostile_names() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::open(temp.path().join("out"), 5).unwrap();
        std::fs::write(temp.path().join("secret.png"), b"x").unwrap();
        touch(store.dir(), "known.png", 1);

        assert_eq!(
            store.resolve_path("known.png").await,
            Some(store.dir().join("known.png"))
        );
        assert_eq!(store.resolve_path("never-generated.png").await, None);
        assert_eq!(store.resolve_path("../secret.png").await, None);
        assert_eq!(store.resolve_path("/etc/passwd").await, None);
        assert_eq!(store.resolve_path("").await, None);
        assert_eq!(store.resolve_path(".known.png.partial").await, None);
    }
}
