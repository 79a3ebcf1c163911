//! Persisted result artifacts
//!
//! Diff and overwrite results land in files under a cache directory that
//! mirrors the source layout, so the artifact for a given source path is
//! always the same file and reruns replace it in place.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::debug;

use crate::error::EngineError;

/// Cache directory, relative to the workspace root
pub const CACHE_DIR: &str = ".cache/text-refine";

/// Resolves artifact paths and prepares them for writing
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at the workspace root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Artifact path for a source file: its workspace-relative path
    /// mirrored under [`CACHE_DIR`]. Sources outside the root keep only
    /// their file name.
    pub fn cache_path(&self, source: &Path) -> PathBuf {
        let relative = source
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| {
                source
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("untitled"))
            });
        self.root.join(CACHE_DIR).join(relative)
    }

    /// Make `artifact` writable: create parent directories and, when
    /// `backup` is set and a previous artifact exists, copy it aside
    /// first.
    ///
    /// The backup is a copy, not a rename, so the artifact keeps its path
    /// and anything watching it keeps watching the same file. Returns the
    /// backup path when one was written.
    pub async fn prepare(
        &self,
        artifact: &Path,
        backup: bool,
    ) -> Result<Option<PathBuf>, EngineError> {
        if let Some(parent) = artifact.parent() {
            fs::create_dir_all(parent).await?;
        }

        if !backup || fs::metadata(artifact).await.is_err() {
            return Ok(None);
        }

        let backup_path = backup_path_for(artifact).await?;
        fs::copy(artifact, &backup_path).await?;
        debug!("backed up {} to {}", artifact.display(), backup_path.display());
        Ok(Some(backup_path))
    }

    /// Replace the artifact's contents
    pub async fn write(&self, artifact: &Path, text: &str) -> Result<(), EngineError> {
        fs::write(artifact, text).await?;
        Ok(())
    }
}

/// Timestamped sibling path for a backup, stamped with the artifact's
/// modification time so the name identifies the run that produced it.
async fn backup_path_for(artifact: &Path) -> Result<PathBuf, EngineError> {
    let modified = fs::metadata(artifact).await?.modified()?;
    let stamp: DateTime<Utc> = modified.into();

    let name = artifact
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact");
    let backup_name = format!("{}.{}.bak", name, stamp.format("%Y%m%d_%H%M%S"));

    Ok(artifact.with_file_name(backup_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn cache_path_mirrors_sources_inside_the_root() {
        let store = ArtifactStore::new("/workspace");
        assert_eq!(
            store.cache_path(Path::new("/workspace/docs/notes.md")),
            PathBuf::from("/workspace/.cache/text-refine/docs/notes.md")
        );
    }

    #[test]
    fn cache_path_flattens_sources_outside_the_root() {
        let store = ArtifactStore::new("/workspace");
        assert_eq!(
            store.cache_path(Path::new("/elsewhere/notes.md")),
            PathBuf::from("/workspace/.cache/text-refine/notes.md")
        );
    }

    #[tokio::test]
    async fn prepare_creates_missing_parents() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path());
        let artifact = store.cache_path(&temp.path().join("deep/nested/file.txt"));

        let backup = store.prepare(&artifact, true).await.unwrap();
        assert!(backup.is_none());

        store.write(&artifact, "result").await.unwrap();
        assert_eq!(fs::read_to_string(&artifact).await.unwrap(), "result");
    }

    #[tokio::test]
    async fn backup_copies_and_keeps_the_artifact_path() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path());
        let artifact = temp.path().join("result.txt");

        store.write(&artifact, "first run").await.unwrap();

        let backup = store.prepare(&artifact, true).await.unwrap().unwrap();
        store.write(&artifact, "second run").await.unwrap();

        // The original path still exists with the new content; the old
        // content survives in the backup.
        assert_eq!(fs::read_to_string(&artifact).await.unwrap(), "second run");
        assert_eq!(fs::read_to_string(&backup).await.unwrap(), "first run");
        assert!(backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with(".bak"));
    }

    #[tokio::test]
    async fn prepare_without_backup_leaves_no_copies() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path());
        let artifact = temp.path().join("result.txt");

        store.write(&artifact, "first run").await.unwrap();
        let backup = store.prepare(&artifact, false).await.unwrap();
        assert!(backup.is_none());

        let mut entries = fs::read_dir(temp.path()).await.unwrap();
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 1);
    }
}
