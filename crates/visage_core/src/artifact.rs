//! Transient probe artifacts.
//!
//! The comparison backend reads images from disk, so each login attempt
//! stages its decoded probe bytes as a short-lived file. The file is owned by
//! the request that staged it: paths are keyed by a request id (never only by
//! username, so concurrent attempts for the same user cannot clobber each
//! other), and release is guaranteed on every exit path. A failed delete is
//! logged and swallowed; cleanup trouble must never override the
//! authentication decision.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::CoreResult;

/// Stages decoded probe images under a media directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    media_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: media_dir.into(),
        }
    }

    /// Write `bytes` to a request-scoped path and hand back the owning guard.
    ///
    /// The media directory is created on first use.
    pub async fn stage(&self, bytes: &[u8], request_id: Uuid) -> CoreResult<StagedArtifact> {
        tokio::fs::create_dir_all(&self.media_dir).await?;
        let path = self.media_dir.join(format!("probe-{request_id}.jpg"));
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), "staged probe artifact");
        Ok(StagedArtifact { path: Some(path) })
    }
}

/// A staged probe file, deleted exactly once when released or dropped.
///
/// Dropping the guard covers early returns and unwinds; call
/// [`StagedArtifact::release`] at the end of the happy path to make the
/// cleanup point explicit.
#[derive(Debug)]
pub struct StagedArtifact {
    path: Option<PathBuf>,
}

impl StagedArtifact {
    /// Path the comparison backend should read the probe from.
    pub fn path(&self) -> &Path {
        self.path
            .as_deref()
            .unwrap_or_else(|| Path::new(""))
    }

    /// Delete the staged file now instead of waiting for drop.
    pub async fn release(mut self) {
        if let Some(path) = self.path.take() {
            if let Err(err) = tokio::fs::remove_file(&path).await {
                // Never surfaced: the authentication outcome stands.
                warn!(path = %path.display(), error = %err, "failed to release probe artifact");
            } else {
                debug!(path = %path.display(), "released probe artifact");
            }
        }
    }
}

impl Drop for StagedArtifact {
    fn drop(&mut self) {
        // Last-resort cleanup on early returns and unwinds, where no async
        // context is available.
        if let Some(path) = self.path.take() {
            if let Err(err) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %err, "failed to release probe artifact");
            } else {
                debug!(path = %path.display(), "released probe artifact");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn stage_writes_and_release_deletes() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let artifact = store.stage(b"probe bytes", Uuid::new_v4()).await.unwrap();
        let path = artifact.path().to_path_buf();
        assert_eq!(fs::read(&path).unwrap(), b"probe bytes");

        artifact.release().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn drop_deletes_on_early_exit() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let path = {
            let artifact = store.stage(b"probe bytes", Uuid::new_v4()).await.unwrap();
            artifact.path().to_path_buf()
            // artifact dropped here without an explicit release
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn drop_survives_unwind() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let artifact = store.stage(b"probe bytes", Uuid::new_v4()).await.unwrap();
        let path = artifact.path().to_path_buf();

        let result = std::panic::catch_unwind(move || {
            let _held = artifact;
            panic!("verification blew up");
        });
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn concurrent_requests_get_distinct_paths() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());

        // Same user, two in-flight attempts: both artifacts coexist.
        let a = store.stage(b"first", Uuid::new_v4()).await.unwrap();
        let b = store.stage(b"second", Uuid::new_v4()).await.unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(fs::read(a.path()).unwrap(), b"first");
        assert_eq!(fs::read(b.path()).unwrap(), b"second");

        // Releasing one leaves the other intact.
        let b_path = b.path().to_path_buf();
        a.release().await;
        assert!(b_path.exists());
        b.release().await;
        assert!(!b_path.exists());
    }

    #[tokio::test]
    async fn release_of_missing_file_is_swallowed() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let artifact = store.stage(b"probe bytes", Uuid::new_v4()).await.unwrap();

        // Simulate an external cleanup racing us.
        fs::remove_file(artifact.path()).unwrap();
        artifact.release().await; // must not panic or error
    }
}
