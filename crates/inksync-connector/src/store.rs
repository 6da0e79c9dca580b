//! Pluggable persistence for cache snapshots.

use crate::cache::CacheSnapshot;
use crate::error::StoreError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Durable storage for one org's cache snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the persisted snapshot, if one exists.
    async fn load(&self) -> Result<Option<CacheSnapshot>, StoreError>;

    /// Persist the given snapshot.
    async fn persist(&self, snapshot: &CacheSnapshot) -> Result<(), StoreError>;
}

/// Filesystem-backed store holding one JSON file per org.
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    path: PathBuf,
}

impl FsSnapshotStore {
    /// Store rooted at `dir`, keyed by org name.
    pub fn new(dir: impl AsRef<Path>, org: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{org}.json")),
        }
    }

    /// Location of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for FsSnapshotStore {
    async fn load(&self) -> Result<Option<CacheSnapshot>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let snapshot = serde_json::from_slice(&bytes)?;
                debug!(path = %self.path.display(), "loaded cache snapshot");
                Ok(Some(snapshot))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn persist(&self, snapshot: &CacheSnapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        tokio::fs::write(&self.path, bytes).await?;
        debug!(path = %self.path.display(), "persisted cache snapshot");
        Ok(())
    }
}
