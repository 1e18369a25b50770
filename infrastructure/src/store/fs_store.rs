//! Filesystem artifact store
//!
//! Writes run artifacts under a timestamped session directory, one directory
//! per store instance. Directory creation happens lazily on the first write
//! so constructing a store never touches the disk.

use crate::config::FileOutputConfig;
use async_trait::async_trait;
use conclave_application::ports::artifact_store::{ArtifactStore, ArtifactStoreError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Artifact store rooted at `<base>/<session-YYYYMMDD-HHMMSS>/`
pub struct FsArtifactStore {
    session_dir: PathBuf,
}

impl FsArtifactStore {
    /// Create a store for a new session under `base`.
    pub fn new(base: impl AsRef<Path>) -> Self {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        Self {
            session_dir: base.as_ref().join(format!("session-{}", stamp)),
        }
    }

    /// Create a store rooted at the configured artifact directory.
    pub fn from_config(config: &FileOutputConfig) -> Self {
        Self::new(&config.artifact_dir)
    }

    /// The session directory artifacts land in
    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn write_artifact(&self, path: &str, bytes: &[u8]) -> Result<(), ArtifactStoreError> {
        let target = self.session_dir.join(path);
        let display_path = target.display().to_string();

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ArtifactStoreError::WriteFailed {
                    path: display_path.clone(),
                    reason: e.to_string(),
                })?;
        }

        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| ArtifactStoreError::WriteFailed {
                path: display_path.clone(),
                reason: e.to_string(),
            })?;

        debug!(path = %display_path, bytes = bytes.len(), "artifact written");
        Ok(())
    }
}
