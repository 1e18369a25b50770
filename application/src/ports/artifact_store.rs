//! Session artifact store port
//!
//! Used exactly once per discussion run, at FINALIZE, to persist the merged
//! document and decision text. Persistence failures are logged and absorbed —
//! a decision that cannot be written is still a decision.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactStoreError {
    #[error("Write failed for {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

/// Destination for run artifacts
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write one artifact at a store-relative path
    async fn write_artifact(&self, path: &str, bytes: &[u8]) -> Result<(), ArtifactStoreError>;
}

/// No-op store for callers that don't persist anything
pub struct NoopArtifactStore;

#[async_trait]
impl ArtifactStore for NoopArtifactStore {
    async fn write_artifact(&self, _path: &str, _bytes: &[u8]) -> Result<(), ArtifactStoreError> {
        Ok(())
    }
}
