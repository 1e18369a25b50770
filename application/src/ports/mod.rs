//! Port definitions
//!
//! Interfaces the application layer needs from the outside world.
//! Implementations (adapters) live in the infrastructure layer.

pub mod artifact_store;
pub mod progress;
pub mod text_backend;

pub use artifact_store::{ArtifactStore, ArtifactStoreError, NoopArtifactStore};
pub use progress::{NoProgress, ProgressNotifier};
pub use text_backend::{BackendError, TextBackend};
