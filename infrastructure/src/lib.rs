//! Infrastructure layer for conclave
//!
//! Adapters for the application layer's ports: TOML configuration loading
//! with multi-source merging, an HTTP text backend speaking the chat
//! completions wire format, and a filesystem artifact store for run output.

pub mod backend;
pub mod config;
pub mod store;

// Re-export commonly used types
pub use backend::HttpTextBackend;
pub use config::{ConfigLoader, FileConfig};
pub use store::FsArtifactStore;
