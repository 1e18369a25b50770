//! Generative-text backend port
//!
//! The engine's only outbound dependency. Treated as untrusted and
//! unreliable at every call site: it may error, return empty text, or take
//! unbounded time. Deadlines are enforced by the caller
//! ([`crate::bounded_call::BoundedExecutor`]), never assumed of the backend.

use async_trait::async_trait;
use thiserror::Error;

/// Errors a backend adapter may surface
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Backend returned an empty response")]
    EmptyResponse,

    #[error("Other error: {0}")]
    Other(String),
}

/// A capability that turns a prompt into text
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Submit one prompt and await the full text answer.
    ///
    /// Implementations should not retry internally — retry and timeout
    /// policy belongs to the bounded executor so it stays visible.
    async fn submit(&self, prompt: &str) -> Result<String, BackendError>;
}
