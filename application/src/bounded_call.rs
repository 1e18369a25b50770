//! Bounded call executor
//!
//! Wraps any single backend call in a hard wall-clock deadline with an
//! optional fallback value. Timed-out calls are abandoned, not cancelled —
//! the backend may keep working after the deadline, so callers must not
//! assume prompt release of backend-side resources.
//!
//! No retries happen here. Retry policy, if any, belongs to the caller where
//! it stays explicit and visible.

use crate::ports::text_backend::TextBackend;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One external call: a rendered prompt, a deadline, an optional fallback
#[derive(Debug, Clone)]
pub struct CallRequest {
    /// Short label for log entries (e.g. "propose/editor")
    pub label: String,
    /// The rendered prompt
    pub prompt: String,
    /// Hard wall-clock deadline
    pub timeout: Duration,
    /// Value to substitute when the call times out or errors
    pub fallback: Option<String>,
}

impl CallRequest {
    pub fn new(label: impl Into<String>, prompt: impl Into<String>, timeout: Duration) -> Self {
        Self {
            label: label.into(),
            prompt: prompt.into(),
            timeout,
            fallback: None,
        }
    }

    /// Attach a fallback value (builder style)
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }
}

/// How a bounded call concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    /// The backend answered within the deadline
    Ok,
    /// The call failed or timed out and the supplied fallback was substituted
    Fallback,
    /// The call failed or timed out with no fallback available
    Failed,
}

/// Result of one bounded call
#[derive(Debug, Clone)]
pub struct CallResult {
    pub status: CallStatus,
    /// Response (or fallback) text; empty on `Failed`
    pub text: String,
    /// Wall-clock time spent
    pub elapsed: Duration,
    /// Error description on `Fallback` and `Failed`
    pub error: Option<String>,
}

impl CallResult {
    /// Whether `text` carries something usable (live answer or fallback)
    pub fn is_usable(&self) -> bool {
        matches!(self.status, CallStatus::Ok | CallStatus::Fallback)
    }

    /// Whether the backend itself answered
    pub fn is_live(&self) -> bool {
        self.status == CallStatus::Ok
    }
}

/// Executes single calls against a backend under a deadline
pub struct BoundedExecutor<B: TextBackend> {
    backend: Arc<B>,
}

impl<B: TextBackend> BoundedExecutor<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Run one call under its deadline.
    ///
    /// Timeouts and backend errors are handled identically: substitute the
    /// fallback when present, otherwise report `Failed` with the elapsed
    /// time and a named error. This method itself never errors.
    pub async fn execute(&self, request: &CallRequest) -> CallResult {
        debug!(
            label = %request.label,
            timeout_ms = request.timeout.as_millis() as u64,
            "bounded call start"
        );
        let started = Instant::now();

        let outcome = tokio::time::timeout(request.timeout, self.backend.submit(&request.prompt)).await;
        let elapsed = started.elapsed();

        let error = match outcome {
            Ok(Ok(text)) => {
                debug!(
                    label = %request.label,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "bounded call ok"
                );
                return CallResult {
                    status: CallStatus::Ok,
                    text,
                    elapsed,
                    error: None,
                };
            }
            Ok(Err(backend_error)) => backend_error.to_string(),
            Err(_) => format!(
                "deadline exceeded after {}ms (call abandoned)",
                elapsed.as_millis()
            ),
        };

        match &request.fallback {
            Some(fallback) => {
                warn!(
                    label = %request.label,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %error,
                    "bounded call failed; substituting fallback"
                );
                CallResult {
                    status: CallStatus::Fallback,
                    text: fallback.clone(),
                    elapsed,
                    error: Some(error),
                }
            }
            None => {
                warn!(
                    label = %request.label,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %error,
                    "bounded call failed"
                );
                CallResult {
                    status: CallStatus::Failed,
                    text: String::new(),
                    elapsed,
                    error: Some(error),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Script, ScriptedBackend};
    use std::time::Duration;

    fn request(timeout_ms: u64) -> CallRequest {
        CallRequest::new("test/call", "prompt", Duration::from_millis(timeout_ms))
    }

    #[tokio::test]
    async fn test_ok_within_deadline() {
        let backend = Arc::new(ScriptedBackend::always(Script::Reply("answer".into())));
        let executor = BoundedExecutor::new(backend.clone());

        let result = executor.execute(&request(1_000)).await;

        assert_eq!(result.status, CallStatus::Ok);
        assert_eq!(result.text, "answer");
        assert!(result.error.is_none());
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_timeout_returns_within_deadline() {
        let backend = Arc::new(ScriptedBackend::always(Script::Hang));
        let executor = BoundedExecutor::new(backend);

        let started = Instant::now();
        let result = executor.execute(&request(50)).await;

        assert_eq!(result.status, CallStatus::Failed);
        assert!(result.text.is_empty());
        assert!(result.error.unwrap().contains("deadline exceeded"));
        // t + epsilon: generous margin for scheduler jitter
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_timeout_with_fallback() {
        let backend = Arc::new(ScriptedBackend::always(Script::Hang));
        let executor = BoundedExecutor::new(backend);

        let result = executor
            .execute(&request(50).with_fallback("substitute"))
            .await;

        assert_eq!(result.status, CallStatus::Fallback);
        assert_eq!(result.text, "substitute");
        assert!(result.error.is_some());
        assert!(result.is_usable());
        assert!(!result.is_live());
    }

    #[tokio::test]
    async fn test_backend_error_same_handling_as_timeout() {
        let backend = Arc::new(ScriptedBackend::always(Script::Fail("boom".into())));
        let executor = BoundedExecutor::new(backend);

        let failed = executor.execute(&request(1_000)).await;
        assert_eq!(failed.status, CallStatus::Failed);
        assert!(failed.error.unwrap().contains("boom"));

        let backend = Arc::new(ScriptedBackend::always(Script::Fail("boom".into())));
        let executor = BoundedExecutor::new(backend);
        let substituted = executor
            .execute(&request(1_000).with_fallback("substitute"))
            .await;
        assert_eq!(substituted.status, CallStatus::Fallback);
        assert_eq!(substituted.text, "substitute");
    }

    #[tokio::test]
    async fn test_no_retries() {
        let backend = Arc::new(ScriptedBackend::always(Script::Fail("down".into())));
        let executor = BoundedExecutor::new(backend.clone());

        let _ = executor.execute(&request(1_000)).await;
        assert_eq!(backend.calls(), 1);
    }
}
