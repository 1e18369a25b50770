//! Recovery service: offline ladder plus one AI-assisted repair
//!
//! The pure strategies 1-5 live in `conclave_domain::recovery`. This service
//! adds the last rung: when the ladder is exhausted, exactly one bounded
//! backend call asks for a corrected document, and its answer is parsed with
//! the primary strategies only — never another repair.

use crate::bounded_call::{BoundedExecutor, CallRequest};
use crate::ports::text_backend::TextBackend;
use conclave_domain::recovery::{self, RecoveredDocument};
use conclave_domain::{ExpectedShape, PromptTemplate};
use std::time::Duration;
use tracing::{debug, warn};

/// Turns raw backend text into a validated document
pub struct RecoveryService<'a, B: TextBackend> {
    executor: &'a BoundedExecutor<B>,
    repair_timeout: Duration,
}

impl<'a, B: TextBackend> RecoveryService<'a, B> {
    pub fn new(executor: &'a BoundedExecutor<B>, repair_timeout: Duration) -> Self {
        Self {
            executor,
            repair_timeout,
        }
    }

    /// Recover a document, spending at most one extra backend call.
    ///
    /// Returns `None` when both the offline ladder and the repair attempt
    /// are exhausted. Shape validation failures are indistinguishable from
    /// parse failures by design.
    pub async fn recover(
        &self,
        label: &str,
        raw: &str,
        shape: Option<&ExpectedShape>,
    ) -> Option<RecoveredDocument> {
        if raw.trim().is_empty() {
            return None;
        }

        if let Some(recovered) = recovery::recover_offline(raw, shape) {
            debug!(
                label = %label,
                strategy = %recovered.strategy,
                "document recovered offline"
            );
            return Some(recovered);
        }

        warn!(label = %label, "offline recovery exhausted; attempting AI repair");
        let request = CallRequest::new(
            format!("{}/repair", label),
            PromptTemplate::repair(raw, shape),
            self.repair_timeout,
        );
        let result = self.executor.execute(&request).await;
        if !result.is_usable() {
            return None;
        }

        let repaired = recovery::parse_with_primary_strategies(&result.text, shape);
        match &repaired {
            Some(_) => debug!(label = %label, "AI repair recovered the document"),
            None => warn!(label = %label, "AI repair answer was itself unparseable"),
        }
        repaired
    }
}
