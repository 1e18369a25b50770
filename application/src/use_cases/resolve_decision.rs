//! Decision routing use case
//!
//! The public entry point of the engine. With a backend configured it runs
//! the full round-based discussion; without one it answers from the pure
//! offline rule table, so callers always get a decision.

use crate::config::EngineConfig;
use crate::ports::artifact_store::ArtifactStore;
use crate::ports::progress::ProgressNotifier;
use crate::ports::text_backend::TextBackend;
use crate::use_cases::run_discussion::{
    DiscussionInput, RunDiscussionError, RunDiscussionUseCase,
};
use conclave_domain::{ConsensusResult, HeuristicDecision, ObservableInputs, decide};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// How a decision was produced
#[derive(Debug, Clone)]
pub enum EngineDecision {
    /// Full discussion ran to TERMINATED
    Consensus(ConsensusResult),
    /// No backend was configured; the offline rule table answered
    Heuristic(HeuristicDecision),
}

impl EngineDecision {
    /// The decision text regardless of origin
    pub fn decision_text(&self) -> &str {
        match self {
            EngineDecision::Consensus(result) => &result.decision,
            EngineDecision::Heuristic(decision) => &decision.decision,
        }
    }

    pub fn is_heuristic(&self) -> bool {
        matches!(self, EngineDecision::Heuristic(_))
    }
}

/// Input for one decision request
#[derive(Debug, Clone)]
pub struct ResolveDecisionInput {
    /// What to decide about
    pub topic: String,
    /// Coarse observables for the offline rule table
    pub observables: ObservableInputs,
}

impl ResolveDecisionInput {
    pub fn new(topic: impl Into<String>, observables: ObservableInputs) -> Self {
        Self {
            topic: topic.into(),
            observables,
        }
    }
}

/// Use case routing between the discussion engine and the offline heuristic
pub struct ResolveDecisionUseCase<B: TextBackend + 'static> {
    backend: Option<Arc<B>>,
    config: Arc<EngineConfig>,
    cancellation_token: Option<CancellationToken>,
}

impl<B: TextBackend + 'static> ResolveDecisionUseCase<B> {
    pub fn new(backend: Option<Arc<B>>, config: Arc<EngineConfig>) -> Self {
        Self {
            backend,
            config,
            cancellation_token: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Resolve one decision.
    ///
    /// Never fails for lack of a backend; in that case the offline rule
    /// table answers synchronously.
    pub async fn execute(
        &self,
        input: ResolveDecisionInput,
        progress: &dyn ProgressNotifier,
        artifacts: &dyn ArtifactStore,
    ) -> Result<EngineDecision, RunDiscussionError> {
        match &self.backend {
            Some(backend) => {
                let mut discussion =
                    RunDiscussionUseCase::new(Arc::clone(backend), Arc::clone(&self.config));
                if let Some(token) = &self.cancellation_token {
                    discussion = discussion.with_cancellation(token.clone());
                }
                let result = discussion
                    .execute(DiscussionInput::new(input.topic), progress, artifacts)
                    .await?;
                Ok(EngineDecision::Consensus(result))
            }
            None => {
                info!(topic = %input.topic, "no backend configured, answering from rule table");
                Ok(EngineDecision::Heuristic(decide(&input.observables)))
            }
        }
    }
}
