//! Application layer for conclave
//!
//! This crate contains the orchestration use cases and port definitions of
//! the Consensus Orchestration Engine. It depends only on the domain layer;
//! adapters for its ports live in the infrastructure layer.
//!
//! Layering, leaf-first:
//!
//! - [`bounded_call`] — one external call under a hard deadline with an
//!   optional fallback value.
//! - [`recovery`] — the offline strategy ladder plus the single AI-assisted
//!   repair attempt.
//! - [`use_cases::generate_proposals`] — one recovered document per
//!   specialist role, fallback documents included.
//! - [`use_cases::run_discussion`] — the round-based state machine:
//!   propose, critique, synthesize, vote, consensus-check, finalize.
//! - [`use_cases::resolve_decision`] — the public entry point that routes to
//!   the offline heuristic when no backend is configured.

pub mod bounded_call;
pub mod config;
pub mod ports;
pub mod recovery;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use bounded_call::{BoundedExecutor, CallRequest, CallResult, CallStatus};
pub use config::{ConfigError, EngineConfig};
pub use ports::{
    artifact_store::{ArtifactStore, ArtifactStoreError, NoopArtifactStore},
    progress::{NoProgress, ProgressNotifier},
    text_backend::{BackendError, TextBackend},
};
pub use recovery::RecoveryService;
pub use use_cases::generate_proposals::ProposalGenerator;
pub use use_cases::resolve_decision::{
    EngineDecision, ResolveDecisionInput, ResolveDecisionUseCase,
};
pub use use_cases::run_discussion::{
    DiscussionInput, RunDiscussionError, RunDiscussionUseCase, expected_backend_calls,
};
