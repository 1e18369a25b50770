//! Use cases
//!
//! The orchestration flows of the engine, leaf-first: proposal generation,
//! the round-based discussion state machine, and the public decision router.

pub mod generate_proposals;
pub mod resolve_decision;
pub mod run_discussion;

pub use generate_proposals::ProposalGenerator;
pub use resolve_decision::{EngineDecision, ResolveDecisionInput, ResolveDecisionUseCase};
pub use run_discussion::{
    DiscussionInput, RunDiscussionError, RunDiscussionUseCase, expected_backend_calls,
};
