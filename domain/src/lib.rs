//! Domain layer for conclave
//!
//! This crate contains the core business logic, entities, and value objects
//! of the Consensus Orchestration Engine. It has no dependencies on
//! infrastructure or async runtime concerns.
//!
//! # Core Concepts
//!
//! ## Proposal & Merge
//!
//! Each specialist role produces one [`ProposalDocument`] per round. The
//! aggregator merges them field-by-field: for every field, the value proposed
//! by the highest-weighted role wins outright. Selection, never blending.
//!
//! ## Recovery
//!
//! Generative backends routinely emit JSON wrapped in prose, markdown fences,
//! template placeholders, or truncated mid-object. The [`recovery`] module
//! holds the offline strategy ladder that turns such text back into a
//! validated document.
//!
//! ## Heuristic
//!
//! When no backend is configured at all, the [`heuristic`] policy produces a
//! deterministic rule-table decision so callers always get an answer.

pub mod consensus;
pub mod document;
pub mod heuristic;
pub mod prompt;
pub mod recovery;
pub mod role;

// Re-export commonly used types
pub use consensus::{
    merge::{FieldProvenance, MergedDocument, aggregate},
    state::{ConsensusResult, DiscussionPhase, DiscussionState, RoundMessage},
    vote::{ConsensusVote, VoteScale, consensus_level, parse_vote_response},
    weights::{DEFAULT_WEIGHT, ExpertiseWeightTable},
};
pub use document::{
    proposal::{FallbackDocument, ProposalDocument},
    shape::ExpectedShape,
};
pub use heuristic::{ContentCategory, HeuristicDecision, ObservableInputs, TargetChannel, decide};
pub use prompt::PromptTemplate;
pub use recovery::{RecoveredDocument, RecoveryStrategy, recover_offline};
pub use role::{Roster, RoleSpec};
