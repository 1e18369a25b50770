//! Consensus domain: weights, merging, voting, and discussion state
//!
//! # Core Concepts
//!
//! ## Weighted merge
//! Every role proposes a document; the aggregator selects, per field, the
//! value from the highest-weighted role. This is selection, not blending:
//! numbers are never averaged and text is never concatenated.
//!
//! ## Consensus level
//! The normalized agreement score in `[0, 1]` that decides whether the
//! discussion continues. Defined here as the mean of the roles' numeric vote
//! scores divided by the scale maximum. (The heuristic policy's fixed
//! confidence is a separate figure and is never mixed into this level.)

pub mod merge;
pub mod state;
pub mod vote;
pub mod weights;

pub use merge::{FieldProvenance, MergedDocument, aggregate};
pub use state::{ConsensusResult, DiscussionPhase, DiscussionState, RoundMessage};
pub use vote::{ConsensusVote, VoteScale, consensus_level, parse_vote_response};
pub use weights::{DEFAULT_WEIGHT, ExpertiseWeightTable};
