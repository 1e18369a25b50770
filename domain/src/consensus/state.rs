//! Discussion state machine data
//!
//! [`DiscussionState`] is the private, per-run state threaded through the
//! round-based protocol: created at INITIALIZE, mutated only by the state
//! machine, discarded after FINALIZE. [`ConsensusResult`] is the immutable
//! output handed to the caller.

use crate::consensus::merge::MergedDocument;
use crate::consensus::vote::ConsensusVote;
use serde::{Deserialize, Serialize};

/// Maximum number of insights retained across rounds; oldest drop first
pub const MAX_INSIGHTS: usize = 30;

/// Maximum number of insights a single SYNTHESIZE step may append
pub const MAX_INSIGHTS_PER_ROUND: usize = 5;

/// Phases of the round-based discussion protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscussionPhase {
    Initialize,
    Propose,
    Critique,
    Synthesize,
    Vote,
    ConsensusCheck,
    Finalize,
    Terminated,
}

impl DiscussionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscussionPhase::Initialize => "initialize",
            DiscussionPhase::Propose => "propose",
            DiscussionPhase::Critique => "critique",
            DiscussionPhase::Synthesize => "synthesize",
            DiscussionPhase::Vote => "vote",
            DiscussionPhase::ConsensusCheck => "consensus-check",
            DiscussionPhase::Finalize => "finalize",
            DiscussionPhase::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for DiscussionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One message accumulated during a round (proposal summary or critique)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundMessage {
    /// Round the message belongs to
    pub round: usize,
    /// Phase that produced it
    pub phase: DiscussionPhase,
    /// Speaking role
    pub role: String,
    /// Message text
    pub content: String,
}

impl RoundMessage {
    pub fn new(
        round: usize,
        phase: DiscussionPhase,
        role: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            round,
            phase,
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Mutable per-run discussion state
///
/// Exclusively owned by one state-machine run; there is no cross-session
/// sharing, so no synchronization is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionState {
    /// Current round (1-indexed)
    pub round: usize,
    /// Configured round budget
    pub max_rounds: usize,
    /// Configured consensus threshold in `[0, 1]`
    pub min_consensus: f64,
    /// Latest derived consensus level in `[0, 1]` (not monotonic)
    pub consensus_level: f64,
    /// Accumulated insights, capped at [`MAX_INSIGHTS`]
    insights: Vec<String>,
    /// Accumulated round messages
    pub messages: Vec<RoundMessage>,
    /// Votes from the most recent VOTE phase
    pub last_votes: Vec<ConsensusVote>,
}

impl DiscussionState {
    /// INITIALIZE: round = 1, consensus = 0
    pub fn new(max_rounds: usize, min_consensus: f64) -> Self {
        Self {
            round: 1,
            max_rounds: max_rounds.max(1),
            min_consensus: min_consensus.clamp(0.0, 1.0),
            consensus_level: 0.0,
            insights: Vec::new(),
            messages: Vec::new(),
            last_votes: Vec::new(),
        }
    }

    /// Append up to [`MAX_INSIGHTS_PER_ROUND`] new insights, dropping the
    /// oldest entries once the cumulative log exceeds [`MAX_INSIGHTS`].
    pub fn append_insights(&mut self, new_insights: impl IntoIterator<Item = String>) {
        self.insights
            .extend(new_insights.into_iter().take(MAX_INSIGHTS_PER_ROUND));
        if self.insights.len() > MAX_INSIGHTS {
            let excess = self.insights.len() - MAX_INSIGHTS;
            self.insights.drain(..excess);
        }
    }

    /// The bounded cumulative insight log
    pub fn insights(&self) -> &[String] {
        &self.insights
    }

    /// Record a message for the current round
    pub fn push_message(&mut self, phase: DiscussionPhase, role: &str, content: impl Into<String>) {
        self.messages
            .push(RoundMessage::new(self.round, phase, role, content));
    }

    /// Messages belonging to the current round only
    pub fn current_round_messages(&self) -> impl Iterator<Item = &RoundMessage> {
        self.messages.iter().filter(|m| m.round == self.round)
    }

    /// CONSENSUS_CHECK: advance the round counter and decide the next phase.
    ///
    /// Finalizes when the consensus threshold is met or the round budget is
    /// exhausted; otherwise loops back to PROPOSE.
    pub fn consensus_check(&mut self) -> DiscussionPhase {
        self.round += 1;
        if self.consensus_level >= self.min_consensus || self.round > self.max_rounds {
            DiscussionPhase::Finalize
        } else {
            DiscussionPhase::Propose
        }
    }

    /// Rounds actually completed so far
    pub fn rounds_taken(&self) -> usize {
        self.round.saturating_sub(1)
    }
}

/// Immutable final output of a discussion run
///
/// Owned by the caller after return; the engine keeps nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Final decision text
    pub decision: String,
    /// The merged proposal document the decision was drawn from
    pub merged: MergedDocument,
    /// Consensus level achieved in `[0, 1]`
    pub consensus_level: f64,
    /// Number of discussion rounds taken
    pub rounds_taken: usize,
    /// Bounded list of key insights accumulated across rounds
    pub key_insights: Vec<String>,
}
