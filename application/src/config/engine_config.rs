//! Engine configuration container
//!
//! One explicit, immutable configuration object injected at construction —
//! the roster, the weight table, and the discussion parameters all live
//! here. Nothing is read from process-wide state, and nothing in this
//! object mutates during a run.

use conclave_domain::{ExpectedShape, ExpertiseWeightTable, Roster, VoteScale};
use std::time::Duration;
use thiserror::Error;

/// Fatal configuration errors
///
/// These are the only errors allowed to cross layer boundaries as failures;
/// everything runtime-flaky is absorbed by fallbacks instead.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Roster is empty - at least one specialist role is required")]
    EmptyRoster,

    #[error("min_consensus must be within [0, 1], got {0}")]
    InvalidMinConsensus(f64),

    #[error("max_rounds must be >= 1")]
    InvalidMaxRounds,

    #[error("Call timeout must be non-zero")]
    InvalidTimeout,

    #[error("Duplicate role name in roster: {0}")]
    DuplicateRole(String),
}

/// Immutable configuration for one engine instance
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Ordered roster of specialist roles
    pub roster: Roster,
    /// Per-(role, field) expertise weights
    pub weights: ExpertiseWeightTable,
    /// Consensus threshold in `[0, 1]`
    pub min_consensus: f64,
    /// Round budget
    pub max_rounds: usize,
    /// Deadline for every bounded call
    pub call_timeout: Duration,
    /// Declared vote score bounds
    pub vote_scale: VoteScale,
    /// Optional shape every recovered proposal must match
    pub expected_shape: Option<ExpectedShape>,
}

impl EngineConfig {
    pub fn new(roster: Roster, weights: ExpertiseWeightTable) -> Self {
        Self {
            roster,
            weights,
            min_consensus: 0.75,
            max_rounds: 3,
            call_timeout: Duration::from_secs(60),
            vote_scale: VoteScale::default(),
            expected_shape: None,
        }
    }

    pub fn with_min_consensus(mut self, min_consensus: f64) -> Self {
        self.min_consensus = min_consensus;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_vote_scale(mut self, scale: VoteScale) -> Self {
        self.vote_scale = scale;
        self
    }

    pub fn with_expected_shape(mut self, shape: ExpectedShape) -> Self {
        self.expected_shape = Some(shape);
        self
    }

    /// Validate the configuration; fatal on failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roster.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        let mut seen = std::collections::BTreeSet::new();
        for name in self.roster.names() {
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateRole(name.to_string()));
            }
        }
        if !(0.0..=1.0).contains(&self.min_consensus) {
            return Err(ConfigError::InvalidMinConsensus(self.min_consensus));
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::InvalidMaxRounds);
        }
        if self.call_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}
