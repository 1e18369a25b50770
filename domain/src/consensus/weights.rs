//! Expertise weight table
//!
//! Maps `role -> field -> weight` for the field-level weighted vote. Unlisted
//! pairs fall back to [`DEFAULT_WEIGHT`], so a role still gets a say on
//! fields outside its declared expertise — just a quiet one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight assumed for any (role, field) pair not present in the table
pub const DEFAULT_WEIGHT: f64 = 0.3;

/// Immutable `role -> field -> weight` table
///
/// Weights are clamped to `[0, 1]` on insert. The table is constructed once
/// from configuration and never mutated during a run.
///
/// # Example
///
/// ```
/// use conclave_domain::{ExpertiseWeightTable, DEFAULT_WEIGHT};
///
/// let mut table = ExpertiseWeightTable::new();
/// table.set("editor", "title", 0.9);
///
/// assert_eq!(table.weight("editor", "title"), 0.9);
/// assert_eq!(table.weight("editor", "unknown_field"), DEFAULT_WEIGHT);
/// assert_eq!(table.weight("unknown_role", "title"), DEFAULT_WEIGHT);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ExpertiseWeightTable {
    entries: BTreeMap<String, BTreeMap<String, f64>>,
}

impl ExpertiseWeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a weight, clamped to `[0, 1]`.
    ///
    /// Only used while building the table from configuration; engine code
    /// holds the table behind a shared reference and cannot reach this.
    pub fn set(&mut self, role: impl Into<String>, field: impl Into<String>, weight: f64) {
        self.entries
            .entry(role.into())
            .or_default()
            .insert(field.into(), weight.clamp(0.0, 1.0));
    }

    /// Weight for a (role, field) pair, defaulting when unlisted
    pub fn weight(&self, role: &str, field: &str) -> f64 {
        self.entries
            .get(role)
            .and_then(|fields| fields.get(field))
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    /// All declared fields for a role (its expertise area)
    pub fn declared_fields(&self, role: &str) -> impl Iterator<Item = &str> {
        self.entries
            .get(role)
            .into_iter()
            .flat_map(|fields| fields.keys().map(|k| k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weight_for_unlisted_pairs() {
        let table = ExpertiseWeightTable::new();
        assert_eq!(table.weight("anyone", "anything"), DEFAULT_WEIGHT);
    }

    #[test]
    fn test_set_and_lookup() {
        let mut table = ExpertiseWeightTable::new();
        table.set("researcher", "key_points", 0.85);
        table.set("researcher", "topic", 0.9);

        assert_eq!(table.weight("researcher", "topic"), 0.9);
        assert_eq!(table.weight("researcher", "key_points"), 0.85);
        assert_eq!(table.weight("researcher", "title"), DEFAULT_WEIGHT);
    }

    #[test]
    fn test_weights_clamped() {
        let mut table = ExpertiseWeightTable::new();
        table.set("a", "x", 1.7);
        table.set("a", "y", -0.3);

        assert_eq!(table.weight("a", "x"), 1.0);
        assert_eq!(table.weight("a", "y"), 0.0);
    }

    #[test]
    fn test_declared_fields() {
        let mut table = ExpertiseWeightTable::new();
        table.set("editor", "title", 0.9);
        table.set("editor", "hook", 0.8);

        let fields: Vec<_> = table.declared_fields("editor").collect();
        assert_eq!(fields, vec!["hook", "title"]);
        assert_eq!(table.declared_fields("nobody").count(), 0);
    }
}
