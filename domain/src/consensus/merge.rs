//! Field-level weighted voting aggregator
//!
//! Merges the per-role proposals of one round into a single document. For
//! every field appearing in any proposal, the value from the highest-weighted
//! role wins outright; ties break deterministically by roster registration
//! order. Per-field provenance is kept for auditing.

use crate::consensus::weights::ExpertiseWeightTable;
use crate::document::proposal::ProposalDocument;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Which role's value won a field, and at what weight
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldProvenance {
    /// Winning role
    pub role: String,
    /// The weight that won
    pub weight: f64,
    /// Whether the winning value came from the role's static fallback
    pub from_fallback: bool,
}

/// One merged document with per-field provenance
///
/// Invariant: every field present in any input proposal appears exactly once
/// here, and every field carries exactly one provenance entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MergedDocument {
    /// Winning value per field
    pub fields: BTreeMap<String, Value>,
    /// Audit trail: who won each field and at what weight
    pub provenance: BTreeMap<String, FieldProvenance>,
}

impl MergedDocument {
    /// Winning value for a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Winning role for a field
    pub fn winner(&self, field: &str) -> Option<&str> {
        self.provenance.get(field).map(|p| p.role.as_str())
    }

    /// The merged fields as a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// Merge proposals field-by-field via weighted voting.
///
/// `proposals` must be in roster registration order — with equal weights the
/// earliest role in that order wins, never randomness or value content.
/// Strictly-greater comparison keeps the first-seen tuple on ties.
pub fn aggregate(
    proposals: &[ProposalDocument],
    weights: &ExpertiseWeightTable,
) -> MergedDocument {
    // Union of all fields across proposals, in deterministic name order
    let mut all_fields: BTreeMap<&str, ()> = BTreeMap::new();
    for proposal in proposals {
        for name in proposal.field_names() {
            all_fields.insert(name, ());
        }
    }

    let mut merged = MergedDocument::default();

    for (field, ()) in all_fields {
        let mut winner: Option<(&ProposalDocument, f64)> = None;

        for proposal in proposals {
            if !proposal.fields.contains_key(field) {
                continue;
            }
            let weight = weights.weight(&proposal.role, field);
            let beats_current = match winner {
                Some((_, best)) => weight > best,
                None => true,
            };
            if beats_current {
                winner = Some((proposal, weight));
            }
        }

        if let Some((proposal, weight)) = winner {
            merged
                .fields
                .insert(field.to_string(), proposal.fields[field].clone());
            merged.provenance.insert(
                field.to_string(),
                FieldProvenance {
                    role: proposal.role.clone(),
                    weight,
                    from_fallback: proposal.from_fallback,
                },
            );
        }
    }

    merged
}
