//! Specialist roles and the roster
//!
//! A role is a named specialist perspective (e.g. "researcher", "editor",
//! "stylist") with a domain-focus description, the set of fields it owns,
//! and a static fallback document. The roster is the fixed, ordered
//! collection of roles for one engine instance — registration order doubles
//! as the deterministic tie-break order during aggregation.

use crate::document::proposal::FallbackDocument;
use serde::{Deserialize, Serialize};

/// One specialist role in the roster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleSpec {
    /// Unique role name
    pub name: String,
    /// Domain-focus description injected into the role's prompts
    pub focus: String,
    /// Fields this role is expected to own in its proposals
    pub owned_fields: Vec<String>,
    /// Optional critique lens: a domain-specific angle this role applies
    /// during the critique phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critique_lens: Option<String>,
    /// Static substitute document for when this role's calls fail
    #[serde(default)]
    pub fallback: FallbackDocument,
}

impl RoleSpec {
    pub fn new(name: impl Into<String>, focus: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            focus: focus.into(),
            owned_fields: Vec::new(),
            critique_lens: None,
            fallback: FallbackDocument::default(),
        }
    }

    /// Declare a field this role owns (builder style)
    pub fn with_owned_field(mut self, field: impl Into<String>) -> Self {
        self.owned_fields.push(field.into());
        self
    }

    /// Attach a critique lens
    pub fn with_critique_lens(mut self, lens: impl Into<String>) -> Self {
        self.critique_lens = Some(lens.into());
        self
    }

    /// Attach the static fallback document
    pub fn with_fallback(mut self, fallback: FallbackDocument) -> Self {
        self.fallback = fallback;
        self
    }
}

/// The fixed, ordered roster of roles for one engine instance
///
/// Read-only for the lifetime of the engine — no roles are added or removed
/// during a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Roster {
    roles: Vec<RoleSpec>,
}

impl Roster {
    pub fn new(roles: Vec<RoleSpec>) -> Self {
        Self { roles }
    }

    /// Roles in registration order
    pub fn roles(&self) -> &[RoleSpec] {
        &self.roles
    }

    /// Number of registered roles
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Look up a role by name
    pub fn get(&self, name: &str) -> Option<&RoleSpec> {
        self.roles.iter().find(|r| r.name == name)
    }

    /// Role names in registration order — the aggregation tie-break order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(|r| r.name.as_str())
    }
}
