//! Proposal documents produced by specialist roles
//!
//! Each role emits exactly one [`ProposalDocument`] per discussion round.
//! When the role's live call cannot be recovered, its static
//! [`FallbackDocument`] is substituted instead, so the per-round document
//! count is always equal to the roster size.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One specialist role's structured answer for a round
///
/// # Example
///
/// ```
/// use conclave_domain::ProposalDocument;
/// use serde_json::json;
///
/// let doc = ProposalDocument::new("editor")
///     .with_field("title", json!("Five rust patterns"))
///     .with_field("duration_secs", json!(45));
///
/// assert_eq!(doc.role, "editor");
/// assert_eq!(doc.fields.len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProposalDocument {
    /// Role that produced this proposal
    pub role: String,
    /// Field name -> proposed value (primitive, list, or nested object)
    pub fields: BTreeMap<String, Value>,
    /// Creation timestamp (milliseconds since epoch)
    pub timestamp: u64,
    /// Whether this document came from the role's static fallback
    #[serde(default)]
    pub from_fallback: bool,
}

impl ProposalDocument {
    /// Create an empty proposal for a role
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            fields: BTreeMap::new(),
            timestamp: current_timestamp(),
            from_fallback: false,
        }
    }

    /// Build a proposal from a recovered JSON object
    ///
    /// Non-object values cannot be proposals — callers should treat them as
    /// recovery failures before reaching this point.
    pub fn from_object(role: impl Into<String>, object: &serde_json::Map<String, Value>) -> Self {
        let fields = object
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            role: role.into(),
            fields,
            timestamp: current_timestamp(),
            from_fallback: false,
        }
    }

    /// Add a single field (builder style)
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Names of all fields present in this proposal
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// Whether the proposal carries no fields at all
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A static, pre-authored substitute document for one role
///
/// Baked into configuration at engine construction and never mutated at
/// runtime. Instantiated into a [`ProposalDocument`] whenever the role's
/// live call fails or cannot be recovered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FallbackDocument {
    /// Field name -> static default value
    pub fields: BTreeMap<String, Value>,
}

impl FallbackDocument {
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }

    /// Instantiate this fallback as a proposal owned by `role`
    pub fn instantiate(&self, role: impl Into<String>) -> ProposalDocument {
        ProposalDocument {
            role: role.into(),
            fields: self.fields.clone(),
            timestamp: current_timestamp(),
            from_fallback: true,
        }
    }
}

/// Get current timestamp in milliseconds
pub(crate) fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
