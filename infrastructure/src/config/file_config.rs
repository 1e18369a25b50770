//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file and
//! are deserialized directly. Conversion into the application's
//! [`EngineConfig`] happens in one place, [`FileConfig::into_engine_config`],
//! so the TOML surface can evolve without touching the engine.
//!
//! Example configuration:
//!
//! ```toml
//! [engine]
//! min_consensus = 0.75
//! max_rounds = 3
//! call_timeout_secs = 60
//!
//! [engine.expected_fields]
//! title = "text"
//! scenes = "list"
//!
//! [[roles]]
//! name = "researcher"
//! focus = "Finds and verifies source material."
//! owned_fields = ["topic", "sources"]
//!
//! [roles.weights]
//! topic = 0.9
//! sources = 0.85
//!
//! [roles.fallback]
//! topic = "evergreen retrospective"
//!
//! [backend]
//! endpoint = "http://localhost:8080/v1/chat/completions"
//! model = "local-writer"
//! api_key_env = "CONCLAVE_API_KEY"
//! ```

use conclave_application::config::EngineConfig;
use conclave_domain::{ExpectedShape, ExpertiseWeightTable, FallbackDocument, Roster, RoleSpec, VoteScale};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Errors converting the raw TOML structure into an engine configuration
#[derive(Error, Debug)]
pub enum FileConfigError {
    #[error("Role '{role}': fallback field '{field}' is not representable as JSON: {reason}")]
    InvalidFallbackValue {
        role: String,
        field: String,
        reason: String,
    },

    #[error("Unknown field type '{0}' in expected_fields. Valid: text, number, bool, list, object, any")]
    UnknownFieldType(String),

    #[error("vote_scale must satisfy min < max, got {min}..{max}")]
    InvalidVoteScale { min: f64, max: f64 },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Discussion engine settings
    pub engine: FileEngineConfig,
    /// Specialist roster, in registration order
    pub roles: Vec<FileRoleConfig>,
    /// Optional text backend; absent means the offline heuristic answers
    pub backend: Option<FileBackendConfig>,
    /// Run artifact output settings
    pub output: FileOutputConfig,
}

/// Engine settings from TOML (`[engine]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    /// Consensus threshold in `[0, 1]`
    pub min_consensus: f64,
    /// Round budget
    pub max_rounds: usize,
    /// Deadline for every external call, in seconds
    pub call_timeout_secs: u64,
    /// Vote scale lower bound
    pub vote_min: f64,
    /// Vote scale upper bound
    pub vote_max: f64,
    /// Optional flat field -> type map every proposal must match
    pub expected_fields: BTreeMap<String, String>,
}

impl Default for FileEngineConfig {
    fn default() -> Self {
        Self {
            min_consensus: 0.75,
            max_rounds: 3,
            call_timeout_secs: 60,
            vote_min: 1.0,
            vote_max: 10.0,
            expected_fields: BTreeMap::new(),
        }
    }
}

/// One specialist role from TOML (`[[roles]]` entry)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRoleConfig {
    /// Unique role name
    pub name: String,
    /// One-sentence focus statement injected into prompts
    pub focus: String,
    /// Fields this role is the authority on
    pub owned_fields: Vec<String>,
    /// Optional critique instruction overriding the default lens
    pub critique_lens: Option<String>,
    /// Per-field expertise weights in `[0, 1]`
    pub weights: BTreeMap<String, f64>,
    /// Static fallback document substituted when this role's calls fail
    pub fallback: BTreeMap<String, toml::Value>,
}

/// Text backend settings from TOML (`[backend]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Chat completions endpoint URL
    pub endpoint: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Environment variable holding the bearer token, if the endpoint
    /// requires one
    pub api_key_env: Option<String>,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/v1/chat/completions".to_string(),
            model: "default".to_string(),
            api_key_env: None,
        }
    }
}

/// Run artifact output settings from TOML (`[output]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Directory session artifacts are written under
    pub artifact_dir: String,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            artifact_dir: "conclave-sessions".to_string(),
        }
    }
}

impl FileConfig {
    /// Convert the raw TOML structure into an [`EngineConfig`].
    ///
    /// Structural problems (bad fallback values, unknown field types) fail
    /// here; semantic problems (empty roster, out-of-range thresholds) fail
    /// later in [`EngineConfig::validate`].
    pub fn into_engine_config(self) -> Result<EngineConfig, FileConfigError> {
        let mut weights = ExpertiseWeightTable::new();
        let mut roles = Vec::with_capacity(self.roles.len());

        for role in self.roles {
            for (field, weight) in &role.weights {
                weights.set(&role.name, field, *weight);
            }

            let mut fallback_fields = BTreeMap::new();
            for (field, value) in role.fallback {
                let json = serde_json::to_value(&value).map_err(|e| {
                    FileConfigError::InvalidFallbackValue {
                        role: role.name.clone(),
                        field: field.clone(),
                        reason: e.to_string(),
                    }
                })?;
                fallback_fields.insert(field, json);
            }

            let mut spec = RoleSpec::new(role.name, role.focus)
                .with_fallback(FallbackDocument::new(fallback_fields));
            for field in role.owned_fields {
                spec = spec.with_owned_field(field);
            }
            if let Some(lens) = role.critique_lens {
                spec = spec.with_critique_lens(lens);
            }
            roles.push(spec);
        }

        let scale = VoteScale::new(self.engine.vote_min, self.engine.vote_max).ok_or(
            FileConfigError::InvalidVoteScale {
                min: self.engine.vote_min,
                max: self.engine.vote_max,
            },
        )?;

        let mut config = EngineConfig::new(Roster::new(roles), weights)
            .with_min_consensus(self.engine.min_consensus)
            .with_max_rounds(self.engine.max_rounds)
            .with_call_timeout(Duration::from_secs(self.engine.call_timeout_secs))
            .with_vote_scale(scale);

        if !self.engine.expected_fields.is_empty() {
            config = config.with_expected_shape(parse_expected_shape(&self.engine.expected_fields)?);
        }

        Ok(config)
    }
}

fn parse_expected_shape(
    fields: &BTreeMap<String, String>,
) -> Result<ExpectedShape, FileConfigError> {
    let mut entries = BTreeMap::new();
    for (name, type_name) in fields {
        let shape = match type_name.as_str() {
            "text" | "string" => ExpectedShape::Text,
            "number" => ExpectedShape::Number,
            "bool" | "boolean" => ExpectedShape::Bool,
            "list" | "array" => ExpectedShape::list(ExpectedShape::Any),
            "object" => ExpectedShape::Object(BTreeMap::new()),
            "any" => ExpectedShape::Any,
            other => return Err(FileConfigError::UnknownFieldType(other.to_string())),
        };
        entries.insert(name.clone(), shape);
    }
    Ok(ExpectedShape::Object(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"
        [engine]
        min_consensus = 0.8
        max_rounds = 2
        call_timeout_secs = 30

        [engine.expected_fields]
        topic = "text"
        scenes = "list"

        [[roles]]
        name = "researcher"
        focus = "Finds source material."
        owned_fields = ["topic"]

        [roles.weights]
        topic = 0.9

        [roles.fallback]
        topic = "evergreen retrospective"

        [[roles]]
        name = "editor"
        focus = "Structures the narrative."
        owned_fields = ["scenes"]
        critique_lens = "Check pacing."

        [backend]
        endpoint = "http://localhost:9999/v1/chat/completions"
        model = "local-writer"
    "#;

    #[test]
    fn test_sample_parses_and_converts() {
        let file: FileConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(file.roles.len(), 2);
        assert_eq!(file.backend.as_ref().unwrap().model, "local-writer");

        let config = file.into_engine_config().unwrap();
        assert_eq!(config.max_rounds, 2);
        assert_eq!(config.min_consensus, 0.8);
        assert_eq!(config.call_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());

        let researcher = config.roster.get("researcher").unwrap();
        assert_eq!(researcher.owned_fields, vec!["topic"]);
        assert_eq!(
            researcher.fallback.instantiate("researcher").fields["topic"],
            json!("evergreen retrospective")
        );
        assert_eq!(config.weights.weight("researcher", "topic"), 0.9);
    }

    #[test]
    fn test_roster_preserves_toml_order() {
        let file: FileConfig = toml::from_str(SAMPLE).unwrap();
        let config = file.into_engine_config().unwrap();
        let names: Vec<_> = config.roster.names().collect();
        assert_eq!(names, vec!["researcher", "editor"]);
    }

    #[test]
    fn test_expected_fields_become_shape() {
        let file: FileConfig = toml::from_str(SAMPLE).unwrap();
        let config = file.into_engine_config().unwrap();
        let shape = config.expected_shape.unwrap();

        assert!(shape.validate(&json!({"topic": "rust", "scenes": ["hook"]})));
        assert!(!shape.validate(&json!({"topic": 42, "scenes": []})));
    }

    #[test]
    fn test_unknown_field_type_rejected() {
        let mut file: FileConfig = toml::from_str(SAMPLE).unwrap();
        file.engine
            .expected_fields
            .insert("broken".to_string(), "tensor".to_string());
        assert!(matches!(
            file.into_engine_config(),
            Err(FileConfigError::UnknownFieldType(_))
        ));
    }

    #[test]
    fn test_degenerate_vote_scale_rejected() {
        let mut file: FileConfig = toml::from_str(SAMPLE).unwrap();
        file.engine.vote_min = 10.0;
        file.engine.vote_max = 10.0;
        assert!(matches!(
            file.into_engine_config(),
            Err(FileConfigError::InvalidVoteScale { .. })
        ));
    }

    #[test]
    fn test_defaults_convert_to_empty_roster() {
        let config = FileConfig::default().into_engine_config().unwrap();
        // Structurally fine; validate() is the one that rejects emptiness.
        assert!(config.roster.is_empty());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nested_fallback_values_survive() {
        let toml_text = r#"
            [[roles]]
            name = "editor"
            focus = "Structures."

            [roles.fallback]
            scenes = [{ caption = "hook", secs = 5 }]
        "#;
        let file: FileConfig = toml::from_str(toml_text).unwrap();
        let config = file.into_engine_config().unwrap();
        let editor = config.roster.get("editor").unwrap();
        assert_eq!(
            editor.fallback.instantiate("editor").fields["scenes"],
            json!([{"caption": "hook", "secs": 5}])
        );
    }
}
