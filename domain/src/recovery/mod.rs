//! Structured response recovery
//!
//! Generative backends are asked for JSON and frequently return almost-JSON:
//! prose-wrapped, markdown-fenced, bare-keyed, placeholder-ridden, or cut off
//! mid-object. This module is the offline part of the recovery pipeline — an
//! ordered ladder of strategies where the first success wins.
//!
//! | # | Strategy | Handles |
//! |---|----------|---------|
//! | 1 | [`RecoveryStrategy::DirectParse`] | well-formed JSON |
//! | 2 | [`RecoveryStrategy::FencedBlock`] | ```` ```json ```` blocks |
//! | 3 | [`RecoveryStrategy::HeuristicCleanup`] | prose wrap, bare keys, comments, placeholders, trailing commas |
//! | 4 | [`RecoveryStrategy::ControlCharStrip`] | stray control bytes |
//! | 5 | [`RecoveryStrategy::TruncationRepair`] | balanced prefix of a cut-off answer |
//!
//! A sixth, AI-assisted repair step exists in the application layer: it costs
//! one bounded backend call, so it cannot live in pure domain code. Its
//! answer is re-parsed with strategies 1-2 only via
//! [`parse_with_primary_strategies`] — the ladder is never recursive.

pub mod strategies;

use crate::document::shape::ExpectedShape;
use serde_json::Value;

/// Which rung of the ladder produced a recovered document
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RecoveryStrategy {
    /// Strategy 1: the raw text parsed as-is
    DirectParse,
    /// Strategy 2: a fenced code block parsed
    FencedBlock,
    /// Strategy 3: cleanup (brace trim, placeholders, bare keys, comments)
    HeuristicCleanup,
    /// Strategy 4: control characters stripped
    ControlCharStrip,
    /// Strategy 5: truncated tail cut at the last balanced position
    TruncationRepair,
    /// Strategy 6: one AI-assisted repair call (application layer)
    AiRepair,
}

impl std::fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecoveryStrategy::DirectParse => "direct-parse",
            RecoveryStrategy::FencedBlock => "fenced-block",
            RecoveryStrategy::HeuristicCleanup => "heuristic-cleanup",
            RecoveryStrategy::ControlCharStrip => "control-char-strip",
            RecoveryStrategy::TruncationRepair => "truncation-repair",
            RecoveryStrategy::AiRepair => "ai-repair",
        };
        write!(f, "{}", name)
    }
}

/// A successfully recovered document plus the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredDocument {
    /// The recovered JSON object
    pub value: Value,
    /// The ladder rung that succeeded
    pub strategy: RecoveryStrategy,
}

/// Run strategies 1-5 against raw backend output.
///
/// A strategy succeeds when its candidate text parses to a JSON object and,
/// if `shape` is given, validates against it. Validation failure on one rung
/// does not stop the ladder — a later rung may still produce a conforming
/// document. Returns `None` when every offline strategy is exhausted.
pub fn recover_offline(raw: &str, shape: Option<&ExpectedShape>) -> Option<RecoveredDocument> {
    let attempts: [(RecoveryStrategy, Option<String>); 5] = [
        (RecoveryStrategy::DirectParse, Some(raw.to_string())),
        (
            RecoveryStrategy::FencedBlock,
            strategies::extract_fenced_block(raw),
        ),
        (RecoveryStrategy::HeuristicCleanup, heuristic_cleanup(raw)),
        (
            RecoveryStrategy::ControlCharStrip,
            Some(strategies::strip_control_chars(raw)),
        ),
        (
            RecoveryStrategy::TruncationRepair,
            strategies::repair_truncation(raw),
        ),
    ];

    for (strategy, candidate) in attempts {
        if let Some(text) = candidate
            && let Some(value) = parse_object(&text, shape)
        {
            return Some(RecoveredDocument { value, strategy });
        }
    }

    None
}

/// Parse an AI-repair answer using strategies 1-2 only.
///
/// Used for the output of the repair call so the ladder never recurses into
/// another repair.
pub fn parse_with_primary_strategies(
    raw: &str,
    shape: Option<&ExpectedShape>,
) -> Option<RecoveredDocument> {
    if let Some(value) = parse_object(raw, shape) {
        return Some(RecoveredDocument {
            value,
            strategy: RecoveryStrategy::AiRepair,
        });
    }
    if let Some(block) = strategies::extract_fenced_block(raw)
        && let Some(value) = parse_object(&block, shape)
    {
        return Some(RecoveredDocument {
            value,
            strategy: RecoveryStrategy::AiRepair,
        });
    }
    None
}

/// Strategy 3: the full cleanup chain over the raw text
fn heuristic_cleanup(raw: &str) -> Option<String> {
    let without_comments = strategies::strip_comments(raw);
    let with_defaults = strategies::replace_placeholders(&without_comments);
    let trimmed = strategies::trim_to_braces(&with_defaults)?;
    let quoted = strategies::quote_bare_keys(trimmed);
    Some(strategies::strip_trailing_commas(&quoted))
}

/// Parse text into a JSON object, optionally validating the shape.
///
/// Proposals are field maps, so non-object JSON (a bare string, a number)
/// counts as a failed parse.
fn parse_object(text: &str, shape: Option<&ExpectedShape>) -> Option<Value> {
    let value: Value = serde_json::from_str(text).ok()?;
    if !value.is_object() {
        return None;
    }
    if let Some(shape) = shape
        && !shape.validate(&value)
    {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_parse() {
        let recovered = recover_offline(r#"{"title": "Clean"}"#, None).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::DirectParse);
        assert_eq!(recovered.value, json!({"title": "Clean"}));
    }

    #[test]
    fn test_fenced_block() {
        let raw = "Here you go:\n```json\n{\"title\": \"Fenced\"}\n```\nLet me know!";
        let recovered = recover_offline(raw, None).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::FencedBlock);
        assert_eq!(recovered.value, json!({"title": "Fenced"}));
    }

    #[test]
    fn test_heuristic_cleanup_bare_keys_and_prose() {
        let raw = r#"Sure, here is the document: {title: "Loose", scenes: ["a", "b",],}"#;
        let recovered = recover_offline(raw, None).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::HeuristicCleanup);
        assert_eq!(recovered.value, json!({"title": "Loose", "scenes": ["a", "b"]}));
    }

    #[test]
    fn test_heuristic_cleanup_placeholders_and_comments() {
        let raw = r#"{
            "title": <text>, // fill in later
            "duration_secs": <number>,
            "topic": {{topic}}
        }"#;
        let recovered = recover_offline(raw, None).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::HeuristicCleanup);
        assert_eq!(
            recovered.value,
            json!({"title": "", "duration_secs": 0, "topic": ""})
        );
    }

    #[test]
    fn test_control_char_strip() {
        let raw = "{\"title\":\u{0002} \"Dirty\"}";
        let recovered = recover_offline(raw, None).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::ControlCharStrip);
        assert_eq!(recovered.value, json!({"title": "Dirty"}));
    }

    #[test]
    fn test_truncation_repair() {
        // Strategy 3's brace trim keeps the stray '}' so it fails; the
        // balanced-prefix scan recovers the leading object.
        let raw = r#"{"title": "Cut"} oops} {"partial":"#;
        let recovered = recover_offline(raw, None).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::TruncationRepair);
        assert_eq!(recovered.value, json!({"title": "Cut"}));
    }

    #[test]
    fn test_exhausted_ladder() {
        assert!(recover_offline("I cannot answer that question.", None).is_none());
        assert!(recover_offline("", None).is_none());
    }

    #[test]
    fn test_non_object_json_rejected() {
        assert!(recover_offline(r#""just a string""#, None).is_none());
        assert!(recover_offline("42", None).is_none());
    }

    #[test]
    fn test_shape_validation_fails_rung() {
        let shape = ExpectedShape::object([("title", ExpectedShape::Text)]);
        // Parses directly but misses the required key
        assert!(recover_offline(r#"{"other": 1}"#, Some(&shape)).is_none());
        // Parses directly and conforms
        let recovered = recover_offline(r#"{"title": "ok"}"#, Some(&shape)).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::DirectParse);
    }

    #[test]
    fn test_shape_checked_on_winning_rung() {
        let shape = ExpectedShape::object([("title", ExpectedShape::Text)]);

        let raw = "```json\n{\"title\": \"Inner\"}\n```";
        let recovered = recover_offline(raw, Some(&shape)).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::FencedBlock);

        // Same rung, non-conforming payload: treated as a failed parse.
        let bad = "```json\n{\"other\": 1}\n```";
        assert!(recover_offline(bad, Some(&shape)).is_none());
    }

    #[test]
    fn test_primary_strategies_direct() {
        let recovered = parse_with_primary_strategies(r#"{"fixed": true}"#, None).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::AiRepair);
    }

    #[test]
    fn test_primary_strategies_fenced() {
        let raw = "```\n{\"fixed\": true}\n```";
        let recovered = parse_with_primary_strategies(raw, None).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::AiRepair);
    }

    #[test]
    fn test_primary_strategies_no_cleanup() {
        // Bare keys are a strategy-3 concern — the repair answer does not get
        // another trip down the ladder.
        assert!(parse_with_primary_strategies(r#"{fixed: true}"#, None).is_none());
    }
}
