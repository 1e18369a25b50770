//! Prompt templates for each discussion phase
//!
//! The shared round context is rendered once per round and passed to every
//! per-role template by reference, so prompt size stays bounded no matter
//! how many specialists join the round.

use crate::document::shape::ExpectedShape;
use crate::role::RoleSpec;

/// Templates for generating prompts at each phase
pub struct PromptTemplate;

impl PromptTemplate {
    /// PROPOSE: ask one specialist for its partial document
    pub fn propose(role: &RoleSpec, shared_context: &str) -> String {
        let owned = if role.owned_fields.is_empty() {
            "any fields you consider essential".to_string()
        } else {
            role.owned_fields.join(", ")
        };
        format!(
            r#"You are the {name} specialist. {focus}

Shared context for this round:
{shared_context}

Propose your part of the content plan. Respond with ONLY a JSON object.
Focus on the fields you own: {owned}. You may include other fields if you
have a strong opinion about them."#,
            name = role.name,
            focus = role.focus,
            shared_context = shared_context,
            owned = owned,
        )
    }

    /// CRITIQUE: ask one specialist to critique the round's proposals
    pub fn critique(role: &RoleSpec, shared_context: &str, proposals_digest: &str) -> String {
        let lens = role
            .critique_lens
            .as_deref()
            .unwrap_or("Evaluate accuracy, completeness, and internal consistency.");
        format!(
            r#"You are the {name} specialist reviewing this round's proposals. {focus}

Shared context for this round:
{shared_context}

Proposals under review:
{proposals_digest}

{lens}

Point out concrete problems and concrete improvements, two or three sentences
each. Do not rewrite the proposals wholesale."#,
            name = role.name,
            focus = role.focus,
            shared_context = shared_context,
            proposals_digest = proposals_digest,
            lens = lens,
        )
    }

    /// SYNTHESIZE: condense the round's messages into at most `limit` insights
    pub fn synthesize(messages_digest: &str, limit: usize) -> String {
        format!(
            r#"Condense the discussion below into at most {limit} new insights.
An insight is one sentence capturing a point of agreement, a resolved
disagreement, or a concrete improvement to carry forward.

Discussion:
{messages_digest}

Respond with ONLY a JSON object: {{"insights": ["...", "..."]}}"#,
            limit = limit,
            messages_digest = messages_digest,
        )
    }

    /// VOTE: ask one specialist to score the merged round outcome
    pub fn vote(role: &RoleSpec, merged_digest: &str, scale_min: f64, scale_max: f64) -> String {
        format!(
            r#"You are the {name} specialist. {focus}

Merged plan for this round:
{merged_digest}

Score how ready this plan is to ship, from {min} (unusable) to {max}
(ship as-is), considering only your area of expertise.

Respond with ONLY a JSON object: {{"score": <number>, "reasoning": "..."}}"#,
            name = role.name,
            focus = role.focus,
            merged_digest = merged_digest,
            min = scale_min,
            max = scale_max,
        )
    }

    /// FINALIZE: produce the decision text from insights and votes
    pub fn finalize(merged_digest: &str, insights: &[String], votes_digest: &str) -> String {
        let insights_block = if insights.is_empty() {
            "(none recorded)".to_string()
        } else {
            insights
                .iter()
                .map(|i| format!("- {}", i))
                .collect::<Vec<_>>()
                .join("\n")
        };
        format!(
            r#"The specialist discussion has concluded. Produce the final decision.

Final merged plan:
{merged_digest}

Accumulated insights:
{insights_block}

Final votes:
{votes_digest}

Write the decision as two or three sentences: what will be produced, in what
treatment, and the one constraint that matters most. Plain text only."#,
            merged_digest = merged_digest,
            insights_block = insights_block,
            votes_digest = votes_digest,
        )
    }

    /// Repair prompt for the one AI-assisted recovery attempt
    pub fn repair(broken_text: &str, shape: Option<&ExpectedShape>) -> String {
        let shape_hint = match shape {
            Some(shape) => format!("It must match this outline: {}\n", shape.outline()),
            None => String::new(),
        };
        format!(
            r#"The following text was supposed to be a single JSON object but is
malformed. Reconstruct the intended JSON object. {shape_hint}
Respond with ONLY the corrected JSON, no explanation.

Broken text:
{broken_text}"#,
            shape_hint = shape_hint,
            broken_text = broken_text,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::RoleSpec;

    fn editor() -> RoleSpec {
        RoleSpec::new("editor", "Structures the narrative.")
            .with_owned_field("title")
            .with_owned_field("scenes")
    }

    #[test]
    fn test_propose_names_owned_fields() {
        let prompt = PromptTemplate::propose(&editor(), "topic: rust lifetimes");
        assert!(prompt.contains("editor specialist"));
        assert!(prompt.contains("title, scenes"));
        assert!(prompt.contains("topic: rust lifetimes"));
    }

    #[test]
    fn test_critique_uses_lens_when_present() {
        let role = editor().with_critique_lens("Check pacing above all.");
        let prompt = PromptTemplate::critique(&role, "ctx", "digest");
        assert!(prompt.contains("Check pacing above all."));

        let plain = PromptTemplate::critique(&editor(), "ctx", "digest");
        assert!(plain.contains("internal consistency"));
    }

    #[test]
    fn test_vote_carries_scale_bounds() {
        let prompt = PromptTemplate::vote(&editor(), "digest", 1.0, 10.0);
        assert!(prompt.contains("from 1 (unusable) to 10"));
    }

    #[test]
    fn test_repair_includes_shape_outline() {
        let shape = ExpectedShape::object([("title", ExpectedShape::Text)]);
        let prompt = PromptTemplate::repair("{broken", Some(&shape));
        assert!(prompt.contains(r#"{"title": text}"#));
        assert!(prompt.contains("{broken"));

        let without = PromptTemplate::repair("{broken", None);
        assert!(!without.contains("outline"));
    }
}
