//! Vote scores and consensus level
//!
//! During the VOTE phase each role returns a numeric score on a declared
//! scale plus reasoning, extracted from free-form text. The consensus level
//! is the mean score divided by the scale maximum — a normalized agreement
//! figure in `[0, 1]` that drives CONSENSUS_CHECK.

use serde::{Deserialize, Serialize};

/// Declared bounds for vote scores
///
/// # Example
///
/// ```
/// use conclave_domain::VoteScale;
///
/// let scale = VoteScale::default(); // 1..=10
/// assert_eq!(scale.clamp(15.0), 10.0);
/// assert_eq!(scale.midpoint(), 5.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoteScale {
    /// Lowest admissible score
    pub min: f64,
    /// Highest admissible score
    pub max: f64,
}

impl Default for VoteScale {
    fn default() -> Self {
        Self { min: 1.0, max: 10.0 }
    }
}

impl VoteScale {
    /// Construct a scale; returns `None` unless `min < max`
    pub fn new(min: f64, max: f64) -> Option<Self> {
        (min < max).then_some(Self { min, max })
    }

    /// Clamp a raw score into the scale bounds
    pub fn clamp(&self, score: f64) -> f64 {
        score.clamp(self.min, self.max)
    }

    /// Neutral score, substituted when a role's vote call fails
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// One role's scored vote for a round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsensusVote {
    /// Voting role
    pub role: String,
    /// Score on the declared scale
    pub score: f64,
    /// Reasoning or feedback from this role
    pub reasoning: String,
    /// Whether this vote was substituted because the live call failed
    #[serde(default)]
    pub from_fallback: bool,
}

impl ConsensusVote {
    pub fn new(role: impl Into<String>, score: f64, reasoning: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            score,
            reasoning: reasoning.into(),
            from_fallback: false,
        }
    }

    /// Neutral substitute vote for a failed call
    pub fn fallback(role: impl Into<String>, scale: &VoteScale) -> Self {
        Self {
            role: role.into(),
            score: scale.midpoint(),
            reasoning: "vote call failed; neutral score substituted".to_string(),
            from_fallback: true,
        }
    }
}

/// Normalized consensus level for a set of votes: `mean(scores) / scale.max`
///
/// Returns `0.0` for an empty vote set — no votes is no agreement.
pub fn consensus_level(votes: &[ConsensusVote], scale: &VoteScale) -> f64 {
    if votes.is_empty() {
        return 0.0;
    }
    let mean = votes.iter().map(|v| v.score).sum::<f64>() / votes.len() as f64;
    (mean / scale.max).clamp(0.0, 1.0)
}

/// Extract a vote score from a free-form voting response.
///
/// Supported formats, in order of preference:
/// 1. JSON: `{"score": 8, "reasoning": "..."}`
/// 2. Fraction: `8/10` or `Score: 7/10`
/// 3. Standalone in-range number: `9`
///
/// Scores are clamped to the scale; an unparseable response yields the scale
/// midpoint (neutral).
pub fn parse_vote_response(response: &str, scale: &VoteScale) -> (f64, String) {
    // Try to find JSON in the response
    if let Some(start) = response.find('{')
        && let Some(end) = response[start..].rfind('}')
    {
        let json_str = &response[start..start + end + 1];
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(json_str)
            && let Some(score) = parsed.get("score").and_then(|v| v.as_f64())
        {
            let reasoning = parsed
                .get("reasoning")
                .and_then(|v| v.as_str())
                .unwrap_or(response)
                .to_string();
            return (scale.clamp(score), reasoning);
        }
    }

    // Fallback: scan for "N/max" fractions or standalone in-range numbers
    let max_suffix = format!("/{}", scale.max as i64);
    for word in response.split_whitespace() {
        if let Some(num_str) = word.strip_suffix(max_suffix.as_str())
            && let Ok(num) = num_str.parse::<f64>()
        {
            return (scale.clamp(num), response.to_string());
        }
        if let Ok(num) = word
            .trim_matches(|c: char| !c.is_ascii_digit() && c != '.')
            .parse::<f64>()
            && num >= scale.min
            && num <= scale.max
        {
            return (num, response.to_string());
        }
    }

    // Neutral midpoint when nothing score-like is present
    (scale.midpoint(), response.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten() -> VoteScale {
        VoteScale::default()
    }

    #[test]
    fn test_parse_json_vote() {
        let (score, reasoning) =
            parse_vote_response(r#"{"score": 8, "reasoning": "Strong structure"}"#, &ten());
        assert_eq!(score, 8.0);
        assert_eq!(reasoning, "Strong structure");
    }

    #[test]
    fn test_parse_fenced_json_vote() {
        let response = "My evaluation:\n```json\n{\"score\": 7, \"reasoning\": \"Solid\"}\n```";
        let (score, _) = parse_vote_response(response, &ten());
        assert_eq!(score, 7.0);
    }

    #[test]
    fn test_parse_fraction_vote() {
        let (score, _) = parse_vote_response("I rate this 8/10 overall", &ten());
        assert_eq!(score, 8.0);
        let (score, _) = parse_vote_response("Score: 6/10", &ten());
        assert_eq!(score, 6.0);
    }

    #[test]
    fn test_parse_standalone_number() {
        let (score, _) = parse_vote_response("My score is 9", &ten());
        assert_eq!(score, 9.0);
    }

    #[test]
    fn test_parse_clamps_to_scale() {
        let (score, _) = parse_vote_response(r#"{"score": 15}"#, &ten());
        assert_eq!(score, 10.0);
        let (score, _) = parse_vote_response(r#"{"score": -3}"#, &ten());
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_parse_failure_yields_midpoint() {
        let (score, _) = parse_vote_response("No numbers here at all", &ten());
        assert_eq!(score, 5.5);
        let (score, _) = parse_vote_response("", &ten());
        assert_eq!(score, 5.5);
    }

    #[test]
    fn test_consensus_level_mean_over_max() {
        let votes = vec![
            ConsensusVote::new("a", 8.0, ""),
            ConsensusVote::new("b", 9.0, ""),
            ConsensusVote::new("c", 7.0, ""),
        ];
        assert_eq!(consensus_level(&votes, &ten()), 0.8);
    }

    #[test]
    fn test_consensus_level_empty_votes() {
        assert_eq!(consensus_level(&[], &ten()), 0.0);
    }

    #[test]
    fn test_fallback_vote_is_neutral() {
        let vote = ConsensusVote::fallback("editor", &ten());
        assert_eq!(vote.score, 5.5);
        assert!(vote.from_fallback);
    }

    #[test]
    fn test_scale_validation() {
        assert!(VoteScale::new(0.0, 5.0).is_some());
        assert!(VoteScale::new(5.0, 5.0).is_none());
        assert!(VoteScale::new(7.0, 2.0).is_none());
    }
}
