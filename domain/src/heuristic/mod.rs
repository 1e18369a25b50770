//! Fallback heuristic policy
//!
//! A pure, offline rule table used whenever no generative backend is
//! configured or a caller has exhausted its fallback budget. Identical
//! inputs always yield the identical decision triple, so this module is
//! fully testable without network access.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Publication channel the content is destined for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetChannel {
    /// Vertical short-form (under ~90 seconds)
    Shorts,
    /// Standard long-form
    Longform,
    /// Audio-first
    Podcast,
}

#[derive(Debug, Error)]
#[error("Unknown target channel: {0}. Valid: shorts, longform, podcast")]
pub struct ParseChannelError(String);

impl std::str::FromStr for TargetChannel {
    type Err = ParseChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shorts" | "short" => Ok(TargetChannel::Shorts),
            "longform" | "long" | "standard" => Ok(TargetChannel::Longform),
            "podcast" | "audio" => Ok(TargetChannel::Podcast),
            _ => Err(ParseChannelError(s.to_string())),
        }
    }
}

/// Coarse content category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    News,
    Tutorial,
    Entertainment,
    Commentary,
}

impl std::str::FromStr for ContentCategory {
    type Err = ParseChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "news" => Ok(ContentCategory::News),
            "tutorial" | "howto" | "education" => Ok(ContentCategory::Tutorial),
            "entertainment" => Ok(ContentCategory::Entertainment),
            "commentary" | "opinion" => Ok(ContentCategory::Commentary),
            _ => Err(ParseChannelError(s.to_string())),
        }
    }
}

/// Coarse observable inputs the rule table is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservableInputs {
    pub channel: TargetChannel,
    pub duration_secs: u32,
    pub category: ContentCategory,
}

/// Deterministic decision from the rule table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeuristicDecision {
    /// The decided content treatment
    pub decision: String,
    /// Fixed confidence attached to the matched rule
    pub confidence: f64,
    /// Which rule fired and why
    pub reason: String,
}

/// Decide a content treatment from coarse observable inputs.
///
/// Pure rule table: channel first, then duration bucket, then category. No
/// external call is ever made here.
pub fn decide(inputs: &ObservableInputs) -> HeuristicDecision {
    let (decision, confidence, reason): (&str, f64, &str) = match inputs.channel {
        TargetChannel::Shorts => match inputs.category {
            ContentCategory::News => (
                "fast-cut vertical with headline overlay and bold captions",
                0.6,
                "shorts/news: headline-first treatment retains viewers",
            ),
            ContentCategory::Tutorial => (
                "single-take vertical demo with step captions",
                0.55,
                "shorts/tutorial: one concrete step per short",
            ),
            _ => (
                "hook-first vertical cut with auto captions",
                0.5,
                "shorts default: hook within the first two seconds",
            ),
        },
        TargetChannel::Longform if inputs.duration_secs <= 300 => match inputs.category {
            ContentCategory::Tutorial => (
                "screen-capture walkthrough with chapter markers",
                0.6,
                "short longform tutorial: walkthrough format",
            ),
            _ => (
                "narrated montage with b-roll and lower thirds",
                0.5,
                "short longform default: narrated montage",
            ),
        },
        TargetChannel::Longform => (
            "chaptered deep-dive with interview segments",
            0.55,
            "extended longform: chaptering keeps retention measurable",
        ),
        TargetChannel::Podcast => match inputs.category {
            ContentCategory::Commentary => (
                "two-voice discussion with timestamped segments",
                0.6,
                "podcast/commentary: dialogue format",
            ),
            _ => (
                "single-narrator episode with intro and outro beds",
                0.5,
                "podcast default: single narrator",
            ),
        },
    };

    HeuristicDecision {
        decision: decision.to_string(),
        confidence,
        reason: reason.to_string(),
    }
}
