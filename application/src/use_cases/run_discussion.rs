//! Round-based discussion use case
//!
//! Drives propose, critique, synthesize, vote, and consensus-check across
//! bounded rounds, then finalizes. Every phase completes even under total
//! backend outage: failed calls are substituted with the affected role's
//! fallback message or score, so the machine always reaches TERMINATED
//! within the round budget.
//!
//! The external call budget is exact and testable: each round spends one
//! call per role for propose, critique, and vote, plus one synthesize call;
//! finalize spends one more. See [`expected_backend_calls`].

use crate::bounded_call::{BoundedExecutor, CallRequest};
use crate::config::{ConfigError, EngineConfig};
use crate::ports::artifact_store::ArtifactStore;
use crate::ports::progress::ProgressNotifier;
use crate::ports::text_backend::TextBackend;
use crate::use_cases::generate_proposals::ProposalGenerator;
use conclave_domain::{
    ConsensusResult, ConsensusVote, DiscussionPhase, DiscussionState, MergedDocument,
    ProposalDocument, PromptTemplate, RoleSpec, aggregate, consensus_level, parse_vote_response,
};
use conclave_domain::consensus::state::MAX_INSIGHTS_PER_ROUND;
use conclave_domain::recovery;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Exact number of backend calls a full discussion run spends.
///
/// Per round: one propose, one critique, and one vote call per participant,
/// plus one synthesize call. Finalize adds one. Recovery repair calls are
/// extra and only spent on malformed responses.
pub fn expected_backend_calls(rounds: usize, participants: usize) -> usize {
    rounds * (3 * participants + 1) + 1
}

/// Errors that can abort a discussion run
///
/// Backend flakiness is never one of them — flaky calls are absorbed by
/// fallbacks inside each phase.
#[derive(Error, Debug)]
pub enum RunDiscussionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Discussion cancelled")]
    Cancelled,
}

/// Input for one discussion run
#[derive(Debug, Clone)]
pub struct DiscussionInput {
    /// What the specialists are deciding about
    pub topic: String,
}

impl DiscussionInput {
    pub fn new(topic: impl Into<String>) -> Self {
        Self { topic: topic.into() }
    }
}

/// Use case for running one full discussion to consensus
pub struct RunDiscussionUseCase<B: TextBackend + 'static> {
    backend: Arc<B>,
    config: Arc<EngineConfig>,
    cancellation_token: Option<CancellationToken>,
}

impl<B: TextBackend + 'static> RunDiscussionUseCase<B> {
    pub fn new(backend: Arc<B>, config: Arc<EngineConfig>) -> Self {
        Self {
            backend,
            config,
            cancellation_token: None,
        }
    }

    /// Attach a cancellation token; in-flight phase tasks are aborted on
    /// cancel.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Run the discussion to TERMINATED.
    ///
    /// Always returns a [`ConsensusResult`] unless the configuration is
    /// invalid or the run is cancelled.
    pub async fn execute(
        &self,
        input: DiscussionInput,
        progress: &dyn ProgressNotifier,
        artifacts: &dyn ArtifactStore,
    ) -> Result<ConsensusResult, RunDiscussionError> {
        self.config.validate()?;

        let participants = self.config.roster.len();
        info!(
            topic = %input.topic,
            participants,
            max_rounds = self.config.max_rounds,
            min_consensus = self.config.min_consensus,
            "discussion initialized"
        );

        let mut state = DiscussionState::new(self.config.max_rounds, self.config.min_consensus);
        let generator = ProposalGenerator::new(Arc::clone(&self.backend), Arc::clone(&self.config));

        let result = loop {
            self.check_cancelled()?;
            let round = state.round;

            // Rendered once per round; every per-role prompt borrows it.
            let shared_context = Arc::new(self.render_shared_context(&input.topic, &state));

            // PROPOSE
            progress.on_phase_start(&DiscussionPhase::Propose, participants);
            let proposals = generator.generate(&shared_context).await;
            for proposal in &proposals {
                progress.on_task_complete(
                    &DiscussionPhase::Propose,
                    &proposal.role,
                    !proposal.from_fallback,
                );
                state.push_message(
                    DiscussionPhase::Propose,
                    &proposal.role,
                    digest_proposal(proposal),
                );
            }
            let merged = aggregate(&proposals, &self.config.weights);
            progress.on_phase_complete(&DiscussionPhase::Propose);

            // CRITIQUE
            let proposals_digest = proposals
                .iter()
                .map(digest_proposal)
                .collect::<Vec<_>>()
                .join("\n");
            let critiques = self
                .phase_critique(&shared_context, &proposals_digest, progress)
                .await?;
            for (role, critique) in critiques {
                state.push_message(DiscussionPhase::Critique, &role, critique);
            }

            // SYNTHESIZE
            let insights = self.phase_synthesize(&state, progress).await;
            state.append_insights(insights);

            // VOTE
            let merged_digest = serde_json::to_string_pretty(&merged.to_json())
                .unwrap_or_else(|_| "{}".to_string());
            let votes = self.phase_vote(&merged_digest, progress).await?;
            state.consensus_level = consensus_level(&votes, &self.config.vote_scale);
            state.last_votes = votes;

            // CONSENSUS_CHECK
            let next = state.consensus_check();
            progress.on_consensus_level(round, state.consensus_level);
            info!(
                round,
                consensus_level = state.consensus_level,
                next = %next,
                "consensus check"
            );
            if next == DiscussionPhase::Finalize {
                // FINALIZE
                self.check_cancelled()?;
                break self.phase_finalize(&state, merged, progress).await;
            }
        };

        self.persist_artifact(&result, artifacts).await;
        info!(
            rounds_taken = result.rounds_taken,
            consensus_level = result.consensus_level,
            "discussion terminated"
        );
        Ok(result)
    }

    /// Shared per-round context: topic plus the bounded insight log
    fn render_shared_context(&self, topic: &str, state: &DiscussionState) -> String {
        if state.insights().is_empty() {
            format!("Topic: {}\nRound: {}", topic, state.round)
        } else {
            format!(
                "Topic: {}\nRound: {}\nInsights so far:\n{}",
                topic,
                state.round,
                state
                    .insights()
                    .iter()
                    .map(|i| format!("- {}", i))
                    .collect::<Vec<_>>()
                    .join("\n")
            )
        }
    }

    /// CRITIQUE: one bounded call per role, fallback message on failure
    async fn phase_critique(
        &self,
        shared_context: &Arc<String>,
        proposals_digest: &str,
        progress: &dyn ProgressNotifier,
    ) -> Result<Vec<(String, String)>, RunDiscussionError> {
        progress.on_phase_start(&DiscussionPhase::Critique, self.config.roster.len());

        let mut join_set = JoinSet::new();
        for role in self.config.roster.roles() {
            let backend = Arc::clone(&self.backend);
            let role = role.clone();
            let context = Arc::clone(shared_context);
            let digest = proposals_digest.to_string();
            let timeout = self.config.call_timeout;

            join_set.spawn(async move {
                let executor = BoundedExecutor::new(backend);
                let request = CallRequest::new(
                    format!("critique/{}", role.name),
                    PromptTemplate::critique(&role, &context, &digest),
                    timeout,
                )
                .with_fallback(fallback_critique(&role));
                let result = executor.execute(&request).await;
                (role.name, result)
            });
        }

        let mut critiques = Vec::new();
        while let Some(joined) = self.join_next_or_cancel(&mut join_set).await? {
            match joined {
                Ok((role, result)) => {
                    progress.on_task_complete(&DiscussionPhase::Critique, &role, result.is_live());
                    critiques.push((role, result.text));
                }
                Err(join_error) => warn!("critique task join error: {}", join_error),
            }
        }

        progress.on_phase_complete(&DiscussionPhase::Critique);
        Ok(critiques)
    }

    /// SYNTHESIZE: one bounded call condensing the round into insights
    async fn phase_synthesize(
        &self,
        state: &DiscussionState,
        progress: &dyn ProgressNotifier,
    ) -> Vec<String> {
        progress.on_phase_start(&DiscussionPhase::Synthesize, 1);

        let messages_digest = state
            .current_round_messages()
            .map(|m| format!("[{}] {}: {}", m.phase, m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let executor = BoundedExecutor::new(Arc::clone(&self.backend));
        let request = CallRequest::new(
            "synthesize",
            PromptTemplate::synthesize(&messages_digest, MAX_INSIGHTS_PER_ROUND),
            self.config.call_timeout,
        );
        let result = executor.execute(&request).await;
        progress.on_task_complete(&DiscussionPhase::Synthesize, "moderator", result.is_live());
        progress.on_phase_complete(&DiscussionPhase::Synthesize);

        if !result.is_usable() {
            warn!("synthesize call failed; carrying no new insights this round");
            return Vec::new();
        }

        let insights = recovery::recover_offline(&result.text, None)
            .and_then(|recovered| {
                recovered.value.get("insights").and_then(|v| {
                    v.as_array().map(|items| {
                        items
                            .iter()
                            .filter_map(|item| item.as_str().map(str::to_string))
                            .collect::<Vec<_>>()
                    })
                })
            })
            .unwrap_or_default();
        debug!(count = insights.len(), "insights synthesized");
        insights
    }

    /// VOTE: one bounded call per role; failed calls vote the midpoint
    async fn phase_vote(
        &self,
        merged_digest: &str,
        progress: &dyn ProgressNotifier,
    ) -> Result<Vec<ConsensusVote>, RunDiscussionError> {
        progress.on_phase_start(&DiscussionPhase::Vote, self.config.roster.len());

        let scale = self.config.vote_scale;
        let mut join_set = JoinSet::new();
        for role in self.config.roster.roles() {
            let backend = Arc::clone(&self.backend);
            let role = role.clone();
            let digest = merged_digest.to_string();
            let timeout = self.config.call_timeout;

            join_set.spawn(async move {
                let executor = BoundedExecutor::new(backend);
                let request = CallRequest::new(
                    format!("vote/{}", role.name),
                    PromptTemplate::vote(&role, &digest, scale.min, scale.max),
                    timeout,
                );
                let result = executor.execute(&request).await;
                (role.name, result)
            });
        }

        let mut votes = Vec::new();
        while let Some(joined) = self.join_next_or_cancel(&mut join_set).await? {
            match joined {
                Ok((role, result)) if result.is_live() => {
                    let (score, reasoning) = parse_vote_response(&result.text, &scale);
                    progress.on_task_complete(&DiscussionPhase::Vote, &role, true);
                    votes.push(ConsensusVote::new(role, score, reasoning));
                }
                Ok((role, _)) => {
                    progress.on_task_complete(&DiscussionPhase::Vote, &role, false);
                    votes.push(ConsensusVote::fallback(role, &scale));
                }
                Err(join_error) => warn!("vote task join error: {}", join_error),
            }
        }

        progress.on_phase_complete(&DiscussionPhase::Vote);
        Ok(votes)
    }

    /// FINALIZE: one bounded call for the decision text, with a merged-plan
    /// summary as its fallback so the result is always usable
    async fn phase_finalize(
        &self,
        state: &DiscussionState,
        merged: MergedDocument,
        progress: &dyn ProgressNotifier,
    ) -> ConsensusResult {
        progress.on_phase_start(&DiscussionPhase::Finalize, 1);

        let merged_digest = serde_json::to_string_pretty(&merged.to_json())
            .unwrap_or_else(|_| "{}".to_string());
        let votes_digest = state
            .last_votes
            .iter()
            .map(|v| format!("{}: {} - {}", v.role, v.score, v.reasoning))
            .collect::<Vec<_>>()
            .join("\n");

        let executor = BoundedExecutor::new(Arc::clone(&self.backend));
        let request = CallRequest::new(
            "finalize",
            PromptTemplate::finalize(&merged_digest, state.insights(), &votes_digest),
            self.config.call_timeout,
        )
        .with_fallback(fallback_decision(&merged));
        let result = executor.execute(&request).await;
        progress.on_task_complete(&DiscussionPhase::Finalize, "moderator", result.is_live());
        progress.on_phase_complete(&DiscussionPhase::Finalize);

        ConsensusResult {
            decision: result.text,
            merged,
            consensus_level: state.consensus_level,
            rounds_taken: state.rounds_taken(),
            key_insights: state.insights().to_vec(),
        }
    }

    /// Persist the result once at FINALIZE; store failures are absorbed.
    async fn persist_artifact(&self, result: &ConsensusResult, artifacts: &dyn ArtifactStore) {
        let payload = match serde_json::to_vec_pretty(result) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!("could not serialize consensus result: {}", error);
                return;
            }
        };
        if let Err(error) = artifacts.write_artifact("consensus_result.json", &payload).await {
            warn!("artifact write failed: {}", error);
        }
    }

    /// Await the next task, racing the cancellation token
    async fn join_next_or_cancel<T: 'static>(
        &self,
        join_set: &mut JoinSet<T>,
    ) -> Result<Option<Result<T, tokio::task::JoinError>>, RunDiscussionError> {
        if let Some(token) = &self.cancellation_token {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    join_set.abort_all();
                    Err(RunDiscussionError::Cancelled)
                }
                joined = join_set.join_next() => Ok(joined),
            }
        } else {
            Ok(join_set.join_next().await)
        }
    }

    fn check_cancelled(&self) -> Result<(), RunDiscussionError> {
        match &self.cancellation_token {
            Some(token) if token.is_cancelled() => Err(RunDiscussionError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Digest one proposal for critique prompts and round messages
fn digest_proposal(proposal: &ProposalDocument) -> String {
    let origin = if proposal.from_fallback {
        " (fallback)"
    } else {
        ""
    };
    format!(
        "--- {}{} ---\n{}",
        proposal.role,
        origin,
        serde_json::to_string(&proposal.fields).unwrap_or_else(|_| "{}".to_string())
    )
}

/// Substitute critique when a role's call fails
fn fallback_critique(role: &RoleSpec) -> String {
    format!("({}: no critique available, call failed)", role.name)
}

/// Substitute decision text when the finalize call fails
fn fallback_decision(merged: &MergedDocument) -> String {
    let fields = merged
        .fields
        .keys()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Proceed with the merged plan as aggregated ({} fields: {}).",
        merged.fields.len(),
        fields
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::artifact_store::NoopArtifactStore;
    use crate::ports::progress::NoProgress;
    use crate::test_support::{Script, ScriptedBackend};
    use conclave_domain::{ExpertiseWeightTable, FallbackDocument, Roster, RoleSpec};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn fallback(fields: &[(&str, serde_json::Value)]) -> FallbackDocument {
        let mut map = BTreeMap::new();
        for (k, v) in fields {
            map.insert(k.to_string(), v.clone());
        }
        FallbackDocument::new(map)
    }

    fn three_role_roster() -> Roster {
        Roster::new(vec![
            RoleSpec::new("researcher", "Finds source material")
                .with_owned_field("topic")
                .with_fallback(fallback(&[("topic", json!("fallback topic"))])),
            RoleSpec::new("editor", "Structures the narrative")
                .with_owned_field("title")
                .with_critique_lens("Check pacing and structure.")
                .with_fallback(fallback(&[("title", json!("fallback title"))])),
            RoleSpec::new("stylist", "Owns tone and visual style")
                .with_owned_field("style")
                .with_fallback(fallback(&[("style", json!("fallback style"))])),
        ])
    }

    fn weights() -> ExpertiseWeightTable {
        let mut table = ExpertiseWeightTable::new();
        table.set("researcher", "topic", 0.9);
        table.set("editor", "title", 0.9);
        table.set("stylist", "style", 0.9);
        table
    }

    /// Scripted happy-path handler: every phase answers something parseable.
    fn cooperative_handler(prompt: &str) -> Script {
        if prompt.contains("Propose your part") {
            if prompt.contains("researcher specialist") {
                Script::Reply(r#"{"topic": "live topic"}"#.into())
            } else if prompt.contains("editor specialist") {
                Script::Reply(r#"{"title": "live title"}"#.into())
            } else {
                Script::Reply(r#"{"style": "live style"}"#.into())
            }
        } else if prompt.contains("reviewing this round's proposals") {
            Script::Reply("The plan is coherent but the hook is weak.".into())
        } else if prompt.contains("Condense the discussion") {
            Script::Reply(r#"{"insights": ["Strengthen the hook", "Keep the runtime short"]}"#.into())
        } else if prompt.contains("Score how ready") {
            Script::Reply(r#"{"score": 6, "reasoning": "Workable but not polished"}"#.into())
        } else {
            Script::Reply("Ship the short with a stronger hook and tight captions.".into())
        }
    }

    fn run_config(max_rounds: usize, min_consensus: f64) -> Arc<EngineConfig> {
        Arc::new(
            EngineConfig::new(three_role_roster(), weights())
                .with_max_rounds(max_rounds)
                .with_min_consensus(min_consensus)
                .with_call_timeout(std::time::Duration::from_secs(5)),
        )
    }

    #[tokio::test]
    async fn test_bounded_termination_and_exact_call_budget() {
        // Unreachable threshold: the round budget must stop the machine.
        let backend = Arc::new(ScriptedBackend::with_handler(cooperative_handler));
        let use_case = RunDiscussionUseCase::new(Arc::clone(&backend), run_config(2, 0.99));

        let result = use_case
            .execute(DiscussionInput::new("rust shorts"), &NoProgress, &NoopArtifactStore)
            .await
            .unwrap();

        assert_eq!(result.rounds_taken, 2);
        assert_eq!(backend.calls(), expected_backend_calls(2, 3));
        // score 6 on the default 1..10 scale
        assert!((result.consensus_level - 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_early_consensus_stops_after_one_round() {
        let backend = Arc::new(ScriptedBackend::with_handler(|prompt| {
            if prompt.contains("Score how ready") {
                Script::Reply(r#"{"score": 9, "reasoning": "Ready"}"#.into())
            } else {
                cooperative_handler(prompt)
            }
        }));
        let use_case = RunDiscussionUseCase::new(Arc::clone(&backend), run_config(4, 0.8));

        let result = use_case
            .execute(DiscussionInput::new("rust shorts"), &NoProgress, &NoopArtifactStore)
            .await
            .unwrap();

        assert_eq!(result.rounds_taken, 1);
        assert_eq!(backend.calls(), expected_backend_calls(1, 3));
        assert!(result.consensus_level >= 0.8);
    }

    #[tokio::test]
    async fn test_total_outage_of_one_role_is_absorbed() {
        // The stylist never answers; its owned field must still reach the
        // merged document via its fallback, and no error may escape.
        let backend = Arc::new(ScriptedBackend::with_handler(|prompt| {
            if prompt.contains("stylist specialist") {
                Script::Fail("stylist offline".into())
            } else {
                cooperative_handler(prompt)
            }
        }));
        let use_case = RunDiscussionUseCase::new(backend, run_config(1, 0.99));

        let result = use_case
            .execute(DiscussionInput::new("rust shorts"), &NoProgress, &NoopArtifactStore)
            .await
            .unwrap();

        assert_eq!(result.merged.get("style"), Some(&json!("fallback style")));
        assert_eq!(result.merged.winner("style"), Some("stylist"));
        assert!(result.merged.provenance["style"].from_fallback);
        // Live roles won their own fields
        assert_eq!(result.merged.get("topic"), Some(&json!("live topic")));
    }

    #[tokio::test]
    async fn test_total_backend_outage_still_terminates() {
        let backend = Arc::new(ScriptedBackend::always(Script::Fail("everything down".into())));
        let use_case = RunDiscussionUseCase::new(Arc::clone(&backend), run_config(2, 0.9));

        let result = use_case
            .execute(DiscussionInput::new("rust shorts"), &NoProgress, &NoopArtifactStore)
            .await
            .unwrap();

        // Midpoint votes (5.5/10) never reach 0.9, so the budget stops it.
        assert_eq!(result.rounds_taken, 2);
        assert!((result.consensus_level - 0.55).abs() < 1e-9);
        // Finalize fell back to the merged-plan summary.
        assert!(result.decision.contains("merged plan"));
        // All three fallback documents made it through.
        for field in ["topic", "title", "style"] {
            assert!(result.merged.get(field).is_some());
        }
    }

    #[tokio::test]
    async fn test_insights_accumulate_across_rounds() {
        let backend = Arc::new(ScriptedBackend::with_handler(cooperative_handler));
        let use_case = RunDiscussionUseCase::new(backend, run_config(2, 0.99));

        let result = use_case
            .execute(DiscussionInput::new("rust shorts"), &NoProgress, &NoopArtifactStore)
            .await
            .unwrap();

        // Two rounds, two insights each
        assert_eq!(result.key_insights.len(), 4);
        assert_eq!(result.key_insights[0], "Strengthen the hook");
    }

    #[tokio::test]
    async fn test_invalid_config_is_fatal() {
        let backend = Arc::new(ScriptedBackend::with_handler(cooperative_handler));
        let config = Arc::new(EngineConfig::new(Roster::default(), ExpertiseWeightTable::new()));
        let use_case = RunDiscussionUseCase::new(backend, config);

        let result = use_case
            .execute(DiscussionInput::new("anything"), &NoProgress, &NoopArtifactStore)
            .await;

        assert!(matches!(result, Err(RunDiscussionError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_the_run() {
        let backend = Arc::new(ScriptedBackend::with_handler(cooperative_handler));
        let token = CancellationToken::new();
        token.cancel();
        let use_case = RunDiscussionUseCase::new(backend, run_config(2, 0.9))
            .with_cancellation(token);

        let result = use_case
            .execute(DiscussionInput::new("rust shorts"), &NoProgress, &NoopArtifactStore)
            .await;

        assert!(matches!(result, Err(RunDiscussionError::Cancelled)));
    }
}
