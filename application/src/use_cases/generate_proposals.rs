//! Specialist proposal generation
//!
//! One bounded, recovered call per roster role, issued concurrently. The
//! returned collection always holds exactly one document per role: any call
//! or recovery failure substitutes that role's static fallback document, so
//! a total backend outage never reduces the count.

use crate::bounded_call::{BoundedExecutor, CallRequest};
use crate::config::EngineConfig;
use crate::ports::text_backend::TextBackend;
use crate::recovery::RecoveryService;
use conclave_domain::{ProposalDocument, PromptTemplate, RoleSpec};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Generates one proposal document per specialist role
pub struct ProposalGenerator<B: TextBackend + 'static> {
    backend: Arc<B>,
    config: Arc<EngineConfig>,
}

impl<B: TextBackend + 'static> ProposalGenerator<B> {
    pub fn new(backend: Arc<B>, config: Arc<EngineConfig>) -> Self {
        Self { backend, config }
    }

    /// Produce exactly one document per roster role.
    ///
    /// The shared context is rendered once by the caller and passed to every
    /// role by reference, so prompt size does not grow with roster size.
    /// Results come back in roster registration order regardless of task
    /// completion order, keeping downstream aggregation deterministic.
    pub async fn generate(&self, shared_context: &Arc<String>) -> Vec<ProposalDocument> {
        let mut join_set = JoinSet::new();

        for role in self.config.roster.roles() {
            let backend = Arc::clone(&self.backend);
            let config = Arc::clone(&self.config);
            let context = Arc::clone(shared_context);
            let role = role.clone();

            join_set.spawn(async move {
                let document = Self::propose_for_role(&backend, &config, &role, &context).await;
                (role, document)
            });
        }

        let mut by_role: BTreeMap<String, ProposalDocument> = BTreeMap::new();

        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((role, Some(document))) => {
                    info!(role = %role.name, "proposal recovered from live call");
                    by_role.insert(role.name, document);
                }
                Ok((role, None)) => {
                    warn!(role = %role.name, "live proposal failed; using fallback document");
                    by_role.insert(role.name.clone(), role.fallback.instantiate(&role.name));
                }
                Err(join_error) => {
                    warn!("proposal task join error: {}", join_error);
                }
            }
        }

        // Re-order into roster registration order; a panicked task still
        // yields its role's fallback so the count guarantee holds.
        self.config
            .roster
            .roles()
            .iter()
            .map(|role| {
                by_role
                    .remove(&role.name)
                    .unwrap_or_else(|| role.fallback.instantiate(&role.name))
            })
            .collect()
    }

    /// One role's bounded call and recovery; `None` means fall back.
    async fn propose_for_role(
        backend: &Arc<B>,
        config: &EngineConfig,
        role: &RoleSpec,
        shared_context: &str,
    ) -> Option<ProposalDocument> {
        let executor = BoundedExecutor::new(Arc::clone(backend));
        let request = CallRequest::new(
            format!("propose/{}", role.name),
            PromptTemplate::propose(role, shared_context),
            config.call_timeout,
        );
        let result = executor.execute(&request).await;
        if !result.is_live() {
            return None;
        }

        let recovery = RecoveryService::new(&executor, config.call_timeout);
        let recovered = recovery
            .recover(
                &format!("propose/{}", role.name),
                &result.text,
                config.expected_shape.as_ref(),
            )
            .await?;

        let object = recovered.value.as_object()?;
        debug!(
            role = %role.name,
            strategy = %recovered.strategy,
            fields = object.len(),
            "proposal document ready"
        );
        Some(ProposalDocument::from_object(&role.name, object))
    }
}
