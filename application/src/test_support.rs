//! Scripted backend for use-case tests
//!
//! Routes each prompt through a handler closure so tests can answer
//! differently per phase or per role, simulate failures for one role only,
//! or hang to exercise deadlines. Counts every `submit` so call-budget SLAs
//! can be asserted exactly.

use crate::ports::text_backend::{BackendError, TextBackend};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What the backend should do for one prompt
#[derive(Debug, Clone)]
pub enum Script {
    /// Answer with this text
    Reply(String),
    /// Fail with this error message
    Fail(String),
    /// Never resolve (exercises the deadline)
    Hang,
}

type Handler = dyn Fn(&str) -> Script + Send + Sync;

pub struct ScriptedBackend {
    handler: Arc<Handler>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    /// Same script for every prompt
    pub fn always(script: Script) -> Self {
        Self::with_handler(move |_| script.clone())
    }

    /// Route each prompt through a handler
    pub fn with_handler(handler: impl Fn(&str) -> Script + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            calls: AtomicUsize::new(0),
        }
    }

    /// Total `submit` calls observed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextBackend for ScriptedBackend {
    async fn submit(&self, prompt: &str) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match (self.handler)(prompt) {
            Script::Reply(text) => Ok(text),
            Script::Fail(reason) => Err(BackendError::RequestFailed(reason)),
            Script::Hang => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}
