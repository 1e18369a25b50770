//! HTTP text backend speaking the chat completions wire format
//!
//! One prompt in, one completed message out. No retries and no internal
//! timeout: deadline enforcement belongs to the application layer's bounded
//! executor, which treats this adapter as unbounded and unreliable.

use crate::config::FileBackendConfig;
use async_trait::async_trait;
use conclave_application::ports::text_backend::{BackendError, TextBackend};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Text backend over an OpenAI-compatible chat completions endpoint
pub struct HttpTextBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpTextBackend {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
        }
    }

    /// Build from the `[backend]` config section, reading the bearer token
    /// from the named environment variable if one is configured.
    pub fn from_config(config: &FileBackendConfig) -> Self {
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok());
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl TextBackend for HttpTextBackend {
    async fn submit(&self, prompt: &str) -> Result<String, BackendError> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BackendError::RequestFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::RequestFailed(format!("Malformed response body: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        debug!(model = %self.model, bytes = content.len(), "chat completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refused_connection_is_connection_error() {
        // Grab a free local port, then close it so the connect is refused.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend =
            HttpTextBackend::new(format!("http://{}/v1/chat/completions", addr), "m");
        let result = backend.submit("hello").await;
        assert!(matches!(result, Err(BackendError::ConnectionError(_))));
    }

    #[test]
    fn test_from_config_without_key_env() {
        let config = FileBackendConfig {
            endpoint: "http://localhost:9999/v1/chat/completions".to_string(),
            model: "local-writer".to_string(),
            api_key_env: None,
        };
        let backend = HttpTextBackend::from_config(&config);
        assert_eq!(backend.model, "local-writer");
        assert!(backend.api_key.is_none());
    }
}
