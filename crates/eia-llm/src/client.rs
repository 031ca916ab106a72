//! HTTP client for an OpenAI-compatible chat-completions API.
//!
//! Wraps `reqwest` with bearer authentication, typed request/response bodies
//! and retry on transient failures. Non-2xx responses surface as
//! [`LlmError::Api`] carrying the provider's error message when present.

use std::time::Duration;

use eia_core::LlmSettings;
use reqwest::{Client, Url};

use crate::error::LlmError;
use crate::retry::retry_with_backoff;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, ErrorEnvelope};

const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Client for the chat-completions endpoint.
///
/// Use [`ChatClient::new`] for configured deployments or
/// [`ChatClient::with_base_url`] to point at a mock server in tests.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    api_key: String,
    endpoint: Url,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Creates a client from application settings.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::MissingApiKey`] when no key is configured,
    /// [`LlmError::InvalidBaseUrl`] for an unparseable base URL, or
    /// [`LlmError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(settings: &LlmSettings) -> Result<Self, LlmError> {
        let api_key = settings.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let mut client = Self::with_base_url(api_key, settings.timeout_secs, &settings.base_url)?;
        client.model.clone_from(&settings.model);
        client.temperature = settings.temperature;
        client.max_tokens = settings.max_tokens;
        client.max_retries = settings.max_retries;
        Ok(client)
    }

    /// Creates a client with default model parameters against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::InvalidBaseUrl`] or [`LlmError::Http`].
    pub fn with_base_url(api_key: &str, timeout_secs: u64, base_url: &str) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("eia/0.1 (environmental-impact-analyzer)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join("chat/completions"))
            .map_err(|e| LlmError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            endpoint,
            model: "gpt-4".to_owned(),
            temperature: 0.7,
            max_tokens: 1000,
            max_retries: 2,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the retry policy. Tests use a zero back-off.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends a system and a user message and returns the first choice's text.
    ///
    /// `Ok(None)` means the model answered without content.
    ///
    /// # Errors
    ///
    /// - [`LlmError::Api`] on a non-2xx response (after retries for 429/5xx).
    /// - [`LlmError::Http`] on network failure.
    /// - [`LlmError::Deserialize`] if the body is not a chat-completion response.
    pub async fn complete(&self, system: &str, user: &str) -> Result<Option<String>, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response: ChatResponse = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.post_json(&request)
        })
        .await?;

        let content = response.into_first_content();
        tracing::debug!(
            model = %self.model,
            has_content = content.is_some(),
            "chat completion received"
        );
        Ok(content)
    }

    /// POSTs `request`, maps non-2xx statuses to [`LlmError::Api`], and parses the body.
    async fn post_json(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| truncate(&body, 200));
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| LlmError::Deserialize {
            context: self.endpoint.to_string(),
            source: e,
        })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_owned()
    } else {
        let mut out: String = trimmed.chars().take(max_chars).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_key: Option<&str>) -> LlmSettings {
        LlmSettings {
            api_key: api_key.map(str::to_owned),
            base_url: "https://api.openai.com/v1".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            temperature: 0.2,
            max_tokens: 256,
            timeout_secs: 30,
            max_retries: 1,
        }
    }

    #[test]
    fn endpoint_appends_chat_completions() {
        let client = ChatClient::with_base_url("k", 30, "https://api.openai.com/v1").unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = ChatClient::with_base_url("k", 30, "http://localhost:9000/v1/").unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "http://localhost:9000/v1/chat/completions"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ChatClient::with_base_url("k", 30, "not a url").unwrap_err();
        assert!(matches!(err, LlmError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn new_requires_api_key() {
        let err = ChatClient::new(&settings(None)).unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
    }

    #[test]
    fn new_applies_settings() {
        let client = ChatClient::new(&settings(Some("sk-test"))).unwrap();
        assert_eq!(client.model(), "gpt-4o-mini");
        assert_eq!(client.max_tokens, 256);
        assert_eq!(client.max_retries, 1);
    }

    #[test]
    fn debug_does_not_leak_key() {
        let client = ChatClient::with_base_url("sk-secret", 30, "https://api.openai.com/v1").unwrap();
        assert!(!format!("{client:?}").contains("sk-secret"));
    }

    #[test]
    fn truncate_limits_long_bodies() {
        assert_eq!(truncate("  short  ", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
    }
}
