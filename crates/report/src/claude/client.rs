//! Claude API client for one-shot text completions.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use crate::config::ClaudeConfig;

use super::error::{ApiErrorResponse, ClaudeError};
use super::types::{ChatRequest, ChatResponse, Message};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 600;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Claude API client.
#[derive(Clone)]
pub struct ClaudeClient {
    inner: Arc<ClaudeClientInner>,
}

struct ClaudeClientInner {
    client: reqwest::Client,
    model: String,
}

impl std::fmt::Debug for ClaudeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeClient")
            .field("model", &self.inner.model)
            .finish_non_exhaustive()
    }
}

impl ClaudeClient {
    /// Create a new Claude client.
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::InvalidApiKey` if the key contains characters
    /// not allowed in a header, or `ClaudeError::Http` if the HTTP client
    /// cannot be built.
    pub fn new(config: &ClaudeConfig) -> Result<Self, ClaudeError> {
        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|e| ClaudeError::InvalidApiKey(e.to_string()))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", api_key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClaudeClientInner {
                client,
                model: config.model.clone(),
            }),
        })
    }

    /// Send `prompt` as a single user message and return the reply text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API answers with an error,
    /// or the reply contains no text.
    #[instrument(skip(self, prompt), fields(model = %self.inner.model, prompt_len = prompt.len()))]
    pub async fn complete(&self, prompt: &str) -> Result<String, ClaudeError> {
        let request = ChatRequest {
            model: self.inner.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            messages: vec![Message::user(prompt)],
        };

        let response = self
            .inner
            .client
            .post(ANTHROPIC_API_URL)
            .json(&request)
            .send()
            .await?;

        let response = Self::handle_response(response).await?;
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "Completion received"
        );

        let text = response.text();
        if text.trim().is_empty() {
            return Err(ClaudeError::EmptyCompletion);
        }
        Ok(text.trim().to_string())
    }

    /// Handle a response of any status.
    async fn handle_response(response: reqwest::Response) -> Result<ChatResponse, ClaudeError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| ClaudeError::Parse(format!("Failed to parse response: {e}")))
        } else {
            Err(Self::handle_error_status(status, response).await)
        }
    }

    /// Handle an error status code.
    async fn handle_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> ClaudeError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return ClaudeError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ClaudeError::Unauthorized("Invalid API key".to_string());
        }

        match response.text().await {
            Ok(body) => parse_error_body(body),
            Err(e) => ClaudeError::Http(e),
        }
    }
}

/// Turn an error body into `ClaudeError::Api`, keeping the raw body when it
/// is not the documented error shape.
fn parse_error_body(body: String) -> ClaudeError {
    match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(api_error) => ClaudeError::Api {
            error_type: api_error.error.error_type,
            message: api_error.error.message,
        },
        Err(_) => ClaudeError::Api {
            error_type: "unknown".to_string(),
            message: body,
        },
    }
}
