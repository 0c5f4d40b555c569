//! Assistant client for LLM-guided remediation
//!
//! Each query is completely stateless: no conversation history is kept
//! between remediation runs. The remediation orchestrator treats any error
//! or falsy success as "assistant unavailable" and falls back to the tool
//! path, so this client never needs to be reliable, only honest.

use async_trait::async_trait;
use mend_core::{AssistantOutcome, MendError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4";
const DEFAULT_MAX_TOKENS: usize = 16000;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

// Retry configuration for rate limits and server errors
const MAX_RETRIES: u32 = 2;
const RETRY_DELAY_SECS: u64 = 10;

/// Trait for assistant queries (allows mocking in tests)
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Send a prompt, get an outcome
    async fn query(&self, prompt: &str) -> Result<AssistantOutcome>;
}

/// Get authentication token for the assistant API
///
/// Priority:
/// 1. CLAUDE_CODE_OAUTH_TOKEN (subscription access)
/// 2. ANTHROPIC_API_KEY (standard API access)
fn get_auth_token() -> Result<String> {
    if let Ok(oauth_token) = env::var("CLAUDE_CODE_OAUTH_TOKEN") {
        debug!("Using OAuth token for assistant auth");
        return Ok(oauth_token);
    }

    if let Ok(api_key) = env::var("ANTHROPIC_API_KEY") {
        debug!("Using ANTHROPIC_API_KEY for assistant auth");
        return Ok(api_key);
    }

    Err(MendError::AssistantUnavailable(
        "No authentication found. Set CLAUDE_CODE_OAUTH_TOKEN or ANTHROPIC_API_KEY".to_string(),
    ))
}

#[derive(Debug, Clone, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: usize,
    messages: Vec<ApiMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiContent {
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiResponse {
    content: Vec<ApiContent>,
}

/// HTTP-backed assistant client
#[derive(Debug, Clone)]
pub struct ApiAssistant {
    model: String,
    max_tokens: usize,
    timeout: Duration,
}

impl Default for ApiAssistant {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl ApiAssistant {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Assistant for ApiAssistant {
    async fn query(&self, prompt: &str) -> Result<AssistantOutcome> {
        let auth_token = get_auth_token()?;

        let request = ApiRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| MendError::Assistant(format!("Failed to build client: {}", e)))?;

        let mut retries = 0;
        loop {
            debug!("Sending assistant request (attempt {})", retries + 1);

            let response = client
                .post(API_URL)
                .header("x-api-key", &auth_token)
                .header("anthropic-version", API_VERSION)
                .header("content-type", "application/json")
                .json(&request)
                .send()
                .await
                .map_err(|e| MendError::Assistant(format!("Failed to send request: {}", e)))?;

            let status = response.status();

            // Retry rate limits and server errors a fixed number of times;
            // the caller falls back to the tool path on exhaustion.
            if (status.as_u16() == 429 || status.is_server_error()) && retries < MAX_RETRIES {
                retries += 1;
                warn!(
                    "Assistant API returned {}, retrying in {}s ({}/{})",
                    status, RETRY_DELAY_SECS, retries, MAX_RETRIES
                );
                tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECS)).await;
                continue;
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown".to_string());
                return Err(MendError::Assistant(format!(
                    "Assistant API error {}: {}",
                    status, error_text
                )));
            }

            let api_response: ApiResponse = response
                .json()
                .await
                .map_err(|e| MendError::Assistant(format!("Failed to parse response: {}", e)))?;

            let output = api_response
                .content
                .first()
                .ok_or_else(|| MendError::Assistant("No content in response".to_string()))?
                .text
                .clone();

            info!("Assistant responded ({} chars)", output.len());
            return Ok(AssistantOutcome {
                success: true,
                output,
            });
        }
    }
}

/// Mock assistant for testing
#[derive(Clone)]
pub struct MockAssistant {
    outcome: Option<AssistantOutcome>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockAssistant {
    /// Assistant that answers every query successfully
    pub fn answering(output: impl Into<String>) -> Self {
        Self {
            outcome: Some(AssistantOutcome {
                success: true,
                output: output.into(),
            }),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Assistant that reports failure without erroring
    pub fn refusing() -> Self {
        Self {
            outcome: Some(AssistantOutcome {
                success: false,
                output: String::new(),
            }),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Assistant that errors on every query (unavailable)
    pub fn unavailable() -> Self {
        Self {
            outcome: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Assistant for MockAssistant {
    async fn query(&self, prompt: &str) -> Result<AssistantOutcome> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.outcome {
            Some(outcome) => Ok(outcome.clone()),
            None => Err(MendError::AssistantUnavailable(
                "mock assistant is unavailable".to_string(),
            )),
        }
    }
}
