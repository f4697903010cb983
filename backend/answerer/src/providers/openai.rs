use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use qlens_core::{LlmProvider, LlmRequest, LlmResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat-completions provider.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum Role {
    System,
    User,
}

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    role: Role,
    content: &'a str,
}

/// Request body: always exactly one system and one user message.
#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: [OutgoingMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

impl<'a> CompletionBody<'a> {
    fn exchange(request: &'a LlmRequest) -> Self {
        Self {
            model: &request.model,
            messages: [
                OutgoingMessage {
                    role: Role::System,
                    content: &request.system_prompt,
                },
                OutgoingMessage {
                    role: Role::User,
                    content: &request.user_prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: AssistantMessage,
}

/// `content` is null when the model refuses or only calls tools.
#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    total_tokens: u64,
}

impl Completion {
    /// Text of the first choice and the total token count.
    fn into_answer(self) -> Result<(String, u64)> {
        let tokens = self.usage.map(|u| u.total_tokens).unwrap_or(0);
        let first = self
            .choices
            .into_iter()
            .next()
            .context("OpenAI response contained no choices")?;
        let content = first
            .message
            .content
            .context("OpenAI response choice had no content")?;
        Ok((content, tokens))
    }
}

/// `{"error": {"message": ...}}` body OpenAI sends with non-2xx responses.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Prefer the API's own error message; fall back to the raw body.
fn describe_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => format!("OpenAI returned {status}: {}", envelope.error.message),
        Err(_) => format!("OpenAI returned {status}: {}", body.trim()),
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();
        debug!(model = %request.model, "Sending request to OpenAI");

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&CompletionBody::exchange(request))
            .send()
            .await
            .context("OpenAI HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(describe_failure(status, &body));
        }

        let completion: Completion = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;
        let (content, tokens_used) = completion.into_answer()?;

        Ok(LlmResponse {
            content,
            provider: self.name().to_string(),
            model: request.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
