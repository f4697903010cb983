use std::sync::Arc;

use tracing::{info, warn};

use qlens_core::{Answer, LlmProvider, LlmRequest, QaError, Question};
use qlens_logging::redact_sensitive_data;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const MAX_ANSWER_TOKENS: u32 = 300;
pub const TEMPERATURE: f32 = 0.7;

pub const SYSTEM_PROMPT: &str = "You are an expert question-answering AI. Provide clear, concise, \
and accurate answers to the given question. If the question is unclear or cannot be answered, \
explain why.";

/// Generates answers to extracted questions with a single chat-completion call.
pub struct QuestionAnswerer {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl QuestionAnswerer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the provider for an answer. No retries.
    pub async fn answer(&self, question: &Question) -> Result<Answer, QaError> {
        let request = LlmRequest {
            model: self.model.clone(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: question.as_str().to_string(),
            max_tokens: MAX_ANSWER_TOKENS,
            temperature: TEMPERATURE,
        };

        match self.provider.complete(&request).await {
            Ok(response) => {
                info!(
                    provider = %response.provider,
                    model = %response.model,
                    tokens = response.tokens_used,
                    latency_ms = response.latency_ms,
                    "Answer generated"
                );
                Ok(Answer::new(response.content))
            }
            Err(e) => {
                let message = redact_sensitive_data(&format!("{e:#}"));
                warn!(provider = %self.provider.name(), error = %message, "Question answering failed");
                Err(QaError::Llm {
                    provider: self.provider.name().to_string(),
                    message,
                })
            }
        }
    }

    /// The answer shown to clients when generation failed.
    pub fn fallback_answer(error: &QaError) -> Answer {
        Answer::new(format!(
            "Sorry, I couldn't generate an answer. Error: {}",
            redact_sensitive_data(&error.client_message())
        ))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use qlens_core::LlmResponse;
    use tokio::sync::Mutex;

    use super::*;
    use crate::providers::MockProvider;

    /// Records the last request it was given.
    #[derive(Default)]
    struct RecordingProvider {
        last: Mutex<Option<LlmRequest>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, req: &LlmRequest) -> Result<LlmResponse> {
            *self.last.lock().await = Some(req.clone());
            Ok(LlmResponse {
                content: "42".into(),
                provider: "recording".into(),
                model: req.model.clone(),
                tokens_used: 1,
                latency_ms: 1,
            })
        }
    }

    #[tokio::test]
    async fn builds_request_with_fixed_prompt_and_limits() {
        let provider = Arc::new(RecordingProvider::default());
        let answerer = QuestionAnswerer::new(provider.clone());

        let answer = answerer
            .answer(&Question::new_unchecked("What is six times seven?"))
            .await
            .unwrap();
        assert_eq!(answer.as_str(), "42");

        let req = provider.last.lock().await.clone().unwrap();
        assert_eq!(req.model, "gpt-4o-mini");
        assert_eq!(req.system_prompt, SYSTEM_PROMPT);
        assert_eq!(req.user_prompt, "What is six times seven?");
        assert_eq!(req.max_tokens, 300);
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn provider_failure_becomes_llm_error() {
        let answerer = QuestionAnswerer::new(Arc::new(MockProvider::new("mock").failing("quota exceeded")));
        let err = answerer
            .answer(&Question::new_unchecked("Why?"))
            .await
            .unwrap_err();

        match &err {
            QaError::Llm { provider, message } => {
                assert_eq!(provider, "mock");
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }

        let fallback = QuestionAnswerer::fallback_answer(&err);
        assert_eq!(
            fallback.as_str(),
            "Sorry, I couldn't generate an answer. Error: quota exceeded"
        );
    }

    #[test]
    fn fallback_never_echoes_api_keys() {
        let err = QaError::Llm {
            provider: "openai".into(),
            message: "bad key sk-abcdefghijklmnopqrstuvwxyz0123456789".into(),
        };
        let fallback = QuestionAnswerer::fallback_answer(&err);
        assert!(fallback.as_str().starts_with("Sorry, I couldn't generate an answer."));
        assert!(!fallback.as_str().contains("sk-abcdefghijklmnopqrstuvwxyz0123456789"));
    }

    #[test]
    fn model_can_be_overridden() {
        let answerer = QuestionAnswerer::new(Arc::new(MockProvider::new("mock"))).with_model("gpt-4o");
        assert_eq!(answerer.model(), "gpt-4o");
    }
}
