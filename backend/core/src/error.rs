use thiserror::Error;

/// Top-level error type for the qlens service.
#[derive(Debug, Error)]
pub enum QaError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("LLM provider error ({provider}): {message}")]
    Llm { provider: String, message: String },
}

impl QaError {
    /// The message shown to API clients when answering fails.
    ///
    /// Provider failures expose only the provider's own message.
    pub fn client_message(&self) -> String {
        match self {
            QaError::Llm { message, .. } => message.clone(),
            QaError::Config(_) => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_error_client_message_is_provider_message() {
        let err = QaError::Llm {
            provider: "openai".into(),
            message: "rate limited".into(),
        };
        assert_eq!(err.client_message(), "rate limited");
        assert_eq!(err.to_string(), "LLM provider error (openai): rate limited");
    }

    #[test]
    fn config_error_display() {
        let err = QaError::Config("OpenAI API key is required".into());
        assert_eq!(err.client_message(), "configuration error: OpenAI API key is required");
    }
}
