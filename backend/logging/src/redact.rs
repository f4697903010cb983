//! Log Redaction
//!
//! Scrubs API keys and bearer tokens from strings before they are logged or
//! echoed back to clients.

use regex::Regex;
use std::sync::LazyLock;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9_\-]{20,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_api_keys_and_bearer_tokens() {
        let raw = "Incorrect API key provided: sk-proj-abcdefghijklmnopqrstuvwxyz with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("sk-proj-abcdefghijklmnopqrstuvwxyz"));
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
        assert!(clean.starts_with("Incorrect API key provided: [REDACTED_TOKEN]"));
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        let raw = "OpenAI returned 429 Too Many Requests: slow down";
        assert_eq!(redact_sensitive_data(raw), raw);
    }
}
