//! Question detection over OCR output.
//!
//! Deliberately crude: keyword match on the first three tokens, or any `?`.

use qlens_core::Question;

/// Interrogative words recognised among the leading tokens.
pub const QUESTION_KEYWORDS: [&str; 7] = ["what", "who", "where", "when", "why", "how", "which"];

/// Number of leading whitespace-delimited tokens inspected for keywords.
const LEADING_TOKENS: usize = 3;

/// Whether the text looks like a question.
pub fn is_likely_question(full_text: &str) -> bool {
    let lower = full_text.to_lowercase();
    let keyword_lead = lower
        .split_whitespace()
        .take(LEADING_TOKENS)
        .any(|token| QUESTION_KEYWORDS.contains(&token));

    keyword_lead || full_text.contains('?')
}

/// Classify the full OCR text, returning it unchanged when it is a question.
pub fn extract_question(full_text: &str) -> Option<Question> {
    is_likely_question(full_text).then(|| Question::new_unchecked(full_text))
}
