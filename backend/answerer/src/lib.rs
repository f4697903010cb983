pub mod answerer;
pub mod providers;

pub use answerer::{QuestionAnswerer, DEFAULT_MODEL, MAX_ANSWER_TOKENS, SYSTEM_PROMPT, TEMPERATURE};
