pub mod error;
pub mod traits;
pub mod types;

pub use error::QaError;
pub use traits::{LlmProvider, LlmRequest, LlmResponse};
pub use types::{Answer, BoundingBox, ExtractedText, OcrFragment, Question};
