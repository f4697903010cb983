//! Turns uploaded images into text and decides whether that text is a question.

pub mod decode;
pub mod ocr;
pub mod question;

pub use decode::{decode_image, DecodedImage};
pub use ocr::{OcrError, OcrSettings, OcrsRecognizer, TextRecognizer, SUPPORTED_LANGUAGES};
pub use question::{extract_question, is_likely_question, QUESTION_KEYWORDS};
