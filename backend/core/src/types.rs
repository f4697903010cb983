use std::fmt;

use serde::{Deserialize, Serialize};

/// Axis-aligned pixel region of a recognised text fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// One piece of text returned by the OCR engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrFragment {
    pub bounds: BoundingBox,
    pub text: String,
    /// Engines that do not score their output leave this empty.
    pub confidence: Option<f32>,
}

impl OcrFragment {
    pub fn new(bounds: BoundingBox, text: impl Into<String>) -> Self {
        Self {
            bounds,
            text: text.into(),
            confidence: None,
        }
    }
}

/// All fragments recognised in one image, in the engine's reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub fragments: Vec<OcrFragment>,
}

impl ExtractedText {
    pub fn new(fragments: Vec<OcrFragment>) -> Self {
        Self { fragments }
    }

    /// Fragment texts joined with newlines.
    pub fn joined(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Extracted text that was classified as a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Question(String);

impl Question {
    /// Only the question heuristic should wrap text as a `Question`.
    pub fn new_unchecked(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Natural-language answer to a single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Answer(String);

impl Answer {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
