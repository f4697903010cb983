//! Optical Character Recognition (OCR)
//!
//! Wraps the `ocrs` engine. Models are loaded once at startup and the engine
//! is shared by every request.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use qlens_core::{BoundingBox, ExtractedText, OcrFragment};
use rten::Model;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::decode::DecodedImage;

/// Languages the bundled recognition models can read.
pub const SUPPORTED_LANGUAGES: [&str; 1] = ["en"];

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to load OCR model: {0}")]
    ModelLoad(String),

    #[error("unsupported OCR language: {0}")]
    UnsupportedLanguage(String),

    #[error("OCR engine failure: {0}")]
    Engine(String),
}

/// Anything that can read text out of a decoded image.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognise text fragments in reading order. An image without text
    /// yields an empty result, not an error.
    async fn recognize(&self, image: DecodedImage) -> Result<ExtractedText, OcrError>;
}

/// Where to find the engine's models and which languages to read.
#[derive(Debug, Clone)]
pub struct OcrSettings {
    pub languages: Vec<String>,
    pub detection_model: PathBuf,
    pub recognition_model: PathBuf,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            detection_model: PathBuf::from("models/text-detection.rten"),
            recognition_model: PathBuf::from("models/text-recognition.rten"),
        }
    }
}

/// `TextRecognizer` backed by the ocrs detection and recognition models.
pub struct OcrsRecognizer {
    engine: Arc<Mutex<OcrEngine>>,
}

impl OcrsRecognizer {
    /// Load both models and build the engine. Expensive; call once.
    pub fn load(settings: &OcrSettings) -> Result<Self, OcrError> {
        if settings.languages.is_empty() {
            return Err(OcrError::UnsupportedLanguage("no language configured".into()));
        }
        if let Some(lang) = settings
            .languages
            .iter()
            .find(|l| !SUPPORTED_LANGUAGES.contains(&l.as_str()))
        {
            return Err(OcrError::UnsupportedLanguage(lang.clone()));
        }

        let detection_model = load_model(&settings.detection_model)?;
        let recognition_model = load_model(&settings.recognition_model)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| OcrError::ModelLoad(e.to_string()))?;

        info!(
            languages = ?settings.languages,
            detection = %settings.detection_model.display(),
            recognition = %settings.recognition_model.display(),
            "OCR engine ready"
        );

        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
        })
    }
}

#[async_trait]
impl TextRecognizer for OcrsRecognizer {
    async fn recognize(&self, image: DecodedImage) -> Result<ExtractedText, OcrError> {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || {
            let engine = engine.blocking_lock();
            read_lines(&engine, &image)
        })
        .await
        .map_err(|e| OcrError::Engine(format!("OCR task failed: {e}")))?
    }
}

fn load_model(path: &Path) -> Result<Model, OcrError> {
    Model::load_file(path).map_err(|e| OcrError::ModelLoad(format!("{}: {e}", path.display())))
}

fn engine_error(e: impl std::fmt::Display) -> OcrError {
    OcrError::Engine(e.to_string())
}

/// Detect words, group them into lines, and recognise each line.
fn read_lines(engine: &OcrEngine, image: &DecodedImage) -> Result<ExtractedText, OcrError> {
    let source = ImageSource::from_bytes(image.as_raw(), image.dimensions()).map_err(engine_error)?;
    let input = engine.prepare_input(source).map_err(engine_error)?;

    let word_rects = engine.detect_words(&input).map_err(engine_error)?;
    let line_rects = engine.find_text_lines(&input, &word_rects);
    let lines = engine
        .recognize_text(&input, &line_rects)
        .map_err(engine_error)?;

    let fragments: Vec<OcrFragment> = lines
        .iter()
        .flatten()
        .filter_map(|line| {
            let text = line.to_string();
            if text.trim().is_empty() {
                return None;
            }
            let rect = line.bounding_rect();
            let bounds = BoundingBox {
                left: rect.left(),
                top: rect.top(),
                right: rect.right(),
                bottom: rect.bottom(),
            };
            Some(OcrFragment::new(bounds, text))
        })
        .collect();

    debug!(
        width = image.width(),
        height = image.height(),
        lines = fragments.len(),
        "OCR pass complete"
    );

    Ok(ExtractedText::new(fragments))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_read_english() {
        let settings = OcrSettings::default();
        assert_eq!(settings.languages, vec!["en".to_string()]);
    }

    #[test]
    fn rejects_unsupported_language_before_loading_models() {
        let settings = OcrSettings {
            languages: vec!["en".into(), "ch_sim".into()],
            ..OcrSettings::default()
        };
        match OcrsRecognizer::load(&settings) {
            Err(OcrError::UnsupportedLanguage(lang)) => assert_eq!(lang, "ch_sim"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn rejects_empty_language_list() {
        let settings = OcrSettings {
            languages: vec![],
            ..OcrSettings::default()
        };
        assert!(matches!(
            OcrsRecognizer::load(&settings),
            Err(OcrError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn missing_model_file_is_a_load_error() {
        let settings = OcrSettings {
            detection_model: PathBuf::from("/nonexistent/qlens/text-detection.rten"),
            ..OcrSettings::default()
        };
        match OcrsRecognizer::load(&settings) {
            Err(OcrError::ModelLoad(msg)) => assert!(msg.contains("text-detection.rten")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected an error"),
        }
    }
}
