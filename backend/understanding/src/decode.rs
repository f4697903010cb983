use image::RgbImage;

use crate::ocr::OcrError;

/// In-memory RGB pixel buffer decoded from an upload.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: RgbImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Row-major interleaved RGB bytes.
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }
}

impl From<RgbImage> for DecodedImage {
    fn from(pixels: RgbImage) -> Self {
        Self { pixels }
    }
}

/// Decode encoded image bytes (PNG, JPEG, GIF, BMP, WebP, ...) into RGB8.
///
/// Grayscale and alpha images are converted.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, OcrError> {
    let image = image::load_from_memory(bytes).map_err(|e| OcrError::Decode(e.to_string()))?;
    Ok(DecodedImage::from(image.into_rgb8()))
}
