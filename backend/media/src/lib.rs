use bytes::Bytes;

pub mod mime_detect;
pub mod upload;

pub use mime_detect::detect_image_mime;
pub use upload::{allowed_file, validate_upload, UploadRejection, ALLOWED_EXTENSIONS};

/// An image file received in a multipart upload.
///
/// Lives only for the duration of one request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Bytes,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// MIME type implied by the filename's extension.
    pub fn mime_type(&self) -> &'static str {
        detect_image_mime(&self.filename)
    }
}
