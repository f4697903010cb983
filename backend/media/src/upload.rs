//! Upload validation.
//!
//! Checks the filename of the `image` part only. Content is never sniffed.

use thiserror::Error;

/// Extensions accepted for uploaded images, compared lower-cased.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Why an upload was refused before any processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("no file part")]
    NoFilePart,
    #[error("empty filename")]
    EmptyFilename,
    #[error("disallowed extension")]
    DisallowedExtension,
}

impl UploadRejection {
    /// Message returned to API clients.
    pub fn message(&self) -> &'static str {
        match self {
            UploadRejection::NoFilePart => "No image file provided",
            UploadRejection::EmptyFilename => "No selected file",
            UploadRejection::DisallowedExtension => "Invalid file type",
        }
    }
}

/// Validate the filename of an uploaded file part.
///
/// `None` means the request carried no file part at all.
pub fn validate_upload(filename: Option<&str>) -> Result<(), UploadRejection> {
    let filename = filename.ok_or(UploadRejection::NoFilePart)?;
    if filename.is_empty() {
        return Err(UploadRejection::EmptyFilename);
    }
    if !allowed_file(filename) {
        return Err(UploadRejection::DisallowedExtension);
    }
    Ok(())
}

/// Whether the substring after the last `.` is an allowed image extension.
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}
