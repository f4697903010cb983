//! MIME type detection for uploaded images.
//!
//! Used to label uploads in request logs.

use std::path::Path;

/// Detect an image MIME type by file extension.
pub fn detect_image_mime(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "gif"          => "image/gif",
        "webp"         => "image/webp",
        "bmp"          => "image/bmp",
        _              => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_jpeg() {
        assert_eq!(detect_image_mime("photo.JPG"), "image/jpeg");
        assert_eq!(detect_image_mime("photo.jpeg"), "image/jpeg");
    }

    #[test]
    fn unknown_extension_fallback() {
        assert_eq!(detect_image_mime("notes.txt"), "application/octet-stream");
        assert_eq!(detect_image_mime("noextension"), "application/octet-stream");
    }
}
