//! Image attachment loading for vision requests.
//!
//! The daemon expects images as base64 payloads inside the chat message, so
//! attachments are read from disk and encoded at submit time. Only common
//! raster formats are accepted, matching what vision models ingest.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// File extensions accepted as image attachments.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("unsupported image type '{0}' (supported: png, jpg, jpeg, gif, bmp, webp)")]
    UnsupportedExtension(String),
    #[error("could not read image: {0}")]
    Read(#[from] std::io::Error),
}

/// Whether a path looks like a supported image attachment.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Read an image file and encode it as the base64 payload the daemon expects.
pub fn load_image_payload(path: &Path) -> Result<String, ImageError> {
    if !is_supported_image(path) {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        return Err(ImageError::UnsupportedExtension(ext));
    }
    let bytes = fs::read(path)?;
    Ok(STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn accepts_known_extensions_case_insensitively() {
        assert!(is_supported_image(Path::new("photo.png")));
        assert!(is_supported_image(Path::new("scan.JPG")));
        assert!(is_supported_image(Path::new("clip.webp")));
    }

    #[test]
    fn rejects_non_image_paths() {
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("archive.tar.gz")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    #[test]
    fn encodes_file_contents_as_base64() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("pixel.png");
        let mut file = std::fs::File::create(&path).expect("create file");
        file.write_all(&[0x89, 0x50, 0x4e, 0x47]).expect("write");

        let payload = load_image_payload(&path).expect("payload");
        assert_eq!(payload, STANDARD.encode([0x89, 0x50, 0x4e, 0x47]));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = load_image_payload(Path::new("document.pdf")).unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedExtension(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_image_payload(Path::new("/nonexistent/cat.png")).unwrap_err();
        assert!(matches!(err, ImageError::Read(_)));
    }
}
