//! Input resolution: load and validate the handwritten-page image.
//!
//! The image is read once, up front, so that a wrong path or a non-image file
//! is reported before any network call is made. The format is sniffed from
//! the file's magic bytes rather than trusted from its extension; a `.png`
//! that is really a HEIC photo would otherwise be rejected by the API with an
//! unhelpful message.

use crate::error::HandmarkError;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Image formats accepted by the vision APIs.
const ACCEPTED: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// A validated image, held in memory.
#[derive(Clone)]
pub struct ImageInput {
    pub path: PathBuf,
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl ImageInput {
    /// MIME type sent alongside the base64 payload.
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

impl std::fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageInput")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Read `path` and check that it is an image the vision model can take.
pub fn resolve_image(path: impl AsRef<Path>) -> Result<ImageInput, HandmarkError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(HandmarkError::ImageNotFound { path });
    }
    if path.is_dir() {
        return Err(HandmarkError::UnsupportedImage {
            path,
            detail: "path is a directory".to_string(),
        });
    }

    let bytes = match std::fs::read(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(HandmarkError::PermissionDenied { path });
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HandmarkError::ImageNotFound { path });
        }
        Err(source) => return Err(HandmarkError::ImageReadFailed { path, source }),
    };

    let format = image::guess_format(&bytes).map_err(|_| HandmarkError::UnsupportedImage {
        path: path.clone(),
        detail: format!(
            "unrecognised image data (first bytes: {:?})",
            &bytes[..bytes.len().min(4)]
        ),
    })?;

    if !ACCEPTED.contains(&format) {
        return Err(HandmarkError::UnsupportedImage {
            path,
            detail: format!("{format:?} images are not accepted; use PNG, JPEG, GIF or WebP"),
        });
    }

    debug!(
        "Resolved image {} ({:?}, {} bytes)",
        path.display(),
        format,
        bytes.len()
    );
    Ok(ImageInput {
        path,
        format,
        bytes,
    })
}
