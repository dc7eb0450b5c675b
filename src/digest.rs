//! Top-level entry point: transcribe one image into a file.
//!
//! [`digest`] wires the pieces together in the order that fails cheapest
//! first: the format name and registry are checked, then the image is read,
//! and only then is the model called.

use crate::config::DigestConfig;
use crate::error::HandmarkError;
use crate::format::FormatRegistry;
use crate::pipeline::llm::VisionClient;
use crate::response::ResponsePipeline;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Transcribe `image_path` and write the result under `output_dir`.
///
/// `fallback_filename` names the file when the response carries no usable
/// title; it defaults to `response<ext>` for the chosen format.
///
/// # Errors
/// - [`HandmarkError::UnknownFormat`] / [`HandmarkError::InvalidRegistry`]
///   before anything else is touched
/// - image errors before any network call
/// - completion errors ([`HandmarkError::AuthError`],
///   [`HandmarkError::LlmApiError`], [`HandmarkError::ApiTimeout`]) unchanged
/// - [`HandmarkError::OutputDirFailed`] / [`HandmarkError::OutputWriteFailed`]
///
/// # Example
/// ```rust,no_run
/// use handmark::{digest, DigestConfig};
///
/// let config = DigestConfig::builder().format("json").build()?;
/// let path = digest("notes.jpg", "./out", None, &config)?;
/// println!("written to {}", path.display());
/// # Ok::<(), handmark::HandmarkError>(())
/// ```
pub fn digest(
    image_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    fallback_filename: Option<&str>,
    config: &DigestConfig,
) -> Result<PathBuf, HandmarkError> {
    let start = Instant::now();
    let image_path = image_path.as_ref();
    info!("Starting digest: {}", image_path.display());

    let registry = load_registry(config)?;
    let profile = registry.resolve(&config.format)?.clone();
    info!("Format: {}, model: {}", profile.name(), config.model);

    let fallback = fallback_filename
        .map(str::to_string)
        .unwrap_or_else(|| profile.default_filename());

    let client = VisionClient::new(config)?;
    let pipeline = ResponsePipeline::new(image_path, profile, config.model.clone(), client)?;
    let path = pipeline.write_response(output_dir, &fallback)?;

    info!("Digest complete in {}ms", start.elapsed().as_millis());
    Ok(path)
}

/// The registry named by `config.formats_path`, or the built-in one.
pub fn load_registry(config: &DigestConfig) -> Result<FormatRegistry, HandmarkError> {
    match config.formats_path {
        Some(ref path) => FormatRegistry::load(path),
        None => Ok(FormatRegistry::builtin()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_registry_file_fails_before_image() {
        let mut config = DigestConfig::default();
        config.formats_path = Some(PathBuf::from("/no/such/formats.json"));
        let err = digest("/no/such/image.png", "/tmp", None, &config).unwrap_err();
        assert!(matches!(err, HandmarkError::InvalidRegistry(_)), "got: {err}");
    }

    #[test]
    fn unknown_format_fails_before_image() {
        let mut config = DigestConfig::default();
        config.format = "pdf".to_string();
        let err = digest("/no/such/image.png", "/tmp", None, &config).unwrap_err();
        assert!(matches!(err, HandmarkError::UnknownFormat { .. }));
    }

    #[test]
    fn missing_image_fails_before_network() {
        let err = digest("/no/such/image.png", "/tmp", None, &DigestConfig::default()).unwrap_err();
        assert!(matches!(err, HandmarkError::ImageNotFound { .. }));
    }
}
