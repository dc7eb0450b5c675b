//! Error types for the handmark library.
//!
//! Every failure that stops a digest is a [`HandmarkError`]. The one failure
//! mode that is *not* represented here is a response that cannot be parsed
//! while looking for a title: that is recovered inside
//! [`crate::pipeline::title`] and only changes the output filename.
//!
//! Errors are grouped by the stage that raises them so the CLI can print a
//! message that points at the right fix (bad flag, missing key, full disk).

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the handmark library.
#[derive(Debug, Error)]
pub enum HandmarkError {
    // ── Format errors ─────────────────────────────────────────────────────
    /// The requested output format is not one of markdown, json, yaml, xml.
    #[error("Unknown output format '{name}'\nSupported formats: markdown, json, yaml, xml.")]
    UnknownFormat { name: String },

    /// The format registry configuration is incomplete or inconsistent.
    #[error("Invalid format registry: {0}")]
    InvalidRegistry(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Image file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    ImageNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but is not an image the vision model accepts.
    #[error("Unsupported image '{path}': {detail}")]
    UnsupportedImage { path: PathBuf, detail: String },

    /// The file exists but could not be read.
    #[error("Failed to read image '{path}': {source}")]
    ImageReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// No credential is available for the provider, or it rejected the one given.
    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    /// The LLM API call failed (network, service or protocol error).
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The LLM API call did not answer within the configured timeout.
    #[error("API call timed out after {secs}s\nIncrease --api-timeout.")]
    ApiTimeout { secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the destination directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The fallback filename would place the file outside the destination.
    #[error("Invalid fallback filename {name:?}\nUse a plain file name such as 'notes.md'.")]
    InvalidFilename { name: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandmarkError {
    /// True for failures raised by the completion call rather than locally.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            HandmarkError::AuthError { .. }
                | HandmarkError::LlmApiError { .. }
                | HandmarkError::ApiTimeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_display() {
        let e = HandmarkError::UnknownFormat {
            name: "html".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("'html'"), "got: {msg}");
        assert!(msg.contains("markdown, json, yaml, xml"));
    }

    #[test]
    fn auth_error_display() {
        let e = HandmarkError::AuthError {
            provider: "openai".into(),
            detail: "OPENAI_API_KEY not set".into(),
        };
        assert!(e.to_string().contains("openai"));
        assert!(e.to_string().contains("OPENAI_API_KEY"));
        assert!(e.is_remote());
    }

    #[test]
    fn write_failure_keeps_source() {
        use std::error::Error as _;
        let e = HandmarkError::OutputWriteFailed {
            path: PathBuf::from("/out/x.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.to_string().contains("/out/x.md"));
        assert!(e.source().is_some());
        assert!(!e.is_remote());
    }

    #[test]
    fn invalid_filename_display() {
        let e = HandmarkError::InvalidFilename {
            name: "../x.md".into(),
        };
        assert!(e.to_string().contains("\"../x.md\""), "got: {e}");
        assert!(!e.is_remote());
    }

    #[test]
    fn api_timeout_display() {
        let e = HandmarkError::ApiTimeout { secs: 60 };
        assert!(e.to_string().contains("60s"));
    }
}
