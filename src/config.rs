//! Configuration types for a digest.
//!
//! Every knob that shapes the completion call lives in [`DigestConfig`],
//! built via [`DigestConfigBuilder`]. The output location is *not* part of
//! the config: it is passed per call, so one config can be reused across a
//! batch of images written to different directories.

use crate::error::HandmarkError;
use crate::format::OutputFormat;
use crate::models::DEFAULT_MODEL;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration for transcribing one image.
///
/// # Example
/// ```rust
/// use handmark::DigestConfig;
///
/// let config = DigestConfig::builder()
///     .format("yaml")
///     .model("gpt-4.1-mini")
///     .build()
///     .unwrap();
/// assert_eq!(config.format, "yaml");
/// ```
#[derive(Clone)]
pub struct DigestConfig {
    /// Output format name: markdown, json, yaml or xml. Default: markdown.
    pub format: String,

    /// LLM model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Transcription should be faithful, not creative.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    pub max_tokens: usize,

    /// Image detail level sent with the picture. Default: [`ImageDetail::Low`].
    pub image_detail: ImageDetail,

    /// Timeout for the completion call in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// JSON format-registry file replacing the built-in prompts.
    pub formats_path: Option<PathBuf>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default().name().to_string(),
            model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            image_detail: ImageDetail::default(),
            api_timeout_secs: 60,
            formats_path: None,
        }
    }
}

impl fmt::Debug for DigestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestConfig")
            .field("format", &self.format)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("image_detail", &self.image_detail)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("formats_path", &self.formats_path)
            .finish()
    }
}

impl DigestConfig {
    /// Create a new builder for `DigestConfig`.
    pub fn builder() -> DigestConfigBuilder {
        DigestConfigBuilder {
            config: Self::default(),
        }
    }

    /// The configured format, already validated by [`DigestConfigBuilder::build`].
    pub fn output_format(&self) -> Result<OutputFormat, HandmarkError> {
        self.format.parse()
    }
}

/// Builder for [`DigestConfig`].
#[derive(Debug)]
pub struct DigestConfigBuilder {
    config: DigestConfig,
}

impl DigestConfigBuilder {
    pub fn format(mut self, name: impl Into<String>) -> Self {
        self.config.format = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn image_detail(mut self, detail: ImageDetail) -> Self {
        self.config.image_detail = detail;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn formats_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.formats_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// An unknown format name is rejected here, before any image is read or
    /// any network call is made.
    pub fn build(self) -> Result<DigestConfig, HandmarkError> {
        let c = &self.config;
        c.format.parse::<OutputFormat>()?;
        if c.model.trim().is_empty() {
            return Err(HandmarkError::InvalidConfig("model must not be empty".into()));
        }
        if c.max_tokens == 0 {
            return Err(HandmarkError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(HandmarkError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Image detail level requested from the vision model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    /// Single low-resolution tile. (default)
    #[default]
    Low,
    /// Tiled high-resolution view for small or dense writing.
    High,
    /// Let the provider decide.
    Auto,
}

impl ImageDetail {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageDetail::Low => "low",
            ImageDetail::High => "high",
            ImageDetail::Auto => "auto",
        }
    }
}

impl FromStr for ImageDetail {
    type Err = HandmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(ImageDetail::Low),
            "high" => Ok(ImageDetail::High),
            "auto" => Ok(ImageDetail::Auto),
            other => Err(HandmarkError::InvalidConfig(format!(
                "image detail must be low, high or auto, got '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = DigestConfig::default();
        assert_eq!(c.format, "markdown");
        assert_eq!(c.model, DEFAULT_MODEL);
        assert_eq!(c.image_detail, ImageDetail::Low);
        assert_eq!(c.max_tokens, 4096);
    }

    #[test]
    fn build_rejects_unknown_format() {
        let err = DigestConfig::builder().format("Markdown").build().unwrap_err();
        assert!(matches!(err, HandmarkError::UnknownFormat { .. }));
    }

    #[test]
    fn build_rejects_zero_timeout() {
        assert!(DigestConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn temperature_is_clamped() {
        let c = DigestConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn output_format_after_build() {
        let c = DigestConfig::builder().format("xml").build().unwrap();
        assert_eq!(c.output_format().unwrap(), OutputFormat::Xml);
    }

    #[test]
    fn detail_parsing() {
        assert_eq!("HIGH".parse::<ImageDetail>().unwrap(), ImageDetail::High);
        assert!("medium".parse::<ImageDetail>().is_err());
    }
}
