//! Format registry: the behavioural profile of each output format.
//!
//! The set of formats is closed ([`OutputFormat`]), so a registry always holds
//! exactly one [`FormatProfile`] per variant. Anything that could make that
//! untrue (a missing entry, an unknown name, a malformed extension) is
//! rejected while the registry is built; once constructed, lookups by
//! [`OutputFormat`] cannot fail and the registry is never mutated.
//!
//! A registry comes either from [`FormatRegistry::builtin`] or from a JSON
//! document of the form:
//!
//! ```json
//! {
//!   "output_formats": {
//!     "markdown": {
//!       "system_message_content": "...",
//!       "user_message_content": "...",
//!       "file_extension": ".md",
//!       "content_type": "text/markdown"
//!     },
//!     "json": { "...": "...", "pretty_print": true, "ensure_ascii": false }
//!   },
//!   "default_format": "markdown"
//! }
//! ```

use crate::error::HandmarkError;
use crate::prompts;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// The supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
    Yaml,
    Xml,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Markdown,
        OutputFormat::Json,
        OutputFormat::Yaml,
        OutputFormat::Xml,
    ];

    /// Registry name of the format.
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Xml => "xml",
        }
    }

    /// Language tag models put on a code fence wrapping this format.
    pub fn fence_tag(self) -> &'static str {
        self.name()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = HandmarkError;

    /// Exact, case-sensitive match against the four registry names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| HandmarkError::UnknownFormat { name: s.to_string() })
    }
}

/// Format-specific serialisation flags.
///
/// The response is written exactly as the model produced it, so these flags
/// do not re-serialise anything. They describe the shape the model is asked
/// for (see [`FormatProfile::render_user_prompt`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretty_print: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensure_ascii: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_unicode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_flow_style: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl SerializationOptions {
    /// Formatting hints for the model, one sentence per flag that is set.
    pub fn hints(&self, format: OutputFormat) -> Vec<String> {
        let mut hints = Vec::new();
        if let Some(pretty) = self.pretty_print {
            hints.push(if pretty {
                "Indent nested structures for readability.".to_string()
            } else {
                "Keep the output compact, without extra indentation.".to_string()
            });
        }
        match self.ensure_ascii {
            Some(true) => hints.push("Escape every non-ASCII character.".to_string()),
            Some(false) => hints.push("Keep non-ASCII characters as they are.".to_string()),
            None => {}
        }
        if self.allow_unicode == Some(true) && self.ensure_ascii.is_none() {
            hints.push("Unicode characters may be written directly.".to_string());
        }
        if format == OutputFormat::Yaml {
            match self.default_flow_style {
                Some(false) => hints.push("Use block style, not flow style.".to_string()),
                Some(true) => hints.push("Use flow style for collections.".to_string()),
                None => {}
            }
        }
        if let Some(ref enc) = self.encoding {
            if format == OutputFormat::Xml {
                hints.push(format!(
                    "Start with an XML declaration using encoding=\"{enc}\"."
                ));
            }
        }
        hints
    }
}

/// Behavioural profile of one output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatProfile {
    pub format: OutputFormat,
    pub system_prompt: String,
    pub user_prompt: String,
    /// File extension including its leading dot, e.g. `".md"`.
    pub file_extension: String,
    pub content_type: String,
    pub options: SerializationOptions,
}

impl FormatProfile {
    pub fn name(&self) -> &'static str {
        self.format.name()
    }

    /// The user prompt followed by the formatting hints from [`Self::options`].
    pub fn render_user_prompt(&self) -> String {
        let hints = self.options.hints(self.format);
        if hints.is_empty() {
            self.user_prompt.clone()
        } else {
            format!("{} {}", self.user_prompt.trim_end(), hints.join(" "))
        }
    }

    /// Default output filename when no title could be derived.
    pub fn default_filename(&self) -> String {
        format!("response{}", self.file_extension)
    }
}

// ── Configuration document ───────────────────────────────────────────────

/// One entry of the `output_formats` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatEntry {
    pub system_message_content: String,
    pub user_message_content: String,
    pub file_extension: String,
    pub content_type: String,
    #[serde(flatten)]
    pub options: SerializationOptions,
}

/// The registry configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub output_formats: HashMap<String, FormatEntry>,
    pub default_format: String,
}

// ── Registry ─────────────────────────────────────────────────────────────

/// Read-only map from format to profile, complete by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRegistry {
    markdown: FormatProfile,
    json: FormatProfile,
    yaml: FormatProfile,
    xml: FormatProfile,
    default_format: OutputFormat,
}

impl FormatRegistry {
    /// The registry compiled into the crate.
    pub fn builtin() -> Self {
        let profile = |format, system: &str, user: &str, ext: &str, ct: &str, options| FormatProfile {
            format,
            system_prompt: system.to_string(),
            user_prompt: user.to_string(),
            file_extension: ext.to_string(),
            content_type: ct.to_string(),
            options,
        };

        Self {
            markdown: profile(
                OutputFormat::Markdown,
                prompts::MARKDOWN_SYSTEM_PROMPT,
                prompts::MARKDOWN_USER_PROMPT,
                ".md",
                "text/markdown",
                SerializationOptions::default(),
            ),
            json: profile(
                OutputFormat::Json,
                prompts::JSON_SYSTEM_PROMPT,
                prompts::JSON_USER_PROMPT,
                ".json",
                "application/json",
                SerializationOptions {
                    pretty_print: Some(true),
                    ensure_ascii: Some(false),
                    ..Default::default()
                },
            ),
            yaml: profile(
                OutputFormat::Yaml,
                prompts::YAML_SYSTEM_PROMPT,
                prompts::YAML_USER_PROMPT,
                ".yaml",
                "application/x-yaml",
                SerializationOptions {
                    default_flow_style: Some(false),
                    allow_unicode: Some(true),
                    ..Default::default()
                },
            ),
            xml: profile(
                OutputFormat::Xml,
                prompts::XML_SYSTEM_PROMPT,
                prompts::XML_USER_PROMPT,
                ".xml",
                "application/xml",
                SerializationOptions {
                    encoding: Some("utf-8".to_string()),
                    pretty_print: Some(true),
                    ..Default::default()
                },
            ),
            default_format: OutputFormat::Markdown,
        }
    }

    /// Build a registry from a parsed configuration document.
    ///
    /// Fails when any of the four formats is missing, an unknown format name
    /// is present, an extension lacks its leading dot, or `default_format`
    /// does not name a known format.
    pub fn from_config(config: RegistryConfig) -> Result<Self, HandmarkError> {
        let mut entries: HashMap<OutputFormat, FormatEntry> = HashMap::new();
        for (name, entry) in config.output_formats {
            let format: OutputFormat = name.parse()?;
            validate_entry(format, &entry)?;
            entries.insert(format, entry);
        }

        let mut take = |format: OutputFormat| -> Result<FormatProfile, HandmarkError> {
            let entry = entries.remove(&format).ok_or_else(|| {
                HandmarkError::InvalidRegistry(format!(
                    "missing entry for format '{}'",
                    format.name()
                ))
            })?;
            Ok(FormatProfile {
                format,
                system_prompt: entry.system_message_content,
                user_prompt: entry.user_message_content,
                file_extension: entry.file_extension,
                content_type: entry.content_type,
                options: entry.options,
            })
        };

        let registry = Self {
            markdown: take(OutputFormat::Markdown)?,
            json: take(OutputFormat::Json)?,
            yaml: take(OutputFormat::Yaml)?,
            xml: take(OutputFormat::Xml)?,
            default_format: config.default_format.parse()?,
        };
        debug!(
            "Format registry loaded (default: {})",
            registry.default_format
        );
        Ok(registry)
    }

    /// Parse a registry from its JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, HandmarkError> {
        let config: RegistryConfig = serde_json::from_str(json)
            .map_err(|e| HandmarkError::InvalidRegistry(format!("{e}")))?;
        Self::from_config(config)
    }

    /// Load a registry from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HandmarkError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            HandmarkError::InvalidRegistry(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Look up a profile by its exact, case-sensitive name.
    pub fn resolve(&self, name: &str) -> Result<&FormatProfile, HandmarkError> {
        let format: OutputFormat = name.parse()?;
        Ok(self.get(format))
    }

    pub fn get(&self, format: OutputFormat) -> &FormatProfile {
        match format {
            OutputFormat::Markdown => &self.markdown,
            OutputFormat::Json => &self.json,
            OutputFormat::Yaml => &self.yaml,
            OutputFormat::Xml => &self.xml,
        }
    }

    /// Stored extension for `format`, including its leading dot.
    pub fn extension_for(&self, format: OutputFormat) -> &str {
        &self.get(format).file_extension
    }

    pub fn default_format(&self) -> OutputFormat {
        self.default_format
    }

    pub fn default_profile(&self) -> &FormatProfile {
        self.get(self.default_format)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &FormatProfile> {
        OutputFormat::ALL.into_iter().map(|f| self.get(f))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_entry(format: OutputFormat, entry: &FormatEntry) -> Result<(), HandmarkError> {
    let ext = &entry.file_extension;
    if ext.len() < 2 || !ext.starts_with('.') || ext.contains(['/', '\\']) {
        return Err(HandmarkError::InvalidRegistry(format!(
            "format '{}' has invalid file_extension {:?} (expected e.g. \".{}\")",
            format.name(),
            ext,
            format.name()
        )));
    }
    if entry.content_type.trim().is_empty() {
        return Err(HandmarkError::InvalidRegistry(format!(
            "format '{}' has an empty content_type",
            format.name()
        )));
    }
    Ok(())
}
