//! # handmark
//!
//! Transcribe a photo of handwritten notes into Markdown, JSON, YAML or XML
//! using a Vision Language Model, and file it under a name taken from the
//! note's own title.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image
//!  │
//!  ├─ 1. Input     validate the file and sniff its format
//!  ├─ 2. VLM       one completion call with the format's prompts + the image
//!  ├─ 3. Fence     strip a ```json / ```yaml … fence wrapping the answer
//!  ├─ 4. Title     first heading, `title` key, or <title> element
//!  ├─ 5. Sanitize  "My Awesome Title" → my_awesome_title
//!  └─ 6. Output    <dest>/<stem><ext>, or <dest>/<fallback> without a title
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use handmark::{digest, DigestConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = DigestConfig::builder().format("markdown").build()?;
//!     let path = digest("notes.jpg", "./notes", None, &config)?;
//!     println!("{}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `handmark` binary and the [`settings`] module |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! handmark = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod digest;
pub mod error;
pub mod format;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod response;
#[cfg(feature = "cli")]
pub mod settings;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DigestConfig, DigestConfigBuilder, ImageDetail};
pub use digest::{digest, load_registry};
pub use error::HandmarkError;
pub use format::{FormatProfile, FormatRegistry, OutputFormat, SerializationOptions};
pub use models::{available_models, ModelInfo, DEFAULT_MODEL};
pub use pipeline::fence::strip_code_fence;
pub use pipeline::input::ImageInput;
pub use pipeline::llm::{CompletionClient, CompletionRequest, VisionClient};
pub use pipeline::sanitize::sanitize_filename;
pub use pipeline::title::extract_title;
pub use response::ResponsePipeline;
