//! Pipeline stages for transcribing a handwritten page.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own. [`crate::response::ResponsePipeline`] strings them together.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ llm ──▶ fence ──▶ title ──▶ sanitize
//! (image)   (base64)   (VLM)   (strip)   (parse)   (stem)
//! ```
//!
//! 1. [`input`]    — read the image and sniff its format
//! 2. [`encode`]   — base64-wrap it for the multimodal request body
//! 3. [`llm`]      — the completion call; the only stage with network I/O
//! 4. [`fence`]    — remove a code fence wrapping the whole response
//! 5. [`title`]    — find a title in the response, per output format
//! 6. [`sanitize`] — turn the title into a safe filename stem

pub mod encode;
pub mod fence;
pub mod input;
pub mod llm;
pub mod sanitize;
pub mod title;
