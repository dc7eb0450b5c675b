//! Built-in prompts for transcribing a handwritten page.
//!
//! One system/user pair exists per output format. They seed
//! [`crate::format::FormatRegistry::builtin`]; a registry loaded from a JSON
//! file replaces them wholesale.
//!
//! Every user prompt asks the model for a title because the output filename
//! is derived from it. The title must sit where
//! [`crate::pipeline::title`] looks for it: the first heading for Markdown,
//! a top-level `title` key for JSON/YAML, a `<title>` child of the root
//! element for XML.

pub const MARKDOWN_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that transforms handwritten images in Markdown files.";

pub const MARKDOWN_USER_PROMPT: &str = "Give me a Markdown transcription of the text in the image and only this. \
Add a title for it, as a `#` heading that must be the first line of the response. \
Do not describe the image.";

pub const JSON_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that transforms handwritten images into structured JSON documents.";

pub const JSON_USER_PROMPT: &str = "Transcribe the text in the image into a single JSON object and output only the JSON. \
The object must have a top-level \"title\" string summarising the note and a \"content\" field holding the transcribed text; \
use nested objects or arrays for lists and sections. Do not describe the image.";

pub const YAML_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that transforms handwritten images into structured YAML documents.";

pub const YAML_USER_PROMPT: &str = "Transcribe the text in the image into a YAML mapping and output only the YAML. \
The mapping must have a top-level `title` key summarising the note and a `content` key holding the transcribed text; \
use nested mappings or sequences for lists and sections. Do not describe the image.";

pub const XML_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that transforms handwritten images into structured XML documents.";

pub const XML_USER_PROMPT: &str = "Transcribe the text in the image into a well-formed XML document and output only the XML. \
Use a <document> root element whose first child is a <title> element summarising the note, followed by a <content> element \
holding the transcribed text; use nested elements for lists and sections. Do not describe the image.";
