//! Title extraction from a (fence-stripped) model response.
//!
//! Title discovery is best-effort. A response that does not parse, or parses
//! but carries no title, yields `None` and the caller falls back to its
//! default filename; it never aborts the write. Parse errors are therefore
//! kept private to this module ([`ParseFailure`]) and only logged.

use crate::format::OutputFormat;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// Why a structured response could not be searched for a title.
#[derive(Debug, Error)]
enum ParseFailure {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed document: {0}")]
    Malformed(&'static str),
}

/// Extract the document title from `content` according to `format`.
///
/// | Format   | Title source |
/// |----------|--------------|
/// | markdown | first line starting with `#…` followed by whitespace |
/// | json     | top-level string field `title` |
/// | yaml     | top-level string key `title` |
/// | xml      | `<title>` child of the root, or the root if it is `<title>` |
///
/// The result is trimmed; an empty title is reported as `None`.
pub fn extract_title(content: &str, format: OutputFormat) -> Option<String> {
    let parsed = match format {
        OutputFormat::Markdown => Ok(markdown_title(content)),
        OutputFormat::Json => json_title(content),
        OutputFormat::Yaml => yaml_title(content),
        OutputFormat::Xml => xml_title(content),
    };

    let title = parsed
        .inspect_err(|e| debug!("No {} title: {}", format, e))
        .ok()
        .flatten()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    match title {
        Some(ref t) => debug!("Extracted {} title: {:?}", format, t),
        None => debug!("No {} title found", format),
    }
    title
}

// ── Markdown ─────────────────────────────────────────────────────────────────

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#+\s+(.*)$").unwrap());

fn markdown_title(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| RE_HEADING.captures(line))
        .map(|caps| caps[1].to_string())
}

// ── JSON ─────────────────────────────────────────────────────────────────────

fn json_title(content: &str) -> Result<Option<String>, ParseFailure> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    Ok(value
        .get("title")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string))
}

// ── YAML ─────────────────────────────────────────────────────────────────────

fn yaml_title(content: &str) -> Result<Option<String>, ParseFailure> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    let Some(mapping) = value.as_mapping() else {
        return Ok(None);
    };
    Ok(mapping
        .get("title")
        .and_then(serde_yaml::Value::as_str)
        .map(str::to_string))
}

// ── XML ──────────────────────────────────────────────────────────────────────

/// Walk the whole document so that malformed XML is rejected even when the
/// title appears before the error.
///
/// Text is read untrimmed so that mixed content such as
/// `<title>Foo <b>bar</b></title>` keeps its inner spacing; the caller trims
/// the final string.
fn xml_title(content: &str) -> Result<Option<String>, ParseFailure> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(false);

    let mut depth: usize = 0;
    let mut root_seen = false;
    // Depth of the <title> element currently being read, if any.
    let mut capturing: Option<usize> = None;
    let mut captured = String::new();
    let mut title: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth == 0 {
                    if root_seen {
                        return Err(ParseFailure::Malformed("multiple root elements"));
                    }
                    root_seen = true;
                }
                if capturing.is_none() && title.is_none() && depth <= 1 && is_title(e.name().as_ref()) {
                    capturing = Some(depth);
                    captured.clear();
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 0 {
                    if root_seen {
                        return Err(ParseFailure::Malformed("multiple root elements"));
                    }
                    root_seen = true;
                }
                if capturing.is_none() && title.is_none() && depth <= 1 && is_title(e.name().as_ref()) {
                    title = Some(String::new());
                }
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(ParseFailure::Malformed("unexpected closing tag"))?;
                if capturing == Some(depth) {
                    capturing = None;
                    title = Some(std::mem::take(&mut captured));
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                if depth == 0 {
                    if !text.trim().is_empty() {
                        return Err(ParseFailure::Malformed("text outside the root element"));
                    }
                } else if capturing.is_some() {
                    captured.push_str(&text);
                }
            }
            Event::CData(e) => {
                if depth == 0 {
                    return Err(ParseFailure::Malformed("CDATA outside the root element"));
                }
                if capturing.is_some() {
                    captured.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        return Err(ParseFailure::Malformed("no root element"));
    }
    if depth != 0 {
        return Err(ParseFailure::Malformed("unclosed element"));
    }
    Ok(title)
}

fn is_title(name: &[u8]) -> bool {
    name == b"title"
}
