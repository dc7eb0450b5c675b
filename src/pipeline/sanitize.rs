//! Filename sanitisation: turn a free-form title into a safe filename stem.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_]+").unwrap());
static RE_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").unwrap());

/// Normalise `title` into a lowercase, underscore-delimited stem.
///
/// Every run of characters other than ASCII letters, digits and `_` becomes
/// a single `_`, runs of underscores collapse to one, and leading/trailing
/// underscores are dropped. The result matches `^[a-z0-9]+(_[a-z0-9]+)*$`
/// or is empty (for empty, blank or all-punctuation input).
///
/// ```
/// use handmark::pipeline::sanitize::sanitize_filename;
///
/// assert_eq!(sanitize_filename("My Awesome Title"), "my_awesome_title");
/// assert_eq!(sanitize_filename("  ?!  "), "");
/// ```
pub fn sanitize_filename(title: &str) -> String {
    let lower = title.to_lowercase();
    let replaced = RE_UNSAFE.replace_all(&lower, "_");
    let collapsed = RE_UNDERSCORES.replace_all(&replaced, "_");
    collapsed.trim_matches('_').to_string()
}
