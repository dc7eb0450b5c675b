//! Code-fence stripping for model responses.
//!
//! Models are told to answer with the document only, yet they regularly wrap
//! it in a fenced block such as ` ```yaml … ``` `. A fence is removed only
//! when it encloses the *whole* response and carries the expected language
//! tag; anything else (a fence in the middle of a Markdown note, a fence
//! tagged with another language) is content and is left alone.

use regex::Regex;
use tracing::debug;

/// Remove an outer fenced block tagged `language_tag`.
///
/// The trimmed input must start with ` ``` ` immediately followed by the tag
/// (ASCII case-insensitive) and a newline, and end with ` ``` `. The interior
/// is returned trimmed. Fences wrapped in further fences of the same tag are
/// peeled in one call, so the result is a fixed point:
/// `strip_code_fence(strip_code_fence(x, t), t) == strip_code_fence(x, t)`.
///
/// Input that does not match is returned unchanged (not even trimmed).
pub fn strip_code_fence(text: &str, language_tag: &str) -> String {
    let Ok(re) = fence_regex(language_tag) else {
        return text.to_string();
    };

    let mut current: Option<String> = None;
    loop {
        let candidate = current.as_deref().unwrap_or(text).trim();
        let Some(caps) = re.captures(candidate) else {
            break;
        };
        let inner = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
        debug!(
            "Stripped ```{} fence ({} → {} bytes)",
            language_tag,
            candidate.len(),
            inner.len()
        );
        current = Some(inner);
    }

    current.unwrap_or_else(|| text.to_string())
}

fn fence_regex(language_tag: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?s)\A```(?i:{})\r?\n(.*)```\z",
        regex::escape(language_tag)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_yaml_fence() {
        let input = "```yaml\ntitle: Test\ncontent: data\n```";
        assert_eq!(strip_code_fence(input, "yaml"), "title: Test\ncontent: data");
    }

    #[test]
    fn test_strip_json_fence() {
        let input = "```json\n{\"title\": \"Test\"}\n```";
        assert_eq!(strip_code_fence(input, "json"), "{\"title\": \"Test\"}");
    }

    #[test]
    fn test_tag_is_case_insensitive() {
        let input = "```JSON\n{}\n```";
        assert_eq!(strip_code_fence(input, "json"), "{}");
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let input = "\n\n  ```xml\n<a/>\n```  \n";
        assert_eq!(strip_code_fence(input, "xml"), "<a/>");
    }

    #[test]
    fn test_no_fences_passthrough() {
        let plain = "title: Test\ncontent: data";
        assert_eq!(strip_code_fence(plain, "yaml"), plain);
    }

    #[test]
    fn test_unmatched_input_not_trimmed() {
        let plain = "  # Title\nbody\n";
        assert_eq!(strip_code_fence(plain, "markdown"), plain);
    }

    #[test]
    fn test_other_language_untouched() {
        let input = "```json\n{}\n```";
        assert_eq!(strip_code_fence(input, "yaml"), input);
    }

    #[test]
    fn test_untagged_fence_untouched() {
        let input = "```\n# Hello\n```";
        assert_eq!(strip_code_fence(input, "markdown"), input);
    }

    #[test]
    fn test_tag_prefix_not_accepted() {
        // ```yamlx is not a yaml fence
        let input = "```yamlx\na: 1\n```";
        assert_eq!(strip_code_fence(input, "yaml"), input);
    }

    #[test]
    fn test_missing_closer_untouched() {
        let input = "```yaml\na: 1\n";
        assert_eq!(strip_code_fence(input, "yaml"), input);
    }

    #[test]
    fn test_inner_fence_kept_when_not_outer() {
        let input = "# Notes\n\n```python\nprint(1)\n```";
        assert_eq!(strip_code_fence(input, "markdown"), input);
    }

    #[test]
    fn test_empty_fence() {
        assert_eq!(strip_code_fence("```yaml\n```", "yaml"), "");
    }

    #[test]
    fn test_idempotent() {
        let cases = [
            "```yaml\na: 1\n```",
            "```yaml\n```yaml\na: 1\n```\n```",
            "plain text",
            "  ```yaml\n  spaced  \n```",
            "",
            "```",
        ];
        for case in cases {
            let once = strip_code_fence(case, "yaml");
            assert_eq!(strip_code_fence(&once, "yaml"), once, "input: {case:?}");
        }
    }

    #[test]
    fn test_regex_metacharacters_in_tag() {
        let input = "```c++\nint x;\n```";
        assert_eq!(strip_code_fence(input, "c++"), "int x;");
    }
}
