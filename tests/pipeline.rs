//! Offline integration tests for the response pipeline.
//!
//! A canned `CompletionClient` stands in for the vision model so every
//! scenario runs without network access: the image is a real file on disk,
//! the output lands in a temporary directory.

use handmark::{
    CompletionClient, CompletionRequest, FormatRegistry, HandmarkError, OutputFormat,
    ResponsePipeline,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0, 0, 0, 0];

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Returns a fixed reply and remembers the last prompts it was given.
struct Canned {
    reply: Result<String, fn() -> HandmarkError>,
    seen: Mutex<Option<(String, String, String)>>,
}

impl Canned {
    fn ok(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            seen: Mutex::new(None),
        }
    }

    fn failing(make: fn() -> HandmarkError) -> Self {
        Self {
            reply: Err(make),
            seen: Mutex::new(None),
        }
    }
}

impl CompletionClient for Canned {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, HandmarkError> {
        *self.seen.lock().unwrap() = Some((
            request.system_prompt.to_string(),
            request.user_prompt.to_string(),
            request.model.to_string(),
        ));
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(make) => Err(make()),
        }
    }
}

fn write_image(dir: &Path) -> PathBuf {
    let path = dir.join("note.png");
    std::fs::write(&path, PNG_MAGIC).unwrap();
    path
}

fn pipeline(dir: &Path, format: OutputFormat, client: Canned) -> ResponsePipeline<Canned> {
    let profile = FormatRegistry::builtin().get(format).clone();
    ResponsePipeline::new(write_image(dir), profile, "gpt-4o", client).unwrap()
}

// ── Naming and content ───────────────────────────────────────────────────────

#[test]
fn markdown_title_names_the_file() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");
    let p = pipeline(
        tmp.path(),
        OutputFormat::Markdown,
        Canned::ok("```markdown\n# Meeting Notes\n- a\n```"),
    );

    let path = p.write_response(&out, "fallback.md").unwrap();
    assert_eq!(path, std::path::absolute(out.join("meeting_notes.md")).unwrap());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Meeting Notes\n- a");
}

#[test]
fn json_title_names_the_file() {
    let tmp = TempDir::new().unwrap();
    let p = pipeline(
        tmp.path(),
        OutputFormat::Json,
        Canned::ok("```json\n{\"title\": \"Shopping List\", \"content\": \"eggs\"}\n```"),
    );

    let path = p.write_response(tmp.path(), "fallback.json").unwrap();
    assert_eq!(path.file_name().unwrap(), "shopping_list.json");
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "{\"title\": \"Shopping List\", \"content\": \"eggs\"}"
    );
}

#[test]
fn yaml_fence_stripped_before_naming_and_writing() {
    let tmp = TempDir::new().unwrap();
    let p = pipeline(
        tmp.path(),
        OutputFormat::Yaml,
        Canned::ok("```yaml\ntitle: Test\ncontent: data\n```"),
    );

    let path = p.write_response(tmp.path(), "fallback.yaml").unwrap();
    assert_eq!(path.file_name().unwrap(), "test.yaml");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "title: Test\ncontent: data");
}

#[test]
fn xml_title_names_the_file() {
    let tmp = TempDir::new().unwrap();
    let p = pipeline(
        tmp.path(),
        OutputFormat::Xml,
        Canned::ok("```xml\n<document><title>Lab Log #3</title><content>ok</content></document>\n```"),
    );

    let path = p.write_response(tmp.path(), "fallback.xml").unwrap();
    assert_eq!(path.file_name().unwrap(), "lab_log_3.xml");
}

#[test]
fn untitled_response_uses_fallback_verbatim() {
    let tmp = TempDir::new().unwrap();
    let p = pipeline(
        tmp.path(),
        OutputFormat::Markdown,
        Canned::ok("just some words\nno heading"),
    );

    let path = p.write_response(tmp.path(), "Untitled Note.txt").unwrap();
    assert_eq!(path.file_name().unwrap(), "Untitled Note.txt");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "just some words\nno heading");
}

#[test]
fn malformed_json_falls_back_and_keeps_content() {
    let tmp = TempDir::new().unwrap();
    let p = pipeline(
        tmp.path(),
        OutputFormat::Json,
        Canned::ok("```json\n{\"title\": \"Broken\",\n```"),
    );

    let path = p.write_response(tmp.path(), "response.json").unwrap();
    assert_eq!(path.file_name().unwrap(), "response.json");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"title\": \"Broken\",");
}

#[test]
fn malformed_yaml_falls_back_and_keeps_content() {
    let tmp = TempDir::new().unwrap();
    let raw = "title: \"unterminated\ncontent: [a, b";
    let p = pipeline(tmp.path(), OutputFormat::Yaml, Canned::ok(raw));

    let path = p.write_response(tmp.path(), "notes.yaml").unwrap();
    assert_eq!(path.file_name().unwrap(), "notes.yaml");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), raw);
}

#[test]
fn malformed_xml_falls_back_and_keeps_content() {
    let tmp = TempDir::new().unwrap();
    let p = pipeline(
        tmp.path(),
        OutputFormat::Xml,
        Canned::ok("```xml\n<document><title>Test</document>\n```"),
    );

    let path = p.write_response(tmp.path(), "notes.xml").unwrap();
    assert_eq!(path.file_name().unwrap(), "notes.xml");
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "<document><title>Test</document>"
    );
}

#[test]
fn fallback_outside_destination_rejected() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");
    let p = pipeline(tmp.path(), OutputFormat::Markdown, Canned::ok("no heading"));

    let err = p.write_response(&out, "../escape.md").unwrap_err();
    assert!(matches!(err, HandmarkError::InvalidFilename { .. }), "got: {err}");
    assert!(!tmp.path().join("escape.md").exists());
    assert!(!out.exists());
}

#[test]
fn fence_with_other_tag_is_kept() {
    let tmp = TempDir::new().unwrap();
    let raw = "```json\n{\"title\": \"x\"}\n```";
    let p = pipeline(tmp.path(), OutputFormat::Yaml, Canned::ok(raw));

    let path = p.write_response(tmp.path(), "response.yaml").unwrap();
    assert_eq!(path.file_name().unwrap(), "response.yaml");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), raw);
}

// ── Filesystem behaviour ─────────────────────────────────────────────────────

#[test]
fn nested_destination_is_created() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("a/b/c");
    let p = pipeline(tmp.path(), OutputFormat::Markdown, Canned::ok("# Deep\nbody"));

    let path = p.write_response(&out, "fallback.md").unwrap();
    assert!(path.is_absolute());
    assert!(out.join("deep.md").is_file());
}

#[test]
fn existing_file_is_overwritten() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("same.md"), "old content that is longer").unwrap();
    let p = pipeline(tmp.path(), OutputFormat::Markdown, Canned::ok("# Same\nnew"));

    let path = p.write_response(tmp.path(), "fallback.md").unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), "# Same\nnew");
}

#[test]
fn destination_under_a_file_fails() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    let p = pipeline(tmp.path(), OutputFormat::Markdown, Canned::ok("# T"));

    let err = p.write_response(blocker.join("sub"), "fallback.md").unwrap_err();
    assert!(matches!(err, HandmarkError::OutputDirFailed { .. }), "got: {err}");
}

// ── Prompts and errors ───────────────────────────────────────────────────────

#[test]
fn prompts_and_model_reach_the_client() {
    let tmp = TempDir::new().unwrap();
    let p = pipeline(tmp.path(), OutputFormat::Xml, Canned::ok("<t/>"));
    p.get_response().unwrap();

    let profile = FormatRegistry::builtin().get(OutputFormat::Xml).clone();
    let seen = p.client().seen.lock().unwrap().clone().unwrap();
    assert_eq!(seen.0, profile.system_prompt);
    assert_eq!(seen.1, profile.render_user_prompt());
    assert_eq!(seen.2, "gpt-4o");
}

#[test]
fn auth_error_propagates_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");
    let p = pipeline(
        tmp.path(),
        OutputFormat::Markdown,
        Canned::failing(|| HandmarkError::AuthError {
            provider: "openai".into(),
            detail: "401".into(),
        }),
    );

    let err = p.write_response(&out, "fallback.md").unwrap_err();
    assert!(matches!(err, HandmarkError::AuthError { .. }));
    assert!(!out.exists());
}

#[test]
fn api_error_propagates() {
    let tmp = TempDir::new().unwrap();
    let p = pipeline(
        tmp.path(),
        OutputFormat::Json,
        Canned::failing(|| HandmarkError::LlmApiError {
            message: "connection reset".into(),
        }),
    );

    let err = p.write_response(tmp.path(), "fallback.json").unwrap_err();
    assert!(err.is_remote());
}

#[test]
fn missing_image_rejected_at_construction() {
    let tmp = TempDir::new().unwrap();
    let profile = FormatRegistry::builtin().get(OutputFormat::Markdown).clone();
    let result = ResponsePipeline::new(tmp.path().join("nope.png"), profile, "gpt-4o", Canned::ok(""));
    assert!(matches!(result, Err(HandmarkError::ImageNotFound { .. })));
}
