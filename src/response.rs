//! Response pipeline: one image in, one named document on disk.
//!
//! ```text
//! complete ──▶ strip fence ──▶ extract title ──▶ sanitize ──▶ write
//!  (VLM)       (format tag)     (per format)     (stem+ext)   (dest/filename)
//! ```
//!
//! The pipeline holds only what it was constructed with (image, format
//! profile, model, client); every call to [`ResponsePipeline::write_response`]
//! performs exactly one completion and one file write. Two pipelines writing
//! the same destination file concurrently are not coordinated.

use crate::error::HandmarkError;
use crate::format::FormatProfile;
use crate::pipeline::fence::strip_code_fence;
use crate::pipeline::input::{resolve_image, ImageInput};
use crate::pipeline::llm::{CompletionClient, CompletionRequest};
use crate::pipeline::sanitize::sanitize_filename;
use crate::pipeline::title::extract_title;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Transcribes one image in one output format.
pub struct ResponsePipeline<C> {
    image: ImageInput,
    profile: FormatProfile,
    model: String,
    client: C,
}

impl<C: CompletionClient> ResponsePipeline<C> {
    /// Validate and load the image at `image_path`.
    pub fn new(
        image_path: impl AsRef<Path>,
        profile: FormatProfile,
        model: impl Into<String>,
        client: C,
    ) -> Result<Self, HandmarkError> {
        let image = resolve_image(image_path)?;
        Ok(Self::from_image(image, profile, model, client))
    }

    /// Build a pipeline around an already resolved image.
    pub fn from_image(
        image: ImageInput,
        profile: FormatProfile,
        model: impl Into<String>,
        client: C,
    ) -> Self {
        Self {
            image,
            profile,
            model: model.into(),
            client,
        }
    }

    pub fn profile(&self) -> &FormatProfile {
        &self.profile
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn image(&self) -> &ImageInput {
        &self.image
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Ask the model for a transcription. Failures propagate unchanged.
    pub fn get_response(&self) -> Result<String, HandmarkError> {
        let user_prompt = self.profile.render_user_prompt();
        let request = CompletionRequest {
            system_prompt: &self.profile.system_prompt,
            user_prompt: &user_prompt,
            image: &self.image,
            model: &self.model,
        };
        self.client.complete(&request)
    }

    /// Transcribe the image and write it under `dest_path`.
    ///
    /// The filename is the sanitised title plus the format's extension, or
    /// `fallback_filename` verbatim when no usable title exists. The
    /// fence-stripped response is written as UTF-8, replacing any existing
    /// file. Returns the absolute path written.
    ///
    /// `fallback_filename` must be a single plain path component; an absolute
    /// path or one with `..` fails with [`HandmarkError::InvalidFilename`]
    /// before the model is called.
    pub fn write_response(
        &self,
        dest_path: impl AsRef<Path>,
        fallback_filename: &str,
    ) -> Result<PathBuf, HandmarkError> {
        check_fallback(fallback_filename)?;
        let raw = self.get_response()?;
        self.save_response(&raw, dest_path, fallback_filename)
    }

    /// Everything [`Self::write_response`] does after the completion call.
    pub fn save_response(
        &self,
        raw: &str,
        dest_path: impl AsRef<Path>,
        fallback_filename: &str,
    ) -> Result<PathBuf, HandmarkError> {
        check_fallback(fallback_filename)?;
        let content = strip_code_fence(raw, self.profile.format.fence_tag());
        let filename = self.output_filename(&content, fallback_filename);
        write_output(dest_path.as_ref(), &filename, &content)
    }

    /// Filename for `content`: `<stem><ext>` or the fallback.
    pub fn output_filename(&self, content: &str, fallback_filename: &str) -> String {
        let stem = extract_title(content, self.profile.format)
            .map(|title| sanitize_filename(&title))
            .filter(|stem| !stem.is_empty());

        match stem {
            Some(stem) => format!("{}{}", stem, self.profile.file_extension),
            None => {
                debug!("No usable title; falling back to {:?}", fallback_filename);
                fallback_filename.to_string()
            }
        }
    }
}

/// The fallback is joined under the destination, so it may not name a
/// directory, a root or a parent.
fn check_fallback(name: &str) -> Result<(), HandmarkError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(HandmarkError::InvalidFilename {
            name: name.to_string(),
        }),
    }
}

/// Create `dest_path` if needed and write `content` to `dest_path/filename`.
fn write_output(dest_path: &Path, filename: &str, content: &str) -> Result<PathBuf, HandmarkError> {
    std::fs::create_dir_all(dest_path).map_err(|e| HandmarkError::OutputDirFailed {
        path: dest_path.to_path_buf(),
        source: e,
    })?;

    let joined = dest_path.join(filename);
    let path = std::path::absolute(&joined).map_err(|e| HandmarkError::OutputWriteFailed {
        path: joined.clone(),
        source: e,
    })?;

    std::fs::write(&path, content).map_err(|e| HandmarkError::OutputWriteFailed {
        path: path.clone(),
        source: e,
    })?;

    info!("Wrote {} ({} bytes)", path.display(), content.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FormatRegistry, OutputFormat};
    use image::ImageFormat;

    struct Canned(&'static str);

    impl CompletionClient for Canned {
        fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String, HandmarkError> {
            Ok(self.0.to_string())
        }
    }

    fn pipeline(format: OutputFormat, response: &'static str) -> ResponsePipeline<Canned> {
        let image = ImageInput {
            path: PathBuf::from("note.png"),
            format: ImageFormat::Png,
            bytes: vec![0x89, b'P', b'N', b'G'],
        };
        let profile = FormatRegistry::builtin().get(format).clone();
        ResponsePipeline::from_image(image, profile, "gpt-4o", Canned(response))
    }

    #[test]
    fn filename_from_markdown_title() {
        let p = pipeline(OutputFormat::Markdown, "");
        assert_eq!(
            p.output_filename("# My Awesome Title\nThis is the content.", "fallback.md"),
            "my_awesome_title.md"
        );
    }

    #[test]
    fn fallback_used_verbatim() {
        let p = pipeline(OutputFormat::Markdown, "");
        assert_eq!(p.output_filename("no heading here", "Fallback File.TXT"), "Fallback File.TXT");
    }

    #[test]
    fn punctuation_only_title_falls_back() {
        let p = pipeline(OutputFormat::Json, "");
        assert_eq!(p.output_filename(r#"{"title": "?!"}"#, "fallback.json"), "fallback.json");
    }

    #[test]
    fn fallback_must_stay_under_destination() {
        let p = pipeline(OutputFormat::Markdown, "no title");
        let dest = std::env::temp_dir();
        for bad in ["/tmp/x.md", "../x.md", "sub/../../x.md", "notes/x.md", "", ".", ".."] {
            let err = p.save_response("no title", &dest, bad).unwrap_err();
            assert!(matches!(err, HandmarkError::InvalidFilename { .. }), "{bad:?}: {err}");
        }
    }

    #[test]
    fn bad_fallback_rejected_before_completion() {
        struct Unreachable;
        impl CompletionClient for Unreachable {
            fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String, HandmarkError> {
                panic!("completion must not run");
            }
        }
        let image = ImageInput {
            path: PathBuf::from("note.png"),
            format: ImageFormat::Png,
            bytes: vec![0x89, b'P', b'N', b'G'],
        };
        let profile = FormatRegistry::builtin().get(OutputFormat::Json).clone();
        let p = ResponsePipeline::from_image(image, profile, "gpt-4o", Unreachable);
        let err = p.write_response(std::env::temp_dir(), "/etc/x.json").unwrap_err();
        assert!(matches!(err, HandmarkError::InvalidFilename { .. }));
    }

    #[test]
    fn get_response_returns_raw_text() {
        let p = pipeline(OutputFormat::Yaml, "```yaml\ntitle: x\n```");
        assert_eq!(p.get_response().unwrap(), "```yaml\ntitle: x\n```");
    }
}
