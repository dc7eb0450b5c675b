//! Image encoding: raw image bytes → base64 wrapped in `ImageData`.
//!
//! VLM APIs (OpenAI, Anthropic, Gemini) accept images as base64 data-URIs
//! embedded in the JSON request body. The file is forwarded as-is; the
//! handwriting is already rasterised, so re-encoding would only cost time.

use crate::config::ImageDetail;
use crate::pipeline::input::ImageInput;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// Encode an image for the VLM API at the requested detail level.
///
/// `low` sends a single 512 px overview tile, which is enough for a page of
/// handwriting and costs a fraction of the tokens. `high` enables the tiled
/// view for dense or small writing.
pub fn encode_image(image: &ImageInput, detail: ImageDetail) -> ImageData {
    let b64 = STANDARD.encode(&image.bytes);
    debug!(
        "Encoded {} → {} bytes base64 (detail: {})",
        image.path.display(),
        b64.len(),
        detail.as_str()
    );

    ImageData::new(b64, image.mime_type()).with_detail(detail.as_str())
}
