//! VLM interaction: the completion collaborator.
//!
//! The response pipeline only needs "prompts + image in, text out", so it
//! talks to the model through the small [`CompletionClient`] trait. Tests
//! plug in a canned client; production uses [`VisionClient`], which drives an
//! `edgequake_llm` provider.
//!
//! ## No retries
//!
//! A failed call is reported once and propagates to the caller unchanged.
//! Whether to retry a whole digest is the caller's decision.
//!
//! ## Blocking API
//!
//! The providers are async. [`VisionClient`] owns a private current-thread
//! tokio runtime and blocks on each call, keeping the library API synchronous.
//! Do not call it from inside another tokio runtime.

use crate::config::{DigestConfig, ImageDetail};
use crate::error::HandmarkError;
use crate::models::{api_key_env, find_model};
use crate::pipeline::encode::encode_image;
use crate::pipeline::input::ImageInput;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One completion request: both prompts, the image and the model to ask.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
    pub image: &'a ImageInput,
    pub model: &'a str,
}

/// Anything that can turn a [`CompletionRequest`] into response text.
///
/// Implementations report a missing or rejected credential as
/// [`HandmarkError::AuthError`] and every other remote failure as
/// [`HandmarkError::LlmApiError`] or [`HandmarkError::ApiTimeout`].
pub trait CompletionClient: Send + Sync {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, HandmarkError>;
}

impl<T: CompletionClient + ?Sized> CompletionClient for Arc<T> {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, HandmarkError> {
        (**self).complete(request)
    }
}

/// [`CompletionClient`] backed by an `edgequake_llm` provider.
pub struct VisionClient {
    provider: Option<Arc<dyn LLMProvider>>,
    provider_name: Option<String>,
    options: CompletionOptions,
    detail: ImageDetail,
    timeout: Duration,
    runtime: tokio::runtime::Runtime,
}

impl VisionClient {
    pub fn new(config: &DigestConfig) -> Result<Self, HandmarkError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HandmarkError::Internal(format!("Failed to create tokio runtime: {e}")))?;

        Ok(Self {
            provider: config.provider.clone(),
            provider_name: config.provider_name.clone(),
            options: build_options(config),
            detail: config.image_detail,
            timeout: Duration::from_secs(config.api_timeout_secs),
            runtime,
        })
    }
}

impl CompletionClient for VisionClient {
    /// ## Message Layout
    ///
    /// 1. **System message** — the format's system prompt
    /// 2. **User message** — the format's user prompt with the image attached
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, HandmarkError> {
        let provider = resolve_provider(
            self.provider.as_ref(),
            self.provider_name.as_deref(),
            request.model,
        )?;

        let messages = vec![
            ChatMessage::system(request.system_prompt),
            ChatMessage::user_with_images(
                request.user_prompt,
                vec![encode_image(request.image, self.detail)],
            ),
        ];

        info!("Requesting transcription from {}", request.model);
        let start = Instant::now();
        let outcome = self.runtime.block_on(tokio::time::timeout(
            self.timeout,
            provider.chat(&messages, Some(&self.options)),
        ));

        let response = match outcome {
            Err(_elapsed) => {
                return Err(HandmarkError::ApiTimeout {
                    secs: self.timeout.as_secs(),
                })
            }
            Ok(Err(e)) => return Err(classify_error(request.model, &e.to_string())),
            Ok(Ok(response)) => response,
        };

        debug!(
            "{} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Build `CompletionOptions` from the digest config.
fn build_options(config: &DigestConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Map a provider error to the fatal error kind the caller can act on.
fn classify_error(model: &str, message: &str) -> HandmarkError {
    let lower = message.to_ascii_lowercase();
    let is_auth = ["401", "403", "unauthorized", "forbidden", "invalid api key", "invalid_api_key"]
        .iter()
        .any(|needle| lower.contains(needle));

    if is_auth {
        HandmarkError::AuthError {
            provider: find_model(model).map_or("unknown", |m| m.provider).to_string(),
            detail: message.to_string(),
        }
    } else {
        HandmarkError::LlmApiError {
            message: message.to_string(),
        }
    }
}

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, HandmarkError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        let hint = match api_key_env(provider_name) {
            Some(var) => format!("{e}\nSet {var} or run `handmark auth --provider {provider_name}`."),
            None => format!("{e}"),
        };
        HandmarkError::AuthError {
            provider: provider_name.to_string(),
            detail: hint,
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** — used as-is (tests, custom middleware).
/// 2. **Named provider** — `provider_name` + the requested model.
/// 3. **Environment pair** — `EDGEQUAKE_LLM_PROVIDER` (+ `EDGEQUAKE_MODEL`,
///    else the requested model).
/// 4. **Catalogue** — the provider the model catalogue lists for the model.
/// 5. **OpenAI key present** — `openai` with the requested model.
/// 6. **Full auto-detection** — `ProviderFactory::from_env`.
///
/// A provider that cannot be created for lack of credentials yields
/// [`HandmarkError::AuthError`].
pub fn resolve_provider(
    provider: Option<&Arc<dyn LLMProvider>>,
    provider_name: Option<&str>,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, HandmarkError> {
    if let Some(provider) = provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(name) = provider_name {
        return create_vision_provider(name, model);
    }

    if let Ok(prov) = std::env::var("EDGEQUAKE_LLM_PROVIDER") {
        if !prov.is_empty() {
            let env_model = std::env::var("EDGEQUAKE_MODEL").unwrap_or_default();
            let model = if env_model.is_empty() { model } else { &env_model };
            return create_vision_provider(&prov, model);
        }
    }

    if let Some(info) = find_model(model) {
        return create_vision_provider(info.provider, model);
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_vision_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| HandmarkError::AuthError {
            provider: "auto".to_string(),
            detail: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or run `handmark auth`.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
