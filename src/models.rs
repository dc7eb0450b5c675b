//! Catalogue of vision-capable models known to work for handwriting.
//!
//! The list backs the interactive `handmark conf` menu. Any other model id
//! the provider accepts can still be passed explicitly.

use serde::Serialize;

/// Model used when neither the caller nor the saved settings choose one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// A selectable vision model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Identifier passed to the provider.
    pub id: &'static str,
    pub name: &'static str,
    /// edgequake-llm provider name.
    pub provider: &'static str,
    /// Rough cost, input/output per 1M tokens.
    pub pricing: &'static str,
}

const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "gpt-4o",
        name: "GPT-4o",
        provider: "openai",
        pricing: "$2.50 / $10.00",
    },
    ModelInfo {
        id: "gpt-4o-mini",
        name: "GPT-4o mini",
        provider: "openai",
        pricing: "$0.15 / $0.60",
    },
    ModelInfo {
        id: "gpt-4.1",
        name: "GPT-4.1",
        provider: "openai",
        pricing: "$2.00 / $8.00",
    },
    ModelInfo {
        id: "gpt-4.1-mini",
        name: "GPT-4.1 mini",
        provider: "openai",
        pricing: "$0.40 / $1.60",
    },
    ModelInfo {
        id: "gpt-4.1-nano",
        name: "GPT-4.1 nano",
        provider: "openai",
        pricing: "$0.10 / $0.40",
    },
    ModelInfo {
        id: "claude-sonnet-4-20250514",
        name: "Claude Sonnet 4",
        provider: "anthropic",
        pricing: "$3.00 / $15.00",
    },
    ModelInfo {
        id: "gemini-2.0-flash",
        name: "Gemini 2.0 Flash",
        provider: "gemini",
        pricing: "$0.10 / $0.40",
    },
    ModelInfo {
        id: "gemini-2.5-pro",
        name: "Gemini 2.5 Pro",
        provider: "gemini",
        pricing: "$1.25 / $10.00",
    },
    ModelInfo {
        id: "llama3.2-vision",
        name: "Llama 3.2 Vision (local)",
        provider: "ollama",
        pricing: "free",
    },
];

pub fn available_models() -> &'static [ModelInfo] {
    MODELS
}

pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.id == id)
}

/// Environment variable holding the API key for `provider`.
///
/// `None` for providers that need no key (local Ollama) or that this crate
/// does not know about.
pub fn api_key_env(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("OPENAI_API_KEY"),
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        "gemini" => Some("GEMINI_API_KEY"),
        "mistral" => Some("MISTRAL_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_listed() {
        let m = find_model(DEFAULT_MODEL).expect("default model in catalogue");
        assert_eq!(m.provider, "openai");
    }

    #[test]
    fn ids_are_unique() {
        let mut ids: Vec<_> = available_models().iter().map(|m| m.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), available_models().len());
    }

    #[test]
    fn every_keyed_provider_has_env_var() {
        for m in available_models().iter().filter(|m| m.provider != "ollama") {
            assert!(api_key_env(m.provider).is_some(), "{}", m.provider);
        }
        assert_eq!(api_key_env("ollama"), None);
    }
}
