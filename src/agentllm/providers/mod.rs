//! Concrete provider adapters and the string-keyed factory.

pub mod anthropic;
pub mod common;
pub mod minimax;
pub mod openai;

use std::sync::Arc;

use crate::agentllm::error::AgentError;
use crate::agentllm::provider::LlmProvider;

use anthropic::AnthropicProvider;
use minimax::MiniMaxProvider;
use openai::OpenAIProvider;

/// Options accepted by [`create_provider`].
///
/// Which fields are required depends on the provider kind: hosted providers need
/// `api_key`, the open-source adapter needs `base_url` and `model`.
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Per-request timeout in seconds (open-source adapter only; default 60).
    pub timeout: Option<u64>,
    /// Default output-token budget (Anthropic-style providers; 2048 for Claude, 4096 for
    /// MiniMax when unset).
    pub max_tokens: Option<u32>,
}

impl ProviderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = Some(timeout_secs);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn require_api_key(&self, kind: &str) -> Result<&str, AgentError> {
        self.api_key.as_deref().ok_or_else(|| {
            AgentError::Configuration(format!("provider {} requires api_key", kind))
        })
    }
}

/// Create an [`LlmProvider`] from a string-keyed kind.
///
/// | kind | resolves to |
/// |---|---|
/// | `openai` | [`OpenAIProvider`] |
/// | `claude`, `anthropic` | Claude variant of [`AnthropicProvider`] |
/// | `minimax` | [`MiniMaxProvider`] |
/// | `open_source`, `custom` | OpenAI-compatible adapter at a caller-supplied base URL |
///
/// Kind matching is case-insensitive.  Unknown kinds and missing required options fail
/// with [`AgentError::Configuration`].
///
/// # Example
///
/// ```rust
/// use agentllm::providers::{create_provider, ProviderOptions};
///
/// let provider = create_provider(
///     "open_source",
///     ProviderOptions::new()
///         .with_base_url("http://localhost:8000/v1")
///         .with_model("qwen"),
/// )
/// .unwrap();
/// assert_eq!(provider.model_name(), "qwen");
/// ```
pub fn create_provider(
    kind: &str,
    options: ProviderOptions,
) -> Result<Arc<dyn LlmProvider>, AgentError> {
    match kind.to_lowercase().as_str() {
        "openai" => {
            let api_key = options.require_api_key("openai")?;
            let model = options.model.as_deref().unwrap_or(openai::DEFAULT_MODEL);
            let provider = match options.base_url.as_deref() {
                Some(base_url) => OpenAIProvider::with_base_url(api_key, model, base_url),
                None => OpenAIProvider::new(api_key, model),
            };
            Ok(Arc::new(provider))
        }
        "claude" | "anthropic" => {
            let api_key = options.require_api_key(kind)?;
            let provider = AnthropicProvider::new(
                api_key,
                options
                    .model
                    .as_deref()
                    .unwrap_or(anthropic::DEFAULT_CLAUDE_MODEL),
                options
                    .base_url
                    .as_deref()
                    .unwrap_or(anthropic::ANTHROPIC_BASE_URL),
                options
                    .max_tokens
                    .unwrap_or(anthropic::DEFAULT_CLAUDE_MAX_TOKENS),
            );
            Ok(Arc::new(provider))
        }
        "minimax" => {
            let api_key = options.require_api_key("minimax")?;
            let provider = MiniMaxProvider::with_config(
                api_key,
                options
                    .model
                    .as_deref()
                    .unwrap_or(minimax::DEFAULT_MINIMAX_MODEL),
                options
                    .base_url
                    .as_deref()
                    .unwrap_or(minimax::MINIMAX_BASE_URL),
                options
                    .max_tokens
                    .unwrap_or(minimax::DEFAULT_MINIMAX_MAX_TOKENS),
            );
            Ok(Arc::new(provider))
        }
        "open_source" | "custom" => {
            let base_url = options.base_url.as_deref().ok_or_else(|| {
                AgentError::Configuration(format!("provider {} requires base_url", kind))
            })?;
            let model = options.model.as_deref().ok_or_else(|| {
                AgentError::Configuration(format!("provider {} requires model", kind))
            })?;
            Ok(Arc::new(OpenAIProvider::open_source(
                base_url,
                model,
                options.api_key.as_deref(),
                options.timeout,
            )))
        }
        other => Err(AgentError::Configuration(format!(
            "Unknown provider type: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_resolves_aliases() {
        let opts = || ProviderOptions::new().with_api_key("k");
        assert_eq!(
            create_provider("openai", opts()).unwrap().model_name(),
            openai::DEFAULT_MODEL
        );
        assert_eq!(
            create_provider("claude", opts()).unwrap().model_name(),
            anthropic::DEFAULT_CLAUDE_MODEL
        );
        assert_eq!(
            create_provider("anthropic", opts()).unwrap().model_name(),
            anthropic::DEFAULT_CLAUDE_MODEL
        );
        assert_eq!(
            create_provider("minimax", opts()).unwrap().model_name(),
            minimax::DEFAULT_MINIMAX_MODEL
        );
        assert_eq!(
            create_provider("MiniMax", opts()).unwrap().model_name(),
            minimax::DEFAULT_MINIMAX_MODEL
        );
    }

    #[test]
    fn open_source_requires_base_url_and_model() {
        let err = create_provider("open_source", ProviderOptions::new()).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));

        let err = create_provider(
            "custom",
            ProviderOptions::new().with_base_url("http://localhost:8000/v1"),
        )
        .unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));

        let provider = create_provider(
            "custom",
            ProviderOptions::new()
                .with_base_url("http://localhost:8000/v1")
                .with_model("qwen"),
        )
        .unwrap();
        assert_eq!(provider.model_name(), "qwen");
    }

    #[test]
    fn hosted_providers_require_api_key() {
        for kind in ["openai", "claude", "minimax"] {
            let err = create_provider(kind, ProviderOptions::new()).unwrap_err();
            assert!(matches!(err, AgentError::Configuration(_)));
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = create_provider("gemini", ProviderOptions::new()).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }
}
