//! MiniMax client built on the Anthropic-style adapter.
//!
//! MiniMax exposes an Anthropic-compatible gateway, so this wrapper only supplies the
//! endpoint, default model, and a larger output-token budget; all message conversion and
//! block handling is delegated to [`AnthropicProvider`].

use async_trait::async_trait;

use crate::agentllm::error::AgentError;
use crate::agentllm::provider::{ChatOptions, LlmProvider, LlmResponse, Message};
use crate::agentllm::providers::anthropic::AnthropicProvider;
use crate::agentllm::registry::FunctionSpec;

/// MiniMax Anthropic-compatible gateway.
pub const MINIMAX_BASE_URL: &str = "https://api.minimaxi.com/anthropic";
/// Default MiniMax model.
pub const DEFAULT_MINIMAX_MODEL: &str = "MiniMax-M2.5";
/// MiniMax supports long outputs, so the default budget is larger than Claude's.
pub const DEFAULT_MINIMAX_MAX_TOKENS: u32 = 4096;

/// MiniMax model identifiers reachable through the Anthropic-compatible gateway.
pub enum Model {
    /// `MiniMax-M2.5` – top performance tier (the default).
    MiniMaxM25,
    /// `MiniMax-M2.5-highspeed` – M2.5 at roughly 100 TPS.
    MiniMaxM25HighSpeed,
    /// `MiniMax-M2.1` – strong multilingual coding tier.
    MiniMaxM21,
    /// `MiniMax-M2.1-highspeed` – M2.1 low-latency variant.
    MiniMaxM21HighSpeed,
    /// `MiniMax-M2` – built for efficient coding and agent workflows.
    MiniMaxM2,
}

/// Convert a [`Model`] variant into its public string identifier.
pub fn model_to_string(model: Model) -> String {
    match model {
        Model::MiniMaxM25 => "MiniMax-M2.5".to_string(),
        Model::MiniMaxM25HighSpeed => "MiniMax-M2.5-highspeed".to_string(),
        Model::MiniMaxM21 => "MiniMax-M2.1".to_string(),
        Model::MiniMaxM21HighSpeed => "MiniMax-M2.1-highspeed".to_string(),
        Model::MiniMaxM2 => "MiniMax-M2".to_string(),
    }
}

/// Client for MiniMax models (MiniMax-M2.5, MiniMax-M2.1, ...) routed through the
/// Anthropic-compatible surface.
#[derive(Debug)]
pub struct MiniMaxProvider {
    delegate: AnthropicProvider,
}

impl MiniMaxProvider {
    /// Create a client with the default model.
    pub fn new(api_key: &str) -> Self {
        Self::with_model(api_key, DEFAULT_MINIMAX_MODEL)
    }

    /// Create a client with an explicit model identifier.
    pub fn with_model(api_key: &str, model: &str) -> Self {
        Self::with_config(api_key, model, MINIMAX_BASE_URL, DEFAULT_MINIMAX_MAX_TOKENS)
    }

    /// Variant of [`MiniMaxProvider::with_model`] that accepts a [`Model`].
    pub fn with_model_enum(api_key: &str, model: Model) -> Self {
        Self::with_model(api_key, &model_to_string(model))
    }

    /// Create a client pointing at a custom MiniMax-compatible base URL.
    pub fn with_base_url(api_key: &str, model: &str, base_url: &str) -> Self {
        Self::with_config(api_key, model, base_url, DEFAULT_MINIMAX_MAX_TOKENS)
    }

    /// Fully parameterised constructor used by the provider factory.
    pub fn with_config(api_key: &str, model: &str, base_url: &str, max_tokens: u32) -> Self {
        MiniMaxProvider {
            delegate: AnthropicProvider::new(api_key, model, base_url, max_tokens),
        }
    }
}

#[async_trait]
impl LlmProvider for MiniMaxProvider {
    async fn chat(
        &self,
        messages: &[Message],
        functions: Option<&[FunctionSpec]>,
        options: &ChatOptions,
    ) -> Result<LlmResponse, AgentError> {
        self.delegate.chat(messages, functions, options).await
    }

    fn supports_function_calling(&self) -> bool {
        self.delegate.supports_function_calling()
    }

    fn model_name(&self) -> &str {
        self.delegate.model_name()
    }
}
