//! Shared primitives for provider-agnostic LLM access.
//!
//! Applications typically interact with agentllm through the [`LlmProvider`] trait and the
//! lightweight data types defined in this module.  The trait abstracts over concrete vendor
//! implementations while the supporting structs describe conversation messages, tool calls
//! requested by the model, and the uniform response shape every adapter produces.
//!
//! # Basic request/response
//!
//! ```rust,no_run
//! use agentllm::provider::{ChatOptions, LlmProvider, Message};
//! use agentllm::providers::openai::OpenAIProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key = std::env::var("OPENAI_API_KEY")?;
//!     let provider = OpenAIProvider::new(&key, "gpt-4o-mini");
//!
//!     let response = provider
//!         .chat(&[Message::user("Who are you?")], None, &ChatOptions::default())
//!         .await?;
//!
//!     println!("Assistant: {}", response.content);
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::agentllm::error::AgentError;
use crate::agentllm::registry::FunctionSpec;

/// Represents the possible roles for a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// A system authored message that primes or constrains assistant behaviour.
    System,
    /// A user authored message (frequently a mirror of a human end-user request).
    User,
    /// An assistant authored message (model responses, possibly carrying tool calls).
    Assistant,
    /// A tool-result message correlating with a prior assistant [`ToolCall`].
    Tool,
}

/// Represents a generic message in a conversation history.
///
/// Messages are immutable once inserted into an [`Agent`](crate::agentllm::agent::Agent)'s
/// history.  The `provider_extras` field carries opaque provider payload captured on an
/// assistant turn (e.g. Anthropic content blocks) and is replayed verbatim on the next
/// request to the same provider family.
#[derive(Debug, Clone)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The message body.  Stored as `Arc<str>` so that histories can be cheaply cloned.
    pub content: Arc<str>,
    /// For `Tool` messages, the name of the tool that produced the result.
    pub name: Option<String>,
    /// For `Tool` messages, the id of the assistant tool call this result answers.
    pub tool_call_id: Option<String>,
    /// Opaque provider payload replayed on the next request (Anthropic content blocks,
    /// OpenAI `tool_calls` arrays).
    pub provider_extras: Option<serde_json::Value>,
}

impl Message {
    /// Build a system message.
    pub fn system(content: impl AsRef<str>) -> Self {
        Message {
            role: Role::System,
            content: Arc::from(content.as_ref()),
            name: None,
            tool_call_id: None,
            provider_extras: None,
        }
    }

    /// Build a user message.
    pub fn user(content: impl AsRef<str>) -> Self {
        Message {
            role: Role::User,
            content: Arc::from(content.as_ref()),
            name: None,
            tool_call_id: None,
            provider_extras: None,
        }
    }

    /// Build a plain assistant message.
    pub fn assistant(content: impl AsRef<str>) -> Self {
        Self::assistant_with_extras(content, None)
    }

    /// Build an assistant message carrying provider payload for later replay.
    pub fn assistant_with_extras(
        content: impl AsRef<str>,
        provider_extras: Option<serde_json::Value>,
    ) -> Self {
        Message {
            role: Role::Assistant,
            content: Arc::from(content.as_ref()),
            name: None,
            tool_call_id: None,
            provider_extras,
        }
    }

    /// Build a tool-result message.
    ///
    /// The tool name is mandatory; a tool result without one cannot be attributed and is
    /// rejected at construction.  `tool_call_id` links back to the id the assistant emitted
    /// with the originating tool call (required by Anthropic-style providers).
    pub fn tool(
        name: impl Into<String>,
        content: impl AsRef<str>,
        tool_call_id: Option<String>,
    ) -> Self {
        Message {
            role: Role::Tool,
            content: Arc::from(content.as_ref()),
            name: Some(name.into()),
            tool_call_id,
            provider_extras: None,
        }
    }
}

/// A single tool call returned by the LLM in a function-calling response.
///
/// Providers assign an opaque [`id`](ToolCall::id) to each call so that the tool result can
/// be correlated back in a follow-up `Role::Tool` message.
///
/// # Example
///
/// ```rust
/// use agentllm::provider::ToolCall;
///
/// let tc = ToolCall {
///     id: "call_abc123".to_string(),
///     name: "get_customer".to_string(),
///     arguments: serde_json::json!({"name": "张三"}),
/// };
/// assert_eq!(tc.name, "get_customer");
/// ```
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Provider-assigned call id, e.g. `"call_abc123"` or `"toolu_01..."`.
    pub id: String,
    /// Tool name matching one of the [`FunctionSpec`]s sent with the request.
    pub name: String,
    /// Decoded JSON argument object supplied by the LLM for this call.  Adapters always
    /// parse JSON-string arguments before exposing them here.
    pub arguments: serde_json::Value,
}

/// How many tokens were spent on prompt vs. completion?
#[derive(Clone, Debug)]
pub struct TokenUsage {
    /// Number of prompt/input tokens billed by the provider.
    pub input_tokens: usize,
    /// Number of generated/output tokens billed by the provider.
    pub output_tokens: usize,
    /// Convenience total equal to `input_tokens + output_tokens`.
    pub total_tokens: usize,
}

/// Uniform response shape returned by every provider adapter.
///
/// Either `tool_calls` is non-empty or `content` is non-empty (or both); adapters reject an
/// all-empty wire response as a provider error.
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    /// Text reply generated by the model.  May be empty when the model only called tools.
    pub content: String,
    /// Tool calls requested by the model, in the order they were issued.
    pub tool_calls: Vec<ToolCall>,
    /// Provider completion status (e.g. `"stop"`, `"tool_calls"`, `"end_turn"`).
    pub finish_reason: Option<String>,
    /// Original provider payload for next-turn replay: the Anthropic content-block list, or
    /// the OpenAI `tool_calls` array.  Stored into the assistant message's
    /// [`provider_extras`](Message::provider_extras) by the agent.
    pub raw_blocks: Option<serde_json::Value>,
    /// Auxiliary data such as `"thinking"` text and token `"usage"` accounting.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LlmResponse {
    /// Token accounting for this response, when the provider reported any.
    ///
    /// Understands both wire spellings: `prompt_tokens`/`completion_tokens`
    /// (OpenAI-style) and `input_tokens`/`output_tokens` (Anthropic-style).
    ///
    /// # Example
    ///
    /// ```rust
    /// use agentllm::provider::LlmResponse;
    ///
    /// let mut response = LlmResponse {
    ///     content: "hi".to_string(),
    ///     ..Default::default()
    /// };
    /// response.metadata.insert(
    ///     "usage".to_string(),
    ///     serde_json::json!({"input_tokens": 12, "output_tokens": 3}),
    /// );
    /// let usage = response.usage().unwrap();
    /// assert_eq!(usage.total_tokens, 15);
    /// ```
    pub fn usage(&self) -> Option<TokenUsage> {
        let usage = self.metadata.get("usage")?;
        let input = usage
            .get("input_tokens")
            .or_else(|| usage.get("prompt_tokens"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;
        let output = usage
            .get("output_tokens")
            .or_else(|| usage.get("completion_tokens"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;
        let total = usage
            .get("total_tokens")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(input + output);
        Some(TokenUsage {
            input_tokens: input,
            output_tokens: output,
            total_tokens: total,
        })
    }
}

/// Per-call request knobs forwarded to the provider.
///
/// Keys placed in `extras` are merged verbatim into the wire request body, which is how
/// provider-specific parameters (e.g. `top_p`) reach the API.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Sampling temperature.  Defaults to 0.1, suitable for deterministic tool workflows.
    pub temperature: f32,
    /// Maximum tokens to generate; falls back to the provider default when `None`.
    pub max_tokens: Option<u32>,
    /// Extra request-body fields merged into the wire request.
    pub extras: serde_json::Map<String, serde_json::Value>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        ChatOptions {
            temperature: 0.1,
            max_tokens: None,
            extras: serde_json::Map::new(),
        }
    }
}

impl ChatOptions {
    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the provider's default output-token budget.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Attach an extra request-body field.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }
}

/// Trait defining the interface to interact with various LLM services.
///
/// An [`LlmProvider`] instance is responsible for translating the neutral message list into
/// the provider specific wire format and for returning provider responses in a uniform
/// shape.  The abstraction deliberately excludes conversation bookkeeping: for that see
/// [`Agent`](crate::agentllm::agent::Agent).
///
/// All implementations **must** be thread-safe (`Send + Sync`) so they can be shared across
/// agents.  Adapters hold only a client handle, model name, and default parameters, and are
/// stateless across calls.
#[async_trait]
pub trait LlmProvider: Send + Sync + std::fmt::Debug {
    /// Send a full request/response style chat completion.
    ///
    /// The `messages` slice must include any system priming messages the caller wishes to
    /// send.  `functions` carries the provider-neutral tool catalogue; adapters accept
    /// `None` or an empty slice and simply omit the tools field from the wire request.
    async fn chat(
        &self,
        messages: &[Message],
        functions: Option<&[FunctionSpec]>,
        options: &ChatOptions,
    ) -> Result<LlmResponse, AgentError>;

    /// Whether this provider supports native function calling.
    ///
    /// When `false`, the agent never forwards the function catalogue.
    fn supports_function_calling(&self) -> bool;

    /// Return the identifier used to select the upstream model (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_constructor_carries_name_and_id() {
        let msg = Message::tool("add", "5", Some("c1".to_string()));
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.name.as_deref(), Some("add"));
        assert_eq!(msg.tool_call_id.as_deref(), Some("c1"));
    }

    #[test]
    fn chat_options_defaults() {
        let options = ChatOptions::default();
        assert!((options.temperature - 0.1).abs() < f32::EPSILON);
        assert!(options.max_tokens.is_none());
        assert!(options.extras.is_empty());
    }

    #[test]
    fn usage_reads_openai_spelling() {
        let mut response = LlmResponse {
            content: "x".to_string(),
            ..Default::default()
        };
        response.metadata.insert(
            "usage".to_string(),
            json!({"prompt_tokens": 7, "completion_tokens": 2, "total_tokens": 9}),
        );
        let usage = response.usage().unwrap();
        assert_eq!(usage.input_tokens, 7);
        assert_eq!(usage.output_tokens, 2);
        assert_eq!(usage.total_tokens, 9);
    }

    #[test]
    fn usage_absent_without_metadata() {
        let response = LlmResponse::default();
        assert!(response.usage().is_none());
    }
}
