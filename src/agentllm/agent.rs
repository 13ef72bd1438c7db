//! Agent core: ties an LLM provider to the function-calling machinery.
//!
//! The [`Agent`] owns a conversation history and drives the iterative tool-use loop: it
//! sends the history to the provider, executes any tool calls the model issues, feeds the
//! results back, and repeats until the model produces a final text reply or the iteration
//! cap is reached.
//!
//! # Example
//!
//! ```rust,no_run
//! use agentllm::agent::Agent;
//! use agentllm::providers::{create_provider, ProviderOptions};
//! use agentllm::registry::{sync_handler, FunctionRegistry, ParamSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = create_provider(
//!         "openai",
//!         ProviderOptions::new().with_api_key(std::env::var("OPENAI_API_KEY")?),
//!     )?;
//!
//!     let mut registry = FunctionRegistry::new();
//!     registry.register(
//!         "get_customer",
//!         "根据名称获取顾客信息",
//!         vec![ParamSpec::of("name", "String")],
//!         sync_handler(|args| Ok(serde_json::json!({"name": args["name"], "id": 123}))),
//!     )?;
//!
//!     let mut agent = Agent::new(provider)
//!         .with_registry(registry)
//!         .with_system_prompt("你是一个助手");
//!
//!     let outcome = agent.chat("查询顾客张三的信息").await?;
//!     println!("{}", outcome.content);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use crate::agentllm::error::AgentError;
use crate::agentllm::executor::ToolExecutor;
use crate::agentllm::provider::{ChatOptions, LlmProvider, Message, Role};
use crate::agentllm::registry::{
    FunctionHandler, FunctionRegistry, FunctionSpec, ParamSpec,
};

/// Default cap on provider round-trips within a single `chat` call.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// One recorded function invocation from a chat turn.
#[derive(Debug, Clone)]
pub struct FunctionCallRecord {
    pub name: String,
    pub arguments: serde_json::Value,
}

/// The result of a completed `chat` call.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// The model's final text reply.
    pub content: String,
    /// Every function call made during the turn, in the order the model issued them.
    pub function_calls: Vec<FunctionCallRecord>,
    /// How many provider round-trips were performed.
    pub iterations: u32,
}

/// An LLM-powered agent with conversation memory and function calling.
///
/// A single `Agent` is not safe for concurrent `chat` calls: the history is shared mutable
/// state, which the `&mut self` receivers enforce.  Providers are stateless and may be
/// shared between agents via `Arc`.
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    registry: FunctionRegistry,
    system_prompt: Option<String>,
    history: Vec<Message>,
    history_limit: Option<usize>,
}

impl Agent {
    /// Create an agent with an empty registry and no system prompt.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Agent {
            provider,
            registry: FunctionRegistry::new(),
            system_prompt: None,
            history: Vec::new(),
            history_limit: None,
        }
    }

    /// Attach a function registry (builder pattern).
    pub fn with_registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the system prompt (builder pattern).
    ///
    /// The prompt becomes the first history entry and survives [`clear_history`].
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.history.retain(|m| m.role != Role::System);
        self.history.insert(0, Message::system(&prompt));
        self.system_prompt = Some(prompt);
        self
    }

    /// Cap the history at `limit` messages (builder pattern).
    ///
    /// After each completed `chat`, the oldest complete user turns are dropped until the
    /// history fits.  The system prompt is never dropped and an assistant/tool-result run
    /// is never split.  Without a limit the history grows unboundedly, which matches the
    /// behaviour long-lived callers manage via [`clear_history`].
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// The provider this agent talks to.
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Borrow the function registry.
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Borrow the conversation history.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Register a function, inferring the schema from the declared parameter list.
    ///
    /// Convenience forwarder to [`FunctionRegistry::register`].
    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSpec>,
        handler: FunctionHandler,
    ) -> Result<(), AgentError> {
        self.registry.register(name, description, params, handler)
    }

    /// Register a function with an explicit JSON-schema parameter object.
    pub fn register_function_with_schema(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
        handler: FunctionHandler,
    ) -> Result<(), AgentError> {
        self.registry
            .register_with_schema(name, description, parameters, handler)
    }

    /// Chat with default options and iteration cap.
    pub async fn chat(&mut self, user_message: &str) -> Result<ChatOutcome, AgentError> {
        self.chat_with_options(user_message, DEFAULT_MAX_ITERATIONS, &ChatOptions::default())
            .await
    }

    /// Chat with an explicit iteration cap and request options.
    ///
    /// The loop sends the history to the provider, appends the assistant reply (with any
    /// provider payload for later replay), executes tool calls sequentially in the order
    /// the model issued them, appends each result as a tool message, and repeats.  Tool
    /// failures never escape: they are converted to `"错误: ..."` tool results so the
    /// model can observe them and adapt.  When the cap is reached the last reply is
    /// returned and a warning is logged.
    pub async fn chat_with_options(
        &mut self,
        user_message: &str,
        max_iterations: u32,
        options: &ChatOptions,
    ) -> Result<ChatOutcome, AgentError> {
        self.history.push(Message::user(user_message));

        let mut iterations: u32 = 0;
        let mut function_calls_made: Vec<FunctionCallRecord> = Vec::new();
        let mut last_content = String::new();

        while iterations < max_iterations {
            iterations += 1;

            let specs: Vec<FunctionSpec> =
                if self.provider.supports_function_calling() && !self.registry.is_empty() {
                    self.registry.list()
                } else {
                    Vec::new()
                };
            let functions = if specs.is_empty() {
                None
            } else {
                Some(specs.as_slice())
            };

            let response = self.provider.chat(&self.history, functions, options).await?;

            self.history.push(Message::assistant_with_extras(
                &response.content,
                response.raw_blocks.clone(),
            ));

            if response.tool_calls.is_empty() {
                self.enforce_history_limit();
                return Ok(ChatOutcome {
                    content: response.content,
                    function_calls: function_calls_made,
                    iterations,
                });
            }

            let executor = ToolExecutor::new(&self.registry);
            for call in &response.tool_calls {
                function_calls_made.push(FunctionCallRecord {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                });

                let result_text = match executor.execute(&call.name, call.arguments.clone()).await
                {
                    Ok(result) => executor.format_result(&result),
                    Err(e) => {
                        log::error!("Error executing function {}: {}", call.name, e);
                        format!("错误: {}", e)
                    }
                };

                self.history.push(Message::tool(
                    &call.name,
                    result_text,
                    Some(call.id.clone()),
                ));
            }

            last_content = response.content;
        }

        log::warn!("Reached max iterations ({})", max_iterations);
        self.enforce_history_limit();
        Ok(ChatOutcome {
            content: last_content,
            function_calls: function_calls_made,
            iterations,
        })
    }

    /// Parse an unstructured message into structured records.
    ///
    /// Builds an extraction prompt from the sender, timestamp, and content, runs a normal
    /// `chat`, and decodes the reply as JSON.  Accepts a top-level array, a top-level
    /// object (a `{"records": [...]}` wrapper is unwrapped), or either form inside a
    /// fenced code block.  Decode failures yield a single noise record instead of an
    /// error.
    pub async fn parse_message(
        &mut self,
        sender: &str,
        timestamp: &str,
        content: &str,
    ) -> Result<Vec<serde_json::Value>, AgentError> {
        let user_prompt = format!(
            "消息发送者: {}\n消息时间: {}\n消息内容:\n{}\n\n请提取结构化数据。返回 JSON 数组格式。",
            sender, timestamp, content
        );

        let outcome = self.chat(&user_prompt).await?;
        let text = strip_code_fence(&outcome.content);

        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Array(items)) => Ok(items),
            Ok(serde_json::Value::Object(map)) => {
                if let Some(serde_json::Value::Array(records)) = map.get("records") {
                    Ok(records.clone())
                } else {
                    Ok(vec![serde_json::Value::Object(map)])
                }
            }
            Ok(other) => {
                log::warn!("Unexpected response format: {}", other);
                Ok(vec![serde_json::json!({"type": "noise"})])
            }
            Err(e) => {
                let preview_end = text
                    .char_indices()
                    .nth(200)
                    .map(|(i, _)| i)
                    .unwrap_or(text.len());
                log::error!("JSON parse error: {}, text: {}", e, &text[..preview_end]);
                Ok(vec![serde_json::json!({"type": "noise", "error": e.to_string()})])
            }
        }
    }

    /// Reset the history, keeping only the system prompt if one was configured.
    ///
    /// Calling this twice is the same as calling it once.
    pub fn clear_history(&mut self) {
        self.history.clear();
        if let Some(prompt) = &self.system_prompt {
            self.history.push(Message::system(prompt));
        }
    }

    /// Drop the oldest complete user turns until the history fits the configured limit.
    fn enforce_history_limit(&mut self) {
        let limit = match self.history_limit {
            Some(limit) => limit,
            None => return,
        };
        while self.history.len() > limit {
            let start = match self.history.first() {
                Some(m) if m.role == Role::System => 1,
                _ => 0,
            };
            // The oldest turn spans from its user message to the next user message.
            if self
                .history
                .get(start)
                .map(|m| m.role != Role::User)
                .unwrap_or(true)
            {
                break;
            }
            let end = self
                .history
                .iter()
                .enumerate()
                .skip(start + 1)
                .find(|(_, m)| m.role == Role::User)
                .map(|(i, _)| i);
            match end {
                Some(end) => {
                    self.history.drain(start..end);
                }
                // Only the current turn remains; keep it intact.
                None => break,
            }
        }
    }
}

/// Strip a surrounding triple-backtick fence, optionally tagged `json`.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        let rest = rest.strip_suffix("```").unwrap_or(rest);
        rest.trim()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_fence_handles_tagged_blocks() {
        assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("  [1]  "), "[1]");
    }
}
