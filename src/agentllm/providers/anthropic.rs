//! Anthropic-style messages adapter, shared by the Claude and MiniMax variants.
//!
//! This protocol differs from the OpenAI family in three ways that all matter for
//! multi-turn tool use:
//!
//! 1. The system prompt travels in a top-level `system` field, not as a message role.
//! 2. Assistant replies are ordered content-block lists (`text`, `thinking`, `tool_use`)
//!    rather than flat strings, and the API requires those blocks to be replayed verbatim
//!    on the next turn for the model to keep its chain of thought across tool rounds.
//! 3. Tool results are sent back as `tool_result` blocks inside a `user` message, linked
//!    to the originating `tool_use.id`.
//!
//! The adapter is stateless: blocks captured on a response travel through
//! [`LlmResponse::raw_blocks`] into the history message's `provider_extras` and come back
//! here on the next request, so no cache or queue lives inside the provider.

use async_trait::async_trait;

use crate::agentllm::error::AgentError;
use crate::agentllm::provider::{ChatOptions, LlmProvider, LlmResponse, Message, Role, ToolCall};
use crate::agentllm::providers::common::{get_shared_http_client, join_url};
use crate::agentllm::registry::FunctionSpec;

/// Hosted Anthropic API base URL.
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
/// API version header value required by the messages endpoint.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Default Claude model.
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
/// Default output-token budget for the Claude variant.
pub const DEFAULT_CLAUDE_MAX_TOKENS: u32 = 2048;

/// Claude model identifiers supported through the messages API.
pub enum Model {
    /// `claude-opus-4-1` – flagship reasoning tier.
    ClaudeOpus41,
    /// `claude-sonnet-4-20250514` – balanced reasoning + throughput (the default).
    ClaudeSonnet4,
    /// `claude-3-5-sonnet-20241022` – previous Sonnet generation.
    ClaudeSonnet35,
    /// `claude-3-5-haiku-20241022` – fastest Claude tier.
    ClaudeHaiku35,
}

/// Convert a [`Model`] variant into its public string identifier.
pub fn model_to_string(model: Model) -> String {
    match model {
        Model::ClaudeOpus41 => "claude-opus-4-1".to_string(),
        Model::ClaudeSonnet4 => "claude-sonnet-4-20250514".to_string(),
        Model::ClaudeSonnet35 => "claude-3-5-sonnet-20241022".to_string(),
        Model::ClaudeHaiku35 => "claude-3-5-haiku-20241022".to_string(),
    }
}

/// Adapter for Anthropic's messages API and compatible gateways.
#[derive(Debug)]
pub struct AnthropicProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    default_max_tokens: u32,
}

impl AnthropicProvider {
    /// Construct an adapter with explicit endpoint and defaults.
    ///
    /// Variants (Claude, MiniMax) differ only in what they pass here.
    pub fn new(api_key: &str, model: &str, base_url: &str, default_max_tokens: u32) -> Self {
        log::info!(
            "Initialized Anthropic-style provider with model: {}, base_url: {}",
            model,
            base_url
        );
        AnthropicProvider {
            http: get_shared_http_client().clone(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            default_max_tokens,
        }
    }

    /// Construct a Claude client with the default model.
    pub fn claude(api_key: &str) -> Self {
        Self::claude_with_model(api_key, DEFAULT_CLAUDE_MODEL)
    }

    /// Construct a Claude client with an explicit model identifier.
    pub fn claude_with_model(api_key: &str, model: &str) -> Self {
        Self::new(
            api_key,
            model,
            ANTHROPIC_BASE_URL,
            DEFAULT_CLAUDE_MAX_TOKENS,
        )
    }

    /// Variant of [`AnthropicProvider::claude_with_model`] that accepts a [`Model`].
    pub fn claude_with_model_enum(api_key: &str, model: Model) -> Self {
        Self::claude_with_model(api_key, &model_to_string(model))
    }

    fn build_request_body(
        &self,
        messages: &[Message],
        functions: Option<&[FunctionSpec]>,
        options: &ChatOptions,
    ) -> serde_json::Value {
        let (system_text, non_system) = extract_system(messages);

        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": options.max_tokens.unwrap_or(self.default_max_tokens),
            "temperature": options.temperature,
            "messages": convert_messages(&non_system),
        });

        if let Some(system) = system_text {
            body["system"] = serde_json::Value::String(system);
        }

        if let Some(functions) = functions {
            if !functions.is_empty() {
                body["tools"] = serde_json::Value::Array(convert_functions(functions));
            }
        }

        for (key, value) in &options.extras {
            body[key] = value.clone();
        }

        body
    }
}

/// Pull all system messages out of the history.
///
/// Returns the newline-joined system text (if any) and the remaining messages in order.
fn extract_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
    let mut system_parts: Vec<&str> = Vec::new();
    let mut non_system: Vec<&Message> = Vec::new();
    for msg in messages {
        if msg.role == Role::System {
            system_parts.push(msg.content.as_ref());
        } else {
            non_system.push(msg);
        }
    }
    let system_text = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n"))
    };
    (system_text, non_system)
}

/// Convert the neutral history into the Anthropic messages array.
///
/// Consecutive tool-result messages accumulate into a pending buffer and flush as a single
/// `user` turn of `tool_result` blocks before the next non-tool message (and once more at
/// end of history), preserving their order.  Assistant messages with captured blocks
/// replay those blocks verbatim.
fn convert_messages(messages: &[&Message]) -> Vec<serde_json::Value> {
    let mut api_messages: Vec<serde_json::Value> = Vec::new();
    let mut pending_tool_results: Vec<serde_json::Value> = Vec::new();

    for msg in messages {
        if msg.role == Role::Tool {
            let tool_use_id = match &msg.tool_call_id {
                Some(id) => id.clone(),
                None => {
                    let name = msg.name.as_deref().unwrap_or("unknown");
                    log::warn!(
                        "Tool message for {} has no tool_call_id; synthesising one",
                        name
                    );
                    format!("call_{}", name)
                }
            };
            pending_tool_results.push(serde_json::json!({
                "type": "tool_result",
                "tool_use_id": tool_use_id,
                "content": msg.content.as_ref(),
            }));
            continue;
        }

        if !pending_tool_results.is_empty() {
            api_messages.push(serde_json::json!({
                "role": "user",
                "content": std::mem::take(&mut pending_tool_results),
            }));
        }

        match msg.role {
            Role::Assistant => match &msg.provider_extras {
                Some(blocks) => api_messages.push(serde_json::json!({
                    "role": "assistant",
                    "content": blocks,
                })),
                None => api_messages.push(serde_json::json!({
                    "role": "assistant",
                    "content": msg.content.as_ref(),
                })),
            },
            _ => api_messages.push(serde_json::json!({
                "role": "user",
                "content": msg.content.as_ref(),
            })),
        }
    }

    if !pending_tool_results.is_empty() {
        api_messages.push(serde_json::json!({
            "role": "user",
            "content": pending_tool_results,
        }));
    }

    api_messages
}

/// Translate the neutral tool catalogue; this protocol names the schema `input_schema`.
fn convert_functions(functions: &[FunctionSpec]) -> Vec<serde_json::Value> {
    functions
        .iter()
        .map(|func| {
            serde_json::json!({
                "name": func.name,
                "description": func.description,
                "input_schema": func.parameters,
            })
        })
        .collect()
}

/// Decode the content-block list into the uniform response shape.
///
/// `text` blocks concatenate into `content`, `thinking` blocks into
/// `metadata["thinking"]`, and every `tool_use` block becomes a [`ToolCall`] with its id
/// preserved.  The original block list is kept in `raw_blocks` for next-turn replay.
fn parse_response_body(body: &serde_json::Value) -> Result<LlmResponse, AgentError> {
    let blocks = body
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| AgentError::Provider("no content blocks in response".to_string()))?;

    let mut content_text = String::new();
    let mut thinking_text = String::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();

    for block in blocks {
        match block.get("type").and_then(|t| t.as_str()) {
            Some("text") => {
                if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
                    content_text.push_str(text);
                }
            }
            Some("thinking") => {
                if let Some(thinking) = block.get("thinking").and_then(|t| t.as_str()) {
                    thinking_text.push_str(thinking);
                }
            }
            Some("tool_use") => {
                let name = block
                    .get("name")
                    .and_then(|n| n.as_str())
                    .unwrap_or_default()
                    .to_string();
                tool_calls.push(ToolCall {
                    id: block
                        .get("id")
                        .and_then(|i| i.as_str())
                        .map(|i| i.to_string())
                        .unwrap_or_else(|| format!("call_{}", name)),
                    name,
                    arguments: block
                        .get("input")
                        .cloned()
                        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new())),
                });
            }
            other => {
                log::debug!("Ignoring unknown content block type: {:?}", other);
            }
        }
    }

    let content = content_text.trim().to_string();
    if content.is_empty() && tool_calls.is_empty() {
        return Err(AgentError::Provider(
            "empty response: no text and no tool_use blocks".to_string(),
        ));
    }

    let mut response = LlmResponse {
        content,
        tool_calls,
        finish_reason: body
            .get("stop_reason")
            .and_then(|s| s.as_str())
            .map(|s| s.to_string()),
        raw_blocks: Some(serde_json::Value::Array(blocks.clone())),
        metadata: Default::default(),
    };

    if !thinking_text.is_empty() {
        let preview_end = thinking_text
            .char_indices()
            .nth(100)
            .map(|(i, _)| i)
            .unwrap_or(thinking_text.len());
        log::debug!(
            "Captured thinking content: {}...",
            &thinking_text[..preview_end]
        );
        response.metadata.insert(
            "thinking".to_string(),
            serde_json::Value::String(thinking_text),
        );
    }
    if let Some(usage) = body.get("usage") {
        response
            .metadata
            .insert("usage".to_string(), usage.clone());
    }

    Ok(response)
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn chat(
        &self,
        messages: &[Message],
        functions: Option<&[FunctionSpec]>,
        options: &ChatOptions,
    ) -> Result<LlmResponse, AgentError> {
        let body = self.build_request_body(messages, functions, options);
        let url = join_url(&self.base_url, "v1/messages");

        log::debug!(
            "Sending request to {} with {} messages",
            url,
            body["messages"].as_array().map(|m| m.len()).unwrap_or(0)
        );

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Provider(format!("request to {} failed: {}", url, e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AgentError::Provider(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            if log::log_enabled!(log::Level::Error) {
                log::error!("AnthropicProvider: HTTP {} from {}: {}", status, url, text);
            }
            return Err(AgentError::Provider(format!("HTTP {} — {}", status, text)));
        }

        let parsed: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| AgentError::Provider(format!("malformed response JSON: {}", e)))?;

        parse_response_body(&parsed)
    }

    fn supports_function_calling(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::claude("key")
    }

    #[test]
    fn system_messages_are_extracted_and_joined() {
        let messages = vec![
            Message::system("first"),
            Message::user("hi"),
            Message::system("second"),
        ];
        let body = provider().build_request_body(&messages, None, &ChatOptions::default());

        assert_eq!(body["system"], "first\nsecond");
        let wire = body["messages"].as_array().unwrap();
        assert_eq!(wire.len(), 1);
        assert!(wire.iter().all(|m| m["role"] != "system"));
    }

    #[test]
    fn no_system_field_without_system_messages() {
        let body = provider().build_request_body(
            &[Message::user("hi")],
            None,
            &ChatOptions::default(),
        );
        assert!(body.get("system").is_none());
    }

    #[test]
    fn consecutive_tool_results_fold_into_one_user_turn() {
        let assistant_blocks = json!([
            {"type": "tool_use", "id": "a", "name": "f", "input": {}},
            {"type": "tool_use", "id": "b", "name": "g", "input": {}}
        ]);
        let messages = vec![
            Message::user("go"),
            Message::assistant_with_extras("", Some(assistant_blocks)),
            Message::tool("f", "one", Some("a".to_string())),
            Message::tool("g", "two", Some("b".to_string())),
            Message::assistant("done"),
        ];
        let refs: Vec<&Message> = messages.iter().collect();
        let wire = convert_messages(&refs);

        assert_eq!(wire.len(), 4);
        assert_eq!(wire[2]["role"], "user");
        let results = wire[2]["content"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["type"], "tool_result");
        assert_eq!(results[0]["tool_use_id"], "a");
        assert_eq!(results[0]["content"], "one");
        assert_eq!(results[1]["tool_use_id"], "b");
        assert_eq!(wire[3]["role"], "assistant");
    }

    #[test]
    fn trailing_tool_results_are_flushed() {
        let messages = vec![
            Message::user("go"),
            Message::assistant("calling"),
            Message::tool("f", "one", Some("a".to_string())),
        ];
        let refs: Vec<&Message> = messages.iter().collect();
        let wire = convert_messages(&refs);
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[2]["role"], "user");
        assert_eq!(wire[2]["content"][0]["tool_use_id"], "a");
    }

    #[test]
    fn missing_tool_call_id_synthesises_one() {
        let messages = vec![Message::tool("lookup", "result", None)];
        let refs: Vec<&Message> = messages.iter().collect();
        let wire = convert_messages(&refs);
        assert_eq!(wire[0]["content"][0]["tool_use_id"], "call_lookup");
    }

    #[test]
    fn assistant_blocks_replay_verbatim() {
        let blocks = json!([
            {"type": "thinking", "thinking": "hmm"},
            {"type": "text", "text": "let me check"},
            {"type": "tool_use", "id": "t1", "name": "f", "input": {"x": 1}}
        ]);
        let messages = vec![Message::assistant_with_extras(
            "let me check",
            Some(blocks.clone()),
        )];
        let refs: Vec<&Message> = messages.iter().collect();
        let wire = convert_messages(&refs);
        assert_eq!(wire[0]["content"], blocks);
    }

    #[test]
    fn replay_after_one_tool_round_matches_protocol() {
        // History produced by one round of tool use; the next request must carry the
        // original blocks and a tool_result keyed by the tool_use id.
        let blocks = json!([
            {"type": "text", "text": "checking"},
            {"type": "tool_use", "id": "toolu_01", "name": "add", "input": {"a": 2, "b": 3}}
        ]);
        let messages = vec![
            Message::system("你是一个助手"),
            Message::user("add 2 and 3"),
            Message::assistant_with_extras("checking", Some(blocks.clone())),
            Message::tool("add", "5", Some("toolu_01".to_string())),
        ];
        let body = provider().build_request_body(&messages, None, &ChatOptions::default());

        assert_eq!(body["system"], "你是一个助手");
        let wire = body["messages"].as_array().unwrap();
        assert_eq!(wire[0]["role"], "user");
        assert_eq!(wire[1]["role"], "assistant");
        assert_eq!(wire[1]["content"], blocks);
        assert_eq!(wire[2]["role"], "user");
        assert_eq!(
            wire[2]["content"],
            json!([{"type": "tool_result", "tool_use_id": "toolu_01", "content": "5"}])
        );
    }

    #[test]
    fn functions_rename_parameters_to_input_schema() {
        let specs = vec![FunctionSpec {
            name: "add".to_string(),
            description: "adds".to_string(),
            parameters: json!({"type": "object", "properties": {"a": {"type": "integer"}}}),
        }];
        let body = provider().build_request_body(
            &[Message::user("hi")],
            Some(&specs),
            &ChatOptions::default(),
        );
        let tool = &body["tools"][0];
        assert_eq!(tool["name"], "add");
        assert!(tool.get("parameters").is_none());
        assert_eq!(
            tool["input_schema"],
            json!({"type": "object", "properties": {"a": {"type": "integer"}}})
        );
    }

    #[test]
    fn max_tokens_defaults_per_variant() {
        let body = provider().build_request_body(
            &[Message::user("hi")],
            None,
            &ChatOptions::default(),
        );
        assert_eq!(body["max_tokens"], DEFAULT_CLAUDE_MAX_TOKENS);

        let body = provider().build_request_body(
            &[Message::user("hi")],
            None,
            &ChatOptions::default().with_max_tokens(9000),
        );
        assert_eq!(body["max_tokens"], 9000);
    }

    #[test]
    fn parse_decodes_all_block_kinds() {
        let body = json!({
            "content": [
                {"type": "thinking", "thinking": "需要调用工具"},
                {"type": "text", "text": "Let me "},
                {"type": "text", "text": "look that up."},
                {"type": "tool_use", "id": "toolu_01", "name": "add", "input": {"a": 2}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 20}
        });
        let response = parse_response_body(&body).unwrap();
        assert_eq!(response.content, "Let me look that up.");
        assert_eq!(
            response.metadata["thinking"],
            json!("需要调用工具")
        );
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "toolu_01");
        assert_eq!(response.tool_calls[0].arguments, json!({"a": 2}));
        assert_eq!(response.finish_reason.as_deref(), Some("tool_use"));
        assert_eq!(response.metadata["usage"]["output_tokens"], 20);
        // The complete block list round-trips for replay.
        assert_eq!(
            response.raw_blocks.as_ref().unwrap().as_array().unwrap().len(),
            4
        );
    }

    #[test]
    fn parse_rejects_empty_response() {
        let body = json!({"content": [], "stop_reason": "end_turn"});
        assert!(matches!(
            parse_response_body(&body),
            Err(AgentError::Provider(_))
        ));
    }
}
