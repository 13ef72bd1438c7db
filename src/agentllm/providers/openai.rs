//! OpenAI-style chat-completions adapter.
//!
//! Speaks the flat `{role, content, name?, tool_call_id?}` wire format with native tool
//! calling (`tools` + `tool_choice: "auto"`), against OpenAI itself or any
//! OpenAI-compatible endpoint (vLLM, Ollama, LocalAI, self-hosted gateways).  Tool-call
//! arguments arrive as JSON strings on this protocol and are decoded into objects before
//! they leave the adapter.
//!
//! # Example
//!
//! ```rust,no_run
//! use agentllm::provider::{ChatOptions, LlmProvider, Message};
//! use agentllm::providers::openai::OpenAIProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OpenAIProvider::new(&std::env::var("OPENAI_API_KEY")?, "gpt-4o-mini");
//!     let reply = provider
//!         .chat(&[Message::user("Hello!")], None, &ChatOptions::default())
//!         .await?;
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;

use crate::agentllm::error::AgentError;
use crate::agentllm::provider::{ChatOptions, LlmProvider, LlmResponse, Message, Role, ToolCall};
use crate::agentllm::providers::common::{get_shared_http_client, join_url};
use crate::agentllm::registry::FunctionSpec;

/// Default model for the hosted OpenAI endpoint.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Hosted OpenAI API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default per-request timeout for self-hosted OpenAI-compatible services.
pub const DEFAULT_OPEN_SOURCE_TIMEOUT_SECS: u64 = 60;

/// Common model identifiers for OpenAI's Chat Completions API.
#[allow(non_camel_case_types)]
pub enum Model {
    /// `gpt-4o` – Omni model with text + image inputs.
    GPT4o,
    /// `gpt-4o-mini` – cost effective GPT-4o derivative (the default).
    GPT4oMini,
    /// `gpt-4-turbo` – previous generation flagship.
    GPT4Turbo,
    /// `gpt-4.1` – general availability GPT-4.1.
    GPT41,
    /// `gpt-4.1-mini` – reduced cost GPT-4.1 tier.
    GPT41Mini,
    /// `gpt-3.5-turbo` – legacy cost-optimised tier.
    GPT35Turbo,
    /// `o3-mini` – compact O-series reasoning model.
    O3Mini,
    /// `o4-mini` – newest O-series low-latency tier.
    O4Mini,
}

/// Convert a [`Model`] variant into the string identifier expected by the REST API.
pub fn model_to_string(model: Model) -> String {
    match model {
        Model::GPT4o => "gpt-4o".to_string(),
        Model::GPT4oMini => "gpt-4o-mini".to_string(),
        Model::GPT4Turbo => "gpt-4-turbo".to_string(),
        Model::GPT41 => "gpt-4.1".to_string(),
        Model::GPT41Mini => "gpt-4.1-mini".to_string(),
        Model::GPT35Turbo => "gpt-3.5-turbo".to_string(),
        Model::O3Mini => "o3-mini".to_string(),
        Model::O4Mini => "o4-mini".to_string(),
    }
}

/// Adapter for OpenAI's Chat Completions API and compatible services.
#[derive(Debug)]
pub struct OpenAIProvider {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    request_timeout: Option<Duration>,
}

impl OpenAIProvider {
    /// Construct a client for the hosted OpenAI API.
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_base_url(api_key, model, OPENAI_BASE_URL)
    }

    /// Variant of [`OpenAIProvider::new`] that accepts a strongly typed [`Model`].
    pub fn new_with_model_enum(api_key: &str, model: Model) -> Self {
        Self::new(api_key, &model_to_string(model))
    }

    /// Construct a client for an OpenAI-compatible endpoint at a custom base URL.
    pub fn with_base_url(api_key: &str, model: &str, base_url: &str) -> Self {
        OpenAIProvider {
            http: get_shared_http_client().clone(),
            api_key: Some(api_key.to_string()),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: None,
        }
    }

    /// Construct a client for a self-hosted open-source model service.
    ///
    /// The service must expose an OpenAI-compatible `/chat/completions` endpoint (vLLM,
    /// Ollama, LocalAI, ...).  `api_key` is optional; when present it is sent as a Bearer
    /// token.  Requests time out after `timeout_secs` (default 60).
    pub fn open_source(
        base_url: &str,
        model: &str,
        api_key: Option<&str>,
        timeout_secs: Option<u64>,
    ) -> Self {
        OpenAIProvider {
            http: get_shared_http_client().clone(),
            api_key: api_key.map(|k| k.to_string()),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: Some(Duration::from_secs(
                timeout_secs.unwrap_or(DEFAULT_OPEN_SOURCE_TIMEOUT_SECS),
            )),
        }
    }
}

/// Serialise the neutral history into the flat OpenAI message format.
///
/// Assistant messages that captured a `tool_calls` array on a previous response replay it
/// verbatim so the prior tool round is re-sent intact.
fn wire_messages(messages: &[Message]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|msg| match msg.role {
            Role::System => serde_json::json!({
                "role": "system",
                "content": msg.content.as_ref()
            }),
            Role::User => serde_json::json!({
                "role": "user",
                "content": msg.content.as_ref()
            }),
            Role::Assistant => match &msg.provider_extras {
                Some(tool_calls) => {
                    let content = if msg.content.is_empty() {
                        serde_json::Value::Null
                    } else {
                        serde_json::Value::String(msg.content.to_string())
                    };
                    serde_json::json!({
                        "role": "assistant",
                        "content": content,
                        "tool_calls": tool_calls
                    })
                }
                None => serde_json::json!({
                    "role": "assistant",
                    "content": msg.content.as_ref()
                }),
            },
            Role::Tool => {
                let mut entry = serde_json::json!({
                    "role": "tool",
                    "content": msg.content.as_ref()
                });
                if let Some(name) = &msg.name {
                    entry["name"] = serde_json::Value::String(name.clone());
                }
                if let Some(id) = &msg.tool_call_id {
                    entry["tool_call_id"] = serde_json::Value::String(id.clone());
                }
                entry
            }
        })
        .collect()
}

/// Assemble the complete request body.
fn build_request_body(
    model: &str,
    messages: &[Message],
    functions: Option<&[FunctionSpec]>,
    options: &ChatOptions,
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": model,
        "messages": wire_messages(messages),
        "temperature": options.temperature,
    });

    if let Some(max_tokens) = options.max_tokens {
        body["max_tokens"] = serde_json::Value::from(max_tokens);
    }

    if let Some(functions) = functions {
        if !functions.is_empty() {
            let tools: Vec<serde_json::Value> = functions
                .iter()
                .map(|func| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": func.name,
                            "description": func.description,
                            "parameters": func.parameters
                        }
                    })
                })
                .collect();
            body["tools"] = serde_json::Value::Array(tools);
            body["tool_choice"] = serde_json::Value::String("auto".to_string());
        }
    }

    for (key, value) in &options.extras {
        body[key] = value.clone();
    }

    body
}

/// Decode `choices[0].message` into the uniform response shape.
///
/// Tool-call entries whose `function.arguments` fail to parse as JSON are logged and
/// dropped; the rest of the response is preserved.
fn parse_response_body(body: &serde_json::Value) -> Result<LlmResponse, AgentError> {
    let choice = body
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| AgentError::Provider("no choices in response".to_string()))?;
    let message = choice
        .get("message")
        .ok_or_else(|| AgentError::Provider("no message in first choice".to_string()))?;

    let content = message
        .get("content")
        .and_then(|c| c.as_str())
        .unwrap_or("")
        .to_string();

    let raw_tool_calls = message.get("tool_calls").and_then(|tc| tc.as_array());
    let mut tool_calls = Vec::new();
    if let Some(entries) = raw_tool_calls {
        for entry in entries {
            if entry
                .get("type")
                .and_then(|t| t.as_str())
                .map(|t| t != "function")
                .unwrap_or(false)
            {
                continue;
            }
            let func = match entry.get("function") {
                Some(f) => f,
                None => continue,
            };
            let name = match func.get("name").and_then(|n| n.as_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            let arguments = match func.get("arguments") {
                Some(serde_json::Value::String(raw)) => match serde_json::from_str(raw) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        log::error!(
                            "Failed to parse function arguments: {}, raw: {}",
                            e,
                            raw
                        );
                        continue;
                    }
                },
                // Some OpenAI-compatible servers send the object directly.
                Some(obj @ serde_json::Value::Object(_)) => obj.clone(),
                _ => serde_json::Value::Object(serde_json::Map::new()),
            };
            let id = entry
                .get("id")
                .and_then(|i| i.as_str())
                .map(|i| i.to_string())
                .unwrap_or_else(|| format!("call_{}", name));
            tool_calls.push(ToolCall {
                id,
                name,
                arguments,
            });
        }
    }

    if content.is_empty() && tool_calls.is_empty() {
        return Err(AgentError::Provider(
            "empty response: no content and no tool calls".to_string(),
        ));
    }

    let mut response = LlmResponse {
        content,
        tool_calls,
        finish_reason: choice
            .get("finish_reason")
            .and_then(|f| f.as_str())
            .map(|f| f.to_string()),
        raw_blocks: raw_tool_calls.map(|entries| serde_json::Value::Array(entries.clone())),
        metadata: Default::default(),
    };

    if let Some(usage) = body.get("usage") {
        response
            .metadata
            .insert("usage".to_string(), usage.clone());
    }

    Ok(response)
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    async fn chat(
        &self,
        messages: &[Message],
        functions: Option<&[FunctionSpec]>,
        options: &ChatOptions,
    ) -> Result<LlmResponse, AgentError> {
        let body = build_request_body(&self.model, messages, functions, options);
        let url = join_url(&self.base_url, "chat/completions");

        let mut request = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        let resp = request
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
                log::error!("OpenAIProvider: HTTP {} from {}: {}", status, url, text);
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
