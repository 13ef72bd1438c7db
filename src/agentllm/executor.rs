//! Tool executor: dispatches function calls issued by the LLM.
//!
//! The executor is the execution layer of the function-calling mechanism.  It looks the
//! requested name up in the [`FunctionRegistry`], invokes the handler with the decoded
//! argument object, awaits the result, and formats it as a string for the next LLM turn.

use crate::agentllm::error::AgentError;
use crate::agentllm::registry::FunctionRegistry;

/// Executes registered functions on behalf of an agent.
///
/// The registry is read-only for the lifetime of the executor; the agent constructs one
/// per chat turn.
pub struct ToolExecutor<'a> {
    registry: &'a FunctionRegistry,
}

impl<'a> ToolExecutor<'a> {
    /// Create an executor over the given registry.
    pub fn new(registry: &'a FunctionRegistry) -> Self {
        ToolExecutor { registry }
    }

    /// Execute a function call.
    ///
    /// `arguments` is the decoded JSON argument object; binding is by name, so handlers
    /// pull each argument out of the object by its parameter name.  Errors raised by the
    /// handler are wrapped in [`AgentError::ToolExecution`] with the original cause
    /// preserved.
    pub async fn execute(
        &self,
        function_name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, AgentError> {
        let definition = self
            .registry
            .get(function_name)
            .ok_or_else(|| AgentError::ToolNotFound(function_name.to_string()))?;

        let handler = definition
            .handler
            .as_ref()
            .ok_or_else(|| AgentError::ToolNotImplemented(function_name.to_string()))?;

        handler(arguments.clone()).await.map_err(|e| {
            log::error!(
                "Error executing function {} with arguments {}: {}",
                function_name,
                arguments,
                e
            );
            AgentError::ToolExecution {
                name: function_name.to_string(),
                source: e,
            }
        })
    }

    /// Format an execution result as a string for the LLM.
    ///
    /// `Null` becomes the acknowledgement `"执行成功"`.  Arrays and objects are rendered
    /// as pretty-printed JSON with non-ASCII characters preserved.  Strings are returned
    /// unquoted; every other value uses its plain display form.
    pub fn format_result(&self, result: &serde_json::Value) -> String {
        match result {
            serde_json::Value::Null => "执行成功".to_string(),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                match serde_json::to_string_pretty(result) {
                    Ok(text) => text,
                    Err(e) => {
                        log::warn!("Failed to serialize result to JSON: {}, falling back", e);
                        result.to_string()
                    }
                }
            }
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
