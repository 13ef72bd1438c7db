//! Error types shared across the runtime.

use std::error::Error;
use std::fmt;

/// Error kinds surfaced by the agent runtime.
#[derive(Debug)]
pub enum AgentError {
    /// Invalid setup: unknown provider kind, missing required option, bad registration.
    Configuration(String),
    /// HTTP failure, auth failure, or malformed response from an LLM backend.
    Provider(String),
    /// The LLM called a name that is not registered.
    ToolNotFound(String),
    /// The registry entry exists but carries no callable implementation.
    ToolNotImplemented(String),
    /// The tool's own code failed; the original cause is preserved.
    ToolExecution {
        name: String,
        source: Box<dyn Error + Send + Sync>,
    },
    /// Tool-call arguments were not valid JSON.
    ArgumentDecode(String),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            AgentError::Provider(msg) => write!(f, "Provider error: {}", msg),
            AgentError::ToolNotFound(name) => {
                write!(f, "Function {} not found in registry", name)
            }
            AgentError::ToolNotImplemented(name) => {
                write!(f, "Function {} has no implementation", name)
            }
            AgentError::ToolExecution { name, source } => {
                write!(f, "Function {} failed: {}", name, source)
            }
            AgentError::ArgumentDecode(msg) => {
                write!(f, "Failed to decode tool-call arguments: {}", msg)
            }
        }
    }
}

impl Error for AgentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AgentError::ToolExecution { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
