// src/lib.rs

// Import the top-level `agentllm` module.
pub mod agentllm;

// Re-exporting key items for easier external access.
pub use agentllm::agent::{Agent, ChatOutcome, FunctionCallRecord};
pub use agentllm::error::AgentError;
pub use agentllm::provider::{
    ChatOptions, LlmProvider, LlmResponse, Message, Role, TokenUsage, ToolCall,
};
pub use agentllm::providers::{create_provider, ProviderOptions};
pub use agentllm::registry::FunctionRegistry;

// Module aliases so paths read as agentllm::provider::... rather than
// agentllm::agentllm::provider::...
pub use agentllm::{agent, error, executor, provider, providers, registry};

/// Initialize a process-wide [`env_logger`] from the `RUST_LOG` environment variable.
///
/// Intended for binaries and tests; only the first call installs the logger, repeated
/// calls are no-ops.
pub fn init_logger() {
    let _ = env_logger::Builder::from_default_env().try_init();
}
