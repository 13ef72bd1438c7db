//! Function-calling walkthrough against a local OpenAI-compatible server.
//!
//! Point it at any service exposing `/chat/completions` (vLLM, Ollama, LocalAI):
//!
//! ```text
//! LLM_BASE_URL=http://localhost:8000/v1 LLM_MODEL=qwen \
//!     RUST_LOG=info cargo run --example function_calling
//! ```

use std::error::Error as StdError;

use agentllm::agent::Agent;
use agentllm::providers::{create_provider, ProviderOptions};
use agentllm::registry::{sync_handler, FunctionRegistry, ParamSpec};

#[tokio::main]
async fn main() -> Result<(), Box<dyn StdError>> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let base_url = std::env::var("LLM_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:8000/v1".to_string());
    let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "qwen".to_string());

    let provider = create_provider(
        "open_source",
        ProviderOptions::new()
            .with_base_url(base_url)
            .with_model(model),
    )?;

    let mut registry = FunctionRegistry::new();
    registry.register(
        "get_inventory",
        "查询指定商品的当前库存数量",
        vec![ParamSpec::of("name", "String").with_description("商品名称")],
        sync_handler(|args| {
            let name = args["name"].as_str().unwrap_or_default().to_string();
            Ok(serde_json::json!({"name": name, "stock": 7}))
        }),
    )?;

    let mut agent = Agent::new(provider)
        .with_registry(registry)
        .with_system_prompt("你是一个库存助手，回答前先查询库存。");

    let outcome = agent.chat("瑜伽垫还有多少库存?").await?;

    println!("assistant: {}", outcome.content);
    for call in &outcome.function_calls {
        println!("tool call: {} {}", call.name, call.arguments);
    }
    println!("iterations: {}", outcome.iterations);

    Ok(())
}
