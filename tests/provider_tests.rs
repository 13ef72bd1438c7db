use agentllm::init_logger;
use agentllm::provider::LlmProvider;
use agentllm::providers::anthropic::{self, AnthropicProvider};
use agentllm::providers::minimax::{self, MiniMaxProvider};
use agentllm::providers::openai::{self, OpenAIProvider};

#[test]
fn test_openai_model_enum_constructor() {
    init_logger();

    let client = OpenAIProvider::new_with_model_enum("test-key", openai::Model::GPT4oMini);
    assert_eq!(client.model_name(), openai::DEFAULT_MODEL);
    assert!(client.supports_function_calling());

    let client = OpenAIProvider::new_with_model_enum("test-key", openai::Model::GPT41Mini);
    assert_eq!(client.model_name(), "gpt-4.1-mini");
}

#[test]
fn test_claude_model_enum_constructor() {
    init_logger();

    let client =
        AnthropicProvider::claude_with_model_enum("test-key", anthropic::Model::ClaudeSonnet4);
    assert_eq!(client.model_name(), anthropic::DEFAULT_CLAUDE_MODEL);
    assert!(client.supports_function_calling());

    let client =
        AnthropicProvider::claude_with_model_enum("test-key", anthropic::Model::ClaudeHaiku35);
    assert_eq!(client.model_name(), "claude-3-5-haiku-20241022");
}

#[test]
fn test_minimax_model_enum_constructor() {
    init_logger();

    let client = MiniMaxProvider::with_model_enum("test-key", minimax::Model::MiniMaxM25);
    assert_eq!(client.model_name(), minimax::DEFAULT_MINIMAX_MODEL);
    assert!(client.supports_function_calling());

    let client = MiniMaxProvider::with_model_enum("test-key", minimax::Model::MiniMaxM21HighSpeed);
    assert_eq!(client.model_name(), "MiniMax-M2.1-highspeed");
}

#[test]
fn test_open_source_constructor_model_name() {
    init_logger();

    let client = OpenAIProvider::open_source("http://localhost:8000/v1", "qwen", None, Some(120));
    assert_eq!(client.model_name(), "qwen");
}

#[test]
fn openai_model_identifiers() {
    assert_eq!(openai::model_to_string(openai::Model::GPT4o), "gpt-4o");
    assert_eq!(
        openai::model_to_string(openai::Model::GPT4oMini),
        "gpt-4o-mini"
    );
    assert_eq!(
        openai::model_to_string(openai::Model::GPT4Turbo),
        "gpt-4-turbo"
    );
    assert_eq!(openai::model_to_string(openai::Model::GPT41), "gpt-4.1");
    assert_eq!(
        openai::model_to_string(openai::Model::GPT41Mini),
        "gpt-4.1-mini"
    );
    assert_eq!(
        openai::model_to_string(openai::Model::GPT35Turbo),
        "gpt-3.5-turbo"
    );
    assert_eq!(openai::model_to_string(openai::Model::O3Mini), "o3-mini");
    assert_eq!(openai::model_to_string(openai::Model::O4Mini), "o4-mini");
}

#[test]
fn claude_model_identifiers() {
    assert_eq!(
        anthropic::model_to_string(anthropic::Model::ClaudeOpus41),
        "claude-opus-4-1"
    );
    assert_eq!(
        anthropic::model_to_string(anthropic::Model::ClaudeSonnet4),
        anthropic::DEFAULT_CLAUDE_MODEL
    );
    assert_eq!(
        anthropic::model_to_string(anthropic::Model::ClaudeSonnet35),
        "claude-3-5-sonnet-20241022"
    );
    assert_eq!(
        anthropic::model_to_string(anthropic::Model::ClaudeHaiku35),
        "claude-3-5-haiku-20241022"
    );
}

#[test]
fn minimax_model_identifiers() {
    assert_eq!(
        minimax::model_to_string(minimax::Model::MiniMaxM25),
        "MiniMax-M2.5"
    );
    assert_eq!(
        minimax::model_to_string(minimax::Model::MiniMaxM25HighSpeed),
        "MiniMax-M2.5-highspeed"
    );
    assert_eq!(
        minimax::model_to_string(minimax::Model::MiniMaxM21),
        "MiniMax-M2.1"
    );
    assert_eq!(
        minimax::model_to_string(minimax::Model::MiniMaxM21HighSpeed),
        "MiniMax-M2.1-highspeed"
    );
    assert_eq!(
        minimax::model_to_string(minimax::Model::MiniMaxM2),
        "MiniMax-M2"
    );
}
