//! Provider resolution and failure handling without a reachable server.

use docqa_model::{
    create_embedding_model, create_generation_model, EmbeddingConfig, EmbeddingProviderKind,
    GenerationConfig, GenerationProviderKind, GenerationStrategy, ModelError,
};

/// Nothing listens on port 9 (discard) in the test environment.
const DEAD_URL: &str = "http://127.0.0.1:9";

fn dead_ollama() -> GenerationConfig {
    GenerationConfig {
        provider: GenerationProviderKind::Ollama,
        ollama_url: DEAD_URL.to_string(),
        timeout_secs: 2,
        max_retries: 1,
        retry_backoff_ms: 0,
        ..GenerationConfig::default()
    }
}

#[test]
fn ollama_strategy_is_selected_when_configured() {
    let strategy = GenerationStrategy::resolve(&dead_ollama());
    assert_eq!(strategy.name(), "ollama");
    assert!(!strategy.is_fallback());
}

#[test]
fn unreachable_provider_surfaces_generation_unavailable() {
    let model = create_generation_model(&dead_ollama());
    let err = model.complete("Question: anything").unwrap_err();
    match err {
        ModelError::GenerationUnavailable { attempts, .. } => assert_eq!(attempts, 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unreachable_embedding_server_is_an_embedding_error() {
    let config = EmbeddingConfig {
        provider: EmbeddingProviderKind::Ollama,
        ollama_url: DEAD_URL.to_string(),
        timeout_secs: 2,
        ..EmbeddingConfig::default()
    };
    let model = create_embedding_model(&config).unwrap();
    let err = model.embed(&["hello"]).unwrap_err();
    assert!(matches!(err, ModelError::EmbeddingFailed { .. }));
}

#[test]
fn openai_with_explicit_empty_key_falls_back() {
    // An all-whitespace key is treated as missing; the environment may still
    // supply one, in which case the OpenAI strategy is legitimately chosen.
    let config = GenerationConfig {
        api_key: Some("   ".to_string()),
        ..GenerationConfig::default()
    };
    let strategy = GenerationStrategy::resolve(&config);
    if std::env::var(docqa_model::OPENAI_API_KEY_ENV).is_err() {
        assert!(strategy.is_fallback());
    }
}
