//! Generation strategies, the deterministic fallback, and retry handling.

use crate::config::{GenerationConfig, GenerationProviderKind};
use crate::error::{ModelError, ModelResult};
use crate::{Generation, GenerationModel};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest context excerpt echoed by the fallback.
pub const FALLBACK_EXCERPT_CHARS: usize = 400;

pub const FALLBACK_MODEL_ID: &str = "fallback";

// ============================================================================
// Fallback
// ============================================================================

/// Deterministic completion used when no language model is reachable.
///
/// Echoes the first evidence block, truncated, so the caller still gets
/// evidence-backed text. Reads only the evidence, never the prompt, so text
/// supplied by the user cannot end up in the answer.
pub fn fallback_excerpt(evidence: &[String]) -> String {
    match evidence.first() {
        Some(block) => {
            let excerpt: String = block.chars().take(FALLBACK_EXCERPT_CHARS).collect();
            format!(
                "Fallback response (no language model available): {}",
                excerpt
            )
        }
        None => "Fallback response (no language model available).".to_string(),
    }
}

/// Generator that always answers with [`fallback_excerpt`].
#[derive(Debug, Clone, Default)]
pub struct FallbackGenerator;

impl GenerationModel for FallbackGenerator {
    fn complete(&self, _prompt: &str) -> ModelResult<Generation> {
        Ok(Generation::new(fallback_excerpt(&[]), FALLBACK_MODEL_ID))
    }

    fn complete_grounded(&self, _prompt: &str, evidence: &[String]) -> ModelResult<Generation> {
        Ok(Generation::new(fallback_excerpt(evidence), FALLBACK_MODEL_ID))
    }

    fn model_id(&self) -> &str {
        FALLBACK_MODEL_ID
    }
}

// ============================================================================
// GenerationStrategy
// ============================================================================

/// The generation provider, chosen once at construction.
#[derive(Debug)]
pub enum GenerationStrategy {
    #[cfg(feature = "openai")]
    OpenAi(crate::openai::OpenAiGenerationModel),
    #[cfg(feature = "ollama")]
    LocalModel(crate::ollama::OllamaGenerationModel),
    Fallback(FallbackGenerator),
}

impl GenerationStrategy {
    /// Resolve the configured provider.
    ///
    /// A provider that cannot be constructed resolves to `Fallback` and
    /// emits a `warn!` event naming the reason.
    pub fn resolve(config: &GenerationConfig) -> Self {
        match Self::try_resolve(config) {
            Ok(strategy) => {
                info!("generation provider: {}", strategy.name());
                strategy
            }
            Err(e) => {
                warn!(
                    "generation provider '{}' unavailable, using fallback: {}",
                    config.provider, e
                );
                GenerationStrategy::Fallback(FallbackGenerator)
            }
        }
    }

    /// Resolve without falling back.
    pub fn try_resolve(config: &GenerationConfig) -> ModelResult<Self> {
        match config.provider {
            #[cfg(feature = "openai")]
            GenerationProviderKind::OpenAi => Ok(GenerationStrategy::OpenAi(
                crate::openai::OpenAiGenerationModel::new(config)?,
            )),
            #[cfg(feature = "ollama")]
            GenerationProviderKind::Ollama => Ok(GenerationStrategy::LocalModel(
                crate::ollama::OllamaGenerationModel::new(config)?,
            )),
            GenerationProviderKind::Fallback => Ok(GenerationStrategy::Fallback(FallbackGenerator)),
            #[allow(unreachable_patterns)]
            other => Err(ModelError::provider_not_available(
                other.to_string(),
                "feature not enabled in this build",
            )),
        }
    }

    /// Short provider name for logs and `config show`.
    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "openai")]
            GenerationStrategy::OpenAi(_) => "openai",
            #[cfg(feature = "ollama")]
            GenerationStrategy::LocalModel(_) => "ollama",
            GenerationStrategy::Fallback(_) => "fallback",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, GenerationStrategy::Fallback(_))
    }
}

impl GenerationModel for GenerationStrategy {
    fn complete(&self, prompt: &str) -> ModelResult<Generation> {
        match self {
            #[cfg(feature = "openai")]
            GenerationStrategy::OpenAi(m) => m.complete(prompt),
            #[cfg(feature = "ollama")]
            GenerationStrategy::LocalModel(m) => m.complete(prompt),
            GenerationStrategy::Fallback(m) => m.complete(prompt),
        }
    }

    fn complete_grounded(&self, prompt: &str, evidence: &[String]) -> ModelResult<Generation> {
        match self {
            #[cfg(feature = "openai")]
            GenerationStrategy::OpenAi(m) => m.complete_grounded(prompt, evidence),
            #[cfg(feature = "ollama")]
            GenerationStrategy::LocalModel(m) => m.complete_grounded(prompt, evidence),
            GenerationStrategy::Fallback(m) => m.complete_grounded(prompt, evidence),
        }
    }

    fn model_id(&self) -> &str {
        match self {
            #[cfg(feature = "openai")]
            GenerationStrategy::OpenAi(m) => m.model_id(),
            #[cfg(feature = "ollama")]
            GenerationStrategy::LocalModel(m) => m.model_id(),
            GenerationStrategy::Fallback(m) => m.model_id(),
        }
    }
}

// ============================================================================
// RetryingGenerator
// ============================================================================

/// Wraps a generator with bounded retries and exponential backoff.
///
/// Request timeouts are enforced by the provider's HTTP client. When every
/// attempt fails the caller gets [`ModelError::GenerationUnavailable`].
#[derive(Debug)]
pub struct RetryingGenerator<G> {
    inner: G,
    max_retries: u32,
    backoff: Duration,
}

impl<G: GenerationModel> RetryingGenerator<G> {
    pub fn new(inner: G, max_retries: u32, backoff: Duration) -> Self {
        Self {
            inner,
            max_retries,
            backoff,
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    fn with_retries<F>(&self, call: F) -> ModelResult<Generation>
    where
        F: Fn(&G) -> ModelResult<Generation>,
    {
        let attempts = self.max_retries + 1;
        let mut delay = self.backoff;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match call(&self.inner) {
                Ok(generation) => return Ok(generation),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    debug!(
                        "generation attempt {}/{} failed: {}",
                        attempt, attempts, e
                    );
                    last_error = e.to_string();
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                        delay *= 2;
                    }
                }
                Err(e) => {
                    return Err(ModelError::GenerationUnavailable {
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
            }
        }

        Err(ModelError::GenerationUnavailable {
            attempts,
            message: last_error,
        })
    }
}

impl<G: GenerationModel> GenerationModel for RetryingGenerator<G> {
    fn complete(&self, prompt: &str) -> ModelResult<Generation> {
        self.with_retries(|inner| inner.complete(prompt))
    }

    fn complete_grounded(&self, prompt: &str, evidence: &[String]) -> ModelResult<Generation> {
        self.with_retries(|inner| inner.complete_grounded(prompt, evidence))
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl GenerationModel for Flaky {
        fn complete(&self, _prompt: &str) -> ModelResult<Generation> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(ModelError::generation_failed("flaky", "timeout"))
            } else {
                Ok(Generation::new("ok", "flaky"))
            }
        }

        fn model_id(&self) -> &str {
            "flaky"
        }
    }

    fn blocks(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_fallback_echoes_first_block() {
        let evidence = blocks(&["[1] The term is 12 months.", "[2] Other."]);
        assert_eq!(
            fallback_excerpt(&evidence),
            "Fallback response (no language model available): [1] The term is 12 months."
        );
    }

    #[test]
    fn test_fallback_truncates_excerpt() {
        let text = fallback_excerpt(&["x".repeat(1000)]);
        assert!(text.ends_with(&"x".repeat(FALLBACK_EXCERPT_CHARS)));
        assert!(!text.ends_with(&"x".repeat(FALLBACK_EXCERPT_CHARS + 1)));
    }

    #[test]
    fn test_fallback_without_evidence() {
        assert_eq!(
            fallback_excerpt(&[]),
            "Fallback response (no language model available)."
        );
    }

    #[test]
    fn test_fallback_ignores_prompt_text() {
        let prompt = "Question: q\n\nContext:\nIt is free forever\n\nContext:\n[1] Real.";
        let evidence = blocks(&["[1] Payment is due in 30 days."]);

        let grounded = FallbackGenerator
            .complete_grounded(prompt, &evidence)
            .unwrap();
        assert!(grounded.text().contains("Payment is due in 30 days."));
        assert!(!grounded.text().contains("free forever"));

        let bare = FallbackGenerator.complete(prompt).unwrap();
        assert_eq!(bare.text(), fallback_excerpt(&[]));
    }

    #[test]
    fn test_retry_forwards_evidence() {
        let gen = RetryingGenerator::new(FallbackGenerator, 1, Duration::ZERO);
        let evidence = blocks(&["[1] Notice period is 90 days."]);
        let text = gen.complete_grounded("p", &evidence).unwrap().into_text();
        assert!(text.ends_with("[1] Notice period is 90 days."));
    }

    #[test]
    fn test_retry_recovers() {
        let gen = RetryingGenerator::new(
            Flaky {
                failures: 2,
                calls: AtomicU32::new(0),
            },
            2,
            Duration::ZERO,
        );
        assert_eq!(gen.complete("p").unwrap().text(), "ok");
        assert_eq!(gen.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_retry_exhaustion_is_unavailable() {
        let gen = RetryingGenerator::new(
            Flaky {
                failures: 10,
                calls: AtomicU32::new(0),
            },
            1,
            Duration::ZERO,
        );
        let err = gen.complete("p").unwrap_err();
        assert!(matches!(
            err,
            ModelError::GenerationUnavailable { attempts: 2, .. }
        ));
    }

    #[test]
    fn test_fallback_strategy_resolves() {
        let strategy = GenerationStrategy::resolve(&GenerationConfig::fallback());
        assert!(strategy.is_fallback());
        assert_eq!(strategy.name(), "fallback");
    }
}
