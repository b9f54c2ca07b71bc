//! Bounded retry around the prompt → completion → parse → validate pipeline.
//!
//! `RetryOrchestrator::run` never fails: it returns either a validated result
//! or the fallback catalog entry for the content type.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::generation::fallback::FallbackCatalog;
use crate::llm_client::{CompletionClient, CompletionError};
use crate::models::content::ContentType;
use crate::models::facts::UserFacts;

/// Largest backoff multiple applied to the base delay.
const MAX_BACKOFF_FACTOR: u32 = 8;

/// A content type the orchestrator knows how to generate.
pub trait ContentSpec: Sized + Send {
    const CONTENT_TYPE: ContentType;
    /// Attempts before falling back.
    const MAX_ATTEMPTS: u32;
    /// Whether the backend must return a JSON object.
    const STRUCTURED: bool;

    fn build_prompt(facts: &UserFacts) -> String;

    /// Parses and validates normalized completion text.
    fn parse(text: &str) -> Result<Self, CompletionError>;

    /// Last-chance local repair of text that failed `parse`.
    fn repair(_text: &str, _catalog: &FallbackCatalog) -> Option<Self> {
        None
    }

    fn fallback(catalog: &FallbackCatalog) -> Self;
}

/// Result of one pipeline pass.
#[derive(Debug)]
pub enum Attempt<T> {
    Success(T),
    Retry(CompletionError),
}

/// Result of a whole run.
#[derive(Debug)]
pub enum Outcome<T> {
    Generated { value: T, attempts: u32 },
    /// The attempt budget was exhausted.
    Fallback {
        value: T,
        last_error: Option<CompletionError>,
    },
}

#[derive(Clone)]
pub struct RetryOrchestrator {
    client: CompletionClient,
    catalog: Arc<FallbackCatalog>,
    default_model: String,
    fallback_model: String,
    backoff: Duration,
}

impl RetryOrchestrator {
    pub fn new(
        client: CompletionClient,
        catalog: Arc<FallbackCatalog>,
        default_model: String,
        fallback_model: String,
    ) -> Self {
        Self {
            client,
            catalog,
            default_model,
            fallback_model,
            backoff: Duration::ZERO,
        }
    }

    /// Base delay between attempts. Zero (the default) retries immediately.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn run<C: ContentSpec>(&self, facts: &UserFacts) -> Outcome<C> {
        let prompt = C::build_prompt(facts);
        let max_attempts = C::MAX_ATTEMPTS.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                self.pause(attempt - 1).await;
            }

            let model = self.model_for(attempt, max_attempts);
            match self.attempt::<C>(&prompt, model).await {
                Attempt::Success(value) => {
                    info!(
                        "Successfully generated {} on attempt {attempt}",
                        C::CONTENT_TYPE
                    );
                    return Outcome::Generated {
                        value,
                        attempts: attempt,
                    };
                }
                Attempt::Retry(err) => {
                    warn!(
                        "{} attempt {attempt}/{max_attempts} failed: {err}",
                        C::CONTENT_TYPE
                    );
                    last_error = Some(err);
                }
            }
        }

        error!(
            "All {max_attempts} attempts to generate {} failed, serving fallback content",
            C::CONTENT_TYPE
        );
        Outcome::Fallback {
            value: C::fallback(&self.catalog),
            last_error,
        }
    }

    async fn attempt<C: ContentSpec>(&self, prompt: &str, model: &str) -> Attempt<C> {
        let completion = match self.client.complete(prompt, model, C::STRUCTURED).await {
            Ok(completion) => completion,
            Err(err) => return Attempt::Retry(err),
        };
        if completion.cached {
            debug!("Using cached {} response", C::CONTENT_TYPE);
        }

        match C::parse(&completion.text) {
            Ok(value) => Attempt::Success(value),
            Err(err) => {
                if let Some(value) = C::repair(&completion.text, &self.catalog) {
                    info!("Repaired {} response locally after: {err}", C::CONTENT_TYPE);
                    return Attempt::Success(value);
                }
                // The next attempt must not be served the same unusable text.
                self.client.invalidate(&completion.fingerprint);
                Attempt::Retry(err)
            }
        }
    }

    /// The last attempt of a multi-attempt run goes to the fallback model.
    fn model_for(&self, attempt: u32, max_attempts: u32) -> &str {
        if max_attempts > 1 && attempt == max_attempts {
            &self.fallback_model
        } else {
            &self.default_model
        }
    }

    async fn pause(&self, retry: u32) {
        if self.backoff.is_zero() {
            return;
        }
        let factor = 2u32
            .saturating_pow(retry.saturating_sub(1))
            .min(MAX_BACKOFF_FACTOR);
        tokio::time::sleep(self.backoff * factor).await;
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::Value;

    use super::*;
    use crate::generation::validator::{validate_fields, FieldRule};
    use crate::llm_client::{RateLimiter, ResponseCache};
    use crate::testing::ScriptedBackend;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Echo {
        word: String,
    }

    const ECHO_RULES: &[FieldRule] = &[FieldRule::text("word")];

    impl ContentSpec for Echo {
        const CONTENT_TYPE: ContentType = ContentType::CareerAdvice;
        const MAX_ATTEMPTS: u32 = 3;
        const STRUCTURED: bool = true;

        fn build_prompt(facts: &UserFacts) -> String {
            format!("echo for {}", facts.identifier)
        }

        fn parse(text: &str) -> Result<Self, CompletionError> {
            let value: Value = serde_json::from_str(text)
                .map_err(|e| CompletionError::UnstructuredResponse(e.to_string()))?;
            validate_fields(&value, ECHO_RULES)
        }

        fn fallback(_catalog: &FallbackCatalog) -> Self {
            Echo {
                word: "fallback".to_string(),
            }
        }
    }

    fn value<T>(outcome: Outcome<T>) -> T {
        match outcome {
            Outcome::Generated { value, .. } | Outcome::Fallback { value, .. } => value,
        }
    }

    fn orchestrator(backend: Arc<ScriptedBackend>, limit: u32) -> RetryOrchestrator {
        let client = CompletionClient::new(
            backend,
            Arc::new(RateLimiter::new(limit)),
            Arc::new(ResponseCache::new(Duration::from_secs(3600), 100)),
        );
        RetryOrchestrator::new(
            client,
            Arc::new(FallbackCatalog::builtin()),
            "primary".to_string(),
            "secondary".to_string(),
        )
    }

    #[tokio::test]
    async fn test_first_valid_attempt_wins() {
        let backend = Arc::new(ScriptedBackend::new([r#"{"word": "hello"}"#]));
        let outcome = orchestrator(Arc::clone(&backend), 60)
            .run::<Echo>(&UserFacts::new("u"))
            .await;
        assert!(matches!(outcome, Outcome::Generated { attempts: 1, .. }));
        assert_eq!(value(outcome).word, "hello");
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_schema_violation_retries_past_cache() {
        let backend = Arc::new(ScriptedBackend::new([
            r#"{"other": 1}"#,
            r#"{"word": "second"}"#,
        ]));
        let outcome = orchestrator(Arc::clone(&backend), 60)
            .run::<Echo>(&UserFacts::new("u"))
            .await;
        assert!(matches!(outcome, Outcome::Generated { attempts: 2, .. }));
        assert_eq!(value(outcome).word, "second");
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_serves_fallback() {
        let backend = Arc::new(ScriptedBackend::failing(500));
        let outcome = orchestrator(Arc::clone(&backend), 60)
            .run::<Echo>(&UserFacts::new("u"))
            .await;
        assert!(matches!(outcome, Outcome::Fallback { .. }));
        assert_eq!(backend.calls().len(), 3);
        match outcome {
            Outcome::Fallback { value, last_error } => {
                assert_eq!(value.word, "fallback");
                assert!(matches!(
                    last_error,
                    Some(CompletionError::Backend { status: 500, .. })
                ));
            }
            Outcome::Generated { .. } => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_last_attempt_uses_fallback_model() {
        let backend = Arc::new(ScriptedBackend::failing(503));
        orchestrator(Arc::clone(&backend), 60)
            .run::<Echo>(&UserFacts::new("u"))
            .await;
        let models: Vec<String> = backend.calls().into_iter().map(|(_, m)| m).collect();
        assert_eq!(models, vec!["primary", "primary", "secondary"]);
    }

    #[tokio::test]
    async fn test_rate_limit_counts_as_failed_attempt() {
        let backend = Arc::new(ScriptedBackend::new([r#"{"word": "never"}"#]));
        let outcome = orchestrator(Arc::clone(&backend), 0)
            .run::<Echo>(&UserFacts::new("u"))
            .await;
        assert!(matches!(outcome, Outcome::Fallback { .. }));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_delays_between_attempts() {
        let backend = Arc::new(ScriptedBackend::failing(500));
        let orchestrator =
            orchestrator(Arc::clone(&backend), 60).with_backoff(Duration::from_millis(100));
        let start = tokio::time::Instant::now();
        let outcome = orchestrator.run::<Echo>(&UserFacts::new("u")).await;
        assert!(matches!(outcome, Outcome::Fallback { .. }));
        // 100ms before attempt 2, 200ms before attempt 3.
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
