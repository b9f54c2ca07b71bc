//! LLM Client: the single point of entry for all text-generation calls.
//!
//! ARCHITECTURAL RULE: No other module may call the generation backend directly.
//! Every call goes through `CompletionClient`, which applies rate limiting,
//! response caching, and output normalization in that order.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod cache;
pub mod gemini;
pub mod prompts;
pub mod rate_limiter;

pub use cache::{fingerprint, ResponseCache};
pub use gemini::GeminiBackend;
pub use rate_limiter::RateLimiter;

/// Every way a single completion attempt can fail. All of them are
/// recoverable by the retry orchestrator.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Rate limit exceeded ({limit} requests per minute)")]
    RateLimitExceeded { limit: u32 },

    #[error("Empty response from AI service")]
    EmptyResponse,

    #[error("Unstructured response: {0}")]
    UnstructuredResponse(String),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Backend error (status {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A text-generation backend. Returns `Ok(None)` when the backend answered
/// successfully but produced no text.
#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn generate(&self, prompt: &str, model: &str) -> Result<Option<String>, CompletionError>;
}

/// A normalized completion, plus the cache key it lives under.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub fingerprint: String,
    pub cached: bool,
}

#[derive(Clone)]
pub struct CompletionClient {
    backend: Arc<dyn TextBackend>,
    limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache>,
}

impl CompletionClient {
    pub fn new(
        backend: Arc<dyn TextBackend>,
        limiter: Arc<RateLimiter>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            backend,
            limiter,
            cache,
        }
    }

    /// Sends one prompt and returns normalized text.
    ///
    /// With `require_structured` the text is guaranteed to parse as JSON,
    /// possibly after slicing out the outermost `{...}`. Only successful,
    /// normalized completions are cached. No lock is held across the
    /// backend round trip.
    pub async fn complete(
        &self,
        prompt: &str,
        model: &str,
        require_structured: bool,
    ) -> Result<Completion, CompletionError> {
        self.limiter.admit()?;

        let key = fingerprint(prompt, model);
        if let Some(text) = self.cache.get(&key) {
            info!("Cache hit - returning cached response");
            return Ok(Completion {
                text,
                fingerprint: key,
                cached: true,
            });
        }

        let raw = self
            .backend
            .generate(prompt, model)
            .await
            .inspect_err(|e| warn!("Backend error with model {model}: {e}"))?
            .ok_or(CompletionError::EmptyResponse)?;
        debug!("Raw response from backend: {raw}");

        let text = strip_code_fences(&raw);
        if text.is_empty() {
            warn!("Empty text in backend response");
            return Err(CompletionError::EmptyResponse);
        }

        let text = if require_structured {
            ensure_structured(text)?
        } else {
            text.to_string()
        };

        self.cache.put(key.clone(), text.clone(), require_structured);
        info!("Successfully received response from backend (model: {model})");

        Ok(Completion {
            text,
            fingerprint: key,
            cached: false,
        })
    }

    /// Forgets a cached completion that turned out to be unusable.
    pub fn invalidate(&self, fingerprint: &str) {
        if self.cache.invalidate(fingerprint) {
            debug!("Invalidated cached response {fingerprint}");
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output and trims it.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // A fence may carry a format tag on its opening line. Anything else on
    // that line is content (a roadmap title, say) and stays.
    let rest = match rest.split_once('\n') {
        Some((tag, body)) if is_fence_tag(tag) => body,
        _ => match rest.strip_prefix("json") {
            Some(body) if body.trim_start().starts_with(['{', '[']) => body,
            _ => rest,
        },
    };

    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Format tags models put after an opening fence.
const FENCE_TAGS: &[&str] = &["json", "text", "txt", "plaintext", "markdown", "md"];

fn is_fence_tag(line: &str) -> bool {
    let tag = line.trim();
    tag.is_empty() || FENCE_TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t))
}

/// Returns text that parses as JSON, repairing it by keeping only the span from
/// the first `{` to the last `}` when the whole text does not parse.
fn ensure_structured(text: &str) -> Result<String, CompletionError> {
    if serde_json::from_str::<Value>(text).is_ok() {
        return Ok(text.to_string());
    }

    warn!("Response is not valid JSON, attempting repair");
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => {
            let candidate = &text[start..=end];
            serde_json::from_str::<Value>(candidate)
                .map(|_| candidate.to_string())
                .map_err(|e| {
                    CompletionError::UnstructuredResponse(format!(
                        "could not repair JSON response: {e}"
                    ))
                })
        }
        _ => Err(CompletionError::UnstructuredResponse(
            "could not find JSON structure in response".to_string(),
        )),
    }
}
