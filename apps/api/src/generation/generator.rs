//! Content generation: PromptBuilder → RetryOrchestrator → typed result.
//!
//! Each content type implements `ContentSpec`, which tells the orchestrator how
//! many attempts it gets, whether the backend must answer in JSON, and how the
//! normalized text becomes a validated value.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::generation::fallback::FallbackCatalog;
use crate::generation::prompts::build_prompt;
use crate::generation::retry::{ContentSpec, Outcome, RetryOrchestrator};
use crate::generation::validator::{
    pair_sections, validate_array, validate_fields, CAREER_ADVICE_RULES, RESUME_FEEDBACK_RULES,
    ROADMAP_STEP_COUNT, ROADMAP_STEP_RULES,
};
use crate::llm_client::CompletionError;
use crate::models::content::{
    CareerAdvice, ContentType, GeneratedContent, ResumeFeedback, Roadmap,
};
use crate::models::facts::UserFacts;

// ────────────────────────────────────────────────────────────────────────────
// Content contracts
// ────────────────────────────────────────────────────────────────────────────

fn parse_json(text: &str) -> Result<Value, CompletionError> {
    serde_json::from_str(text).map_err(|e| CompletionError::UnstructuredResponse(e.to_string()))
}

impl ContentSpec for ResumeFeedback {
    const CONTENT_TYPE: ContentType = ContentType::ResumeFeedback;
    /// One pass; local repair stands in for further attempts.
    const MAX_ATTEMPTS: u32 = 1;
    const STRUCTURED: bool = true;

    fn build_prompt(facts: &UserFacts) -> String {
        build_prompt(facts, Self::CONTENT_TYPE)
    }

    fn parse(text: &str) -> Result<Self, CompletionError> {
        validate_fields(&parse_json(text)?, RESUME_FEEDBACK_RULES)
    }

    /// Coerces arrays, numbers and booleans to strings and fills anything still
    /// missing or blank from the fallback entry.
    fn repair(text: &str, catalog: &FallbackCatalog) -> Option<Self> {
        let parsed = parse_json(text).ok()?;
        let object = parsed.as_object()?;
        let fallback = serde_json::to_value(&catalog.resume_feedback).ok()?;

        let mut repaired = Map::new();
        for rule in RESUME_FEEDBACK_RULES {
            let value = object
                .get(rule.name)
                .and_then(coerce_to_text)
                .filter(|text| !text.trim().is_empty())
                .or_else(|| fallback.get(rule.name)?.as_str().map(str::to_string))?;
            repaired.insert(rule.name.to_string(), Value::String(value));
        }

        validate_fields(&Value::Object(repaired), RESUME_FEEDBACK_RULES).ok()
    }

    fn fallback(catalog: &FallbackCatalog) -> Self {
        catalog.resume_feedback.clone()
    }
}

fn coerce_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(items) => {
            let lines: Vec<String> = items.iter().filter_map(coerce_to_text).collect();
            Some(lines.join("\n"))
        }
        Value::Null | Value::Object(_) => None,
    }
}

impl ContentSpec for CareerAdvice {
    const CONTENT_TYPE: ContentType = ContentType::CareerAdvice;
    const MAX_ATTEMPTS: u32 = 3;
    const STRUCTURED: bool = true;

    fn build_prompt(facts: &UserFacts) -> String {
        build_prompt(facts, Self::CONTENT_TYPE)
    }

    fn parse(text: &str) -> Result<Self, CompletionError> {
        validate_fields(&parse_json(text)?, CAREER_ADVICE_RULES)
    }

    fn fallback(catalog: &FallbackCatalog) -> Self {
        catalog.career_advice.clone()
    }
}

impl ContentSpec for Roadmap {
    const CONTENT_TYPE: ContentType = ContentType::DetailedRoadmap;
    const MAX_ATTEMPTS: u32 = 3;
    /// Roadmaps come back as alternating title/description paragraphs.
    const STRUCTURED: bool = false;

    fn build_prompt(facts: &UserFacts) -> String {
        build_prompt(facts, Self::CONTENT_TYPE)
    }

    fn parse(text: &str) -> Result<Self, CompletionError> {
        let sections = pair_sections(text);
        validate_array(&sections, ROADMAP_STEP_RULES, ROADMAP_STEP_COUNT).map(Roadmap)
    }

    fn fallback(catalog: &FallbackCatalog) -> Self {
        catalog.detailed_roadmap.clone()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generator
// ────────────────────────────────────────────────────────────────────────────

/// Entry point for the route layer. Every method returns a well-formed result,
/// generated or fallback.
#[derive(Clone)]
pub struct ContentGenerator {
    orchestrator: RetryOrchestrator,
}

impl ContentGenerator {
    pub fn new(orchestrator: RetryOrchestrator) -> Self {
        Self { orchestrator }
    }

    pub async fn resume_feedback(&self, facts: &UserFacts) -> ResumeFeedback {
        settle(self.orchestrator.run(facts).await, &facts.identifier)
    }

    pub async fn career_advice(&self, facts: &UserFacts) -> CareerAdvice {
        settle(self.orchestrator.run(facts).await, &facts.identifier)
    }

    pub async fn detailed_roadmap(&self, facts: &UserFacts) -> Roadmap {
        settle(self.orchestrator.run(facts).await, &facts.identifier)
    }

    pub async fn generate(&self, content_type: ContentType, facts: &UserFacts) -> GeneratedContent {
        info!(
            "Generating {content_type} for {} ({} internships, {} milestones, {} skills)",
            facts.identifier,
            facts.internships.len(),
            facts.milestones.len(),
            facts.skills.len()
        );
        match content_type {
            ContentType::ResumeFeedback => {
                GeneratedContent::ResumeFeedback(self.resume_feedback(facts).await)
            }
            ContentType::CareerAdvice => {
                GeneratedContent::CareerAdvice(self.career_advice(facts).await)
            }
            ContentType::DetailedRoadmap => {
                GeneratedContent::DetailedRoadmap(self.detailed_roadmap(facts).await)
            }
        }
    }
}

fn settle<C: ContentSpec>(outcome: Outcome<C>, identifier: &str) -> C {
    match outcome {
        Outcome::Generated { value, attempts } => {
            debug!(
                "{} for {identifier} generated in {attempts} attempt(s)",
                C::CONTENT_TYPE
            );
            value
        }
        Outcome::Fallback { value, last_error } => {
            match last_error {
                Some(err) => warn!(
                    "Serving fallback {} to {identifier}, last error: {err}",
                    C::CONTENT_TYPE
                ),
                None => warn!("Serving fallback {} to {identifier}", C::CONTENT_TYPE),
            }
            value
        }
    }
}
