//! Response validation: checks parsed backend output against a per-content-type
//! field contract and normalizes whatever passes.
//!
//! # Field contract
//! - every required field is present, is a string, and is non-empty once trimmed
//! - bulleted fields get a leading bullet on every line unless one is already there
//! - bounded fields are hard-clipped, optionally ending in an ellipsis
//!
//! Array content (the roadmap) applies the contract per element and requires a
//! minimum element count; surplus elements are dropped.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::generation::prompts::INSTRUCTION_HEADERS;
use crate::llm_client::prompts::BULLET;
use crate::llm_client::CompletionError;

pub const ELLIPSIS: &str = "...";
/// Steps in every roadmap.
pub const ROADMAP_STEP_COUNT: usize = 3;

/// Post-processing contract for one required string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub bulleted: bool,
    pub max_chars: Option<usize>,
    pub ellipsis: bool,
}

impl FieldRule {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            bulleted: false,
            max_chars: None,
            ellipsis: false,
        }
    }

    pub const fn bulleted(self) -> Self {
        Self {
            bulleted: true,
            ..self
        }
    }

    pub const fn max_chars(self, max_chars: usize) -> Self {
        Self {
            max_chars: Some(max_chars),
            ..self
        }
    }

    pub const fn with_ellipsis(self) -> Self {
        Self {
            ellipsis: true,
            ..self
        }
    }

    /// Bullets first, then clipping, so the bound covers the glyphs too.
    fn apply(&self, value: &str) -> String {
        let value = if self.bulleted {
            ensure_bullets(value)
        } else {
            value.to_string()
        };
        match self.max_chars {
            Some(max_chars) => clip(&value, max_chars, self.ellipsis),
            None => value,
        }
    }
}

pub const RESUME_FEEDBACK_RULES: &[FieldRule] = &[
    FieldRule::text("general"),
    FieldRule::text("strengths").bulleted(),
    FieldRule::text("improvements").bulleted(),
];

pub const CAREER_ADVICE_RULES: &[FieldRule] = &[
    FieldRule::text("certifications").max_chars(100),
    FieldRule::text("skills").max_chars(100),
    FieldRule::text("tips").bulleted().max_chars(150),
];

pub const ROADMAP_STEP_RULES: &[FieldRule] = &[
    FieldRule::text("title").max_chars(50),
    FieldRule::text("description").max_chars(150).with_ellipsis(),
];

/// Validates a JSON object against `rules` and deserializes the normalized
/// fields into `T`. Fields not named by a rule are ignored.
pub fn validate_fields<T: DeserializeOwned>(
    parsed: &Value,
    rules: &[FieldRule],
) -> Result<T, CompletionError> {
    let object = parsed.as_object().ok_or_else(|| {
        CompletionError::SchemaViolation("response is not a JSON object".to_string())
    })?;

    let mut normalized = Map::new();
    for rule in rules {
        let value = object.get(rule.name).ok_or_else(|| {
            CompletionError::SchemaViolation(format!("missing required field: {}", rule.name))
        })?;
        let text = value.as_str().ok_or_else(|| {
            CompletionError::SchemaViolation(format!("field '{}' must be a string", rule.name))
        })?;
        let text = text.trim();
        if text.is_empty() {
            return Err(CompletionError::SchemaViolation(format!(
                "invalid or empty content for field: {}",
                rule.name
            )));
        }
        normalized.insert(rule.name.to_string(), Value::String(rule.apply(text)));
    }

    serde_json::from_value(Value::Object(normalized))
        .map_err(|e| CompletionError::SchemaViolation(e.to_string()))
}

/// Validates the first `count` elements of `items`; fewer than `count` is a violation.
pub fn validate_array<T: DeserializeOwned>(
    items: &[Value],
    rules: &[FieldRule],
    count: usize,
) -> Result<Vec<T>, CompletionError> {
    if items.len() < count {
        return Err(CompletionError::SchemaViolation(format!(
            "generated only {} items, need exactly {count}",
            items.len()
        )));
    }
    items
        .iter()
        .take(count)
        .map(|item| validate_fields(item, rules))
        .collect()
}

/// Splits free text on blank lines and pairs consecutive sections as
/// `{title, description}`. A trailing unpaired section is dropped. Prompt
/// headers that leaked into a description are removed.
pub fn pair_sections(text: &str) -> Vec<Value> {
    split_sections(text)
        .chunks_exact(2)
        .map(|pair| {
            json!({
                "title": pair[0],
                "description": strip_instruction_headers(&pair[1]),
            })
        })
        .collect()
}

fn split_sections(text: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                sections.push(current.join("\n").trim().to_string());
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        sections.push(current.join("\n").trim().to_string());
    }
    sections
}

fn strip_instruction_headers(text: &str) -> String {
    INSTRUCTION_HEADERS
        .iter()
        .fold(text.to_string(), |acc, header| acc.replace(header, ""))
        .trim()
        .to_string()
}

/// Prefixes every line with the bullet glyph, unless the text already opens with one.
pub fn ensure_bullets(text: &str) -> String {
    if text.starts_with(BULLET) {
        return text.to_string();
    }
    let text = text.replace("\r\n", "\n");
    format!("{BULLET} {}", text.replace('\n', &format!("\n{BULLET} ")))
}

/// Hard-clips to `max_chars` characters. With `ellipsis`, clipped text ends in
/// `...` and still fits the bound.
pub fn clip(text: &str, max_chars: usize, ellipsis: bool) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if ellipsis && max_chars > ELLIPSIS.len() {
        let kept: String = text.chars().take(max_chars - ELLIPSIS.len()).collect();
        format!("{kept}{ELLIPSIS}")
    } else {
        text.chars().take(max_chars).collect()
    }
}
