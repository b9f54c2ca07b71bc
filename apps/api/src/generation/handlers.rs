//! Axum route handlers for the generation API.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::AppError;
use crate::models::content::{ContentType, GeneratedContent};
use crate::models::facts::{ingest_records, Experience, UserFacts};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Body shared by all three generation endpoints. Only `email` is required;
/// absent or empty experience lists are loaded from the facts store.
#[derive(Debug, Default, Deserialize)]
pub struct GenerationRequest {
    pub email: Option<String>,
    pub internships: Option<Vec<Map<String, Value>>>,
    pub milestones: Option<Vec<Map<String, Value>>>,
    pub skills: Option<Vec<String>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/resume-feedback
pub async fn handle_resume_feedback(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GeneratedContent>, AppError> {
    generate(&state, request, ContentType::ResumeFeedback).await
}

/// POST /api/career-advice
pub async fn handle_career_advice(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GeneratedContent>, AppError> {
    generate(&state, request, ContentType::CareerAdvice).await
}

/// POST /api/detailed-roadmap
///
/// Responds with a JSON array of exactly three `{title, description}` steps.
pub async fn handle_detailed_roadmap(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GeneratedContent>, AppError> {
    generate(&state, request, ContentType::DetailedRoadmap).await
}

async fn generate(
    state: &AppState,
    request: GenerationRequest,
    content_type: ContentType,
) -> Result<Json<GeneratedContent>, AppError> {
    let facts = resolve_facts(state, request).await?;
    Ok(Json(state.generator.generate(content_type, &facts).await))
}

// ────────────────────────────────────────────────────────────────────────────
// Fact resolution
// ────────────────────────────────────────────────────────────────────────────

async fn resolve_facts(state: &AppState, request: GenerationRequest) -> Result<UserFacts, AppError> {
    let email = request
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;

    let mut facts = UserFacts::new(email).with_skills(request.skills.unwrap_or_default());

    facts.internships = ingest_records(&request.internships.unwrap_or_default());
    if facts.internships.is_empty() {
        facts.internships = backfill(
            state.facts.internships(&facts.identifier).await,
            "internships",
            &facts.identifier,
        );
    }

    facts.milestones = ingest_records(&request.milestones.unwrap_or_default());
    if facts.milestones.is_empty() {
        facts.milestones = backfill(
            state.facts.milestones(&facts.identifier).await,
            "milestones",
            &facts.identifier,
        );
    }

    Ok(facts)
}

/// Store failures degrade to an empty list; generation still runs.
fn backfill(
    result: Result<Vec<Experience>, AppError>,
    kind: &str,
    identifier: &str,
) -> Vec<Experience> {
    result.unwrap_or_else(|e| {
        warn!("Could not load {kind} for {identifier}: {e}");
        Vec::new()
    })
}
