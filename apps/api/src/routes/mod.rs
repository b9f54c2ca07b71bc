pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Generation API
        .route("/api/resume-feedback", post(handlers::handle_resume_feedback))
        .route("/api/career-advice", post(handlers::handle_career_advice))
        .route("/api/detailed-roadmap", post(handlers::handle_detailed_roadmap))
        // Paths used by older mobile clients
        .route("/get_resume_feedback", post(handlers::handle_resume_feedback))
        .route("/get_career_advice", post(handlers::handle_career_advice))
        .route("/get_detailed_roadmap", post(handlers::handle_detailed_roadmap))
        .with_state(state)
}
