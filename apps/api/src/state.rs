use std::sync::Arc;

use crate::facts::FactsStore;
use crate::generation::generator::ContentGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Backfills facts the client did not send. Postgres in production.
    pub facts: Arc<dyn FactsStore>,
    pub generator: ContentGenerator,
}
