mod config;
mod errors;
mod facts;
mod generation;
mod llm_client;
mod models;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::facts::PgFactsStore;
use crate::generation::fallback::FallbackCatalog;
use crate::generation::generator::ContentGenerator;
use crate::generation::retry::RetryOrchestrator;
use crate::llm_client::{CompletionClient, GeminiBackend, RateLimiter, ResponseCache};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars or a placeholder API key)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Career API v{}", env!("CARGO_PKG_VERSION"));

    let ai = &config.ai;

    // Backend must answer before we accept traffic
    let backend = GeminiBackend::new(ai.api_key.clone(), &ai.api_url)?;
    backend
        .probe(&ai.default_model)
        .await
        .context("Initial backend connectivity check failed")?;
    info!("Gemini backend reachable (model: {})", ai.default_model);

    let catalog = FallbackCatalog::load(ai.fallback_catalog_path.as_deref())?;

    let limiter = Arc::new(RateLimiter::new(ai.max_requests_per_minute));
    let cache = Arc::new(ResponseCache::new(ai.cache_timeout, ai.max_cache_size));
    let client = CompletionClient::new(Arc::new(backend), limiter, Arc::clone(&cache));
    let orchestrator = RetryOrchestrator::new(
        client,
        Arc::new(catalog),
        ai.default_model.clone(),
        ai.fallback_model.clone(),
    )
    .with_backoff(ai.retry_backoff);
    info!(
        "Generation ready ({} req/min, cache {}s x {} entries, fallback model {})",
        ai.max_requests_per_minute,
        ai.cache_timeout.as_secs(),
        ai.max_cache_size,
        ai.fallback_model
    );

    spawn_cache_sweeper(Arc::clone(&cache), ai.cache_sweep_interval);

    // Initialize PostgreSQL
    let facts = PgFactsStore::connect(&config.database_url).await?;

    // Build app state
    let state = AppState {
        facts: Arc::new(facts),
        generator: ContentGenerator::new(orchestrator),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the mobile client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drops expired, surplus and unparseable cache entries.
fn spawn_cache_sweeper(cache: Arc<ResponseCache>, period: std::time::Duration) {
    if period.is_zero() {
        warn!("CACHE_SWEEP_INTERVAL is 0, background cache sweeping disabled");
        return;
    }
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            if cache.is_empty() {
                continue;
            }
            let expired = cache.sweep();
            let invalid = cache.sweep_invalid();
            if expired + invalid > 0 {
                info!(
                    "Cache sweep removed {expired} stale and {invalid} invalid entries, {} remain",
                    cache.len()
                );
            }
        }
    });
}
