use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::gemini::DEFAULT_API_URL;

/// Value shipped in the sample `.env`; never a real credential.
const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub ai: AiConfig,
}

/// Settings consumed by the completion pipeline.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub api_url: String,
    pub default_model: String,
    pub fallback_model: String,
    pub max_requests_per_minute: u32,
    pub cache_timeout: Duration,
    pub max_cache_size: usize,
    pub cache_sweep_interval: Duration,
    /// Zero means retries happen immediately.
    pub retry_backoff: Duration,
    pub fallback_catalog_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: parse_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            ai: AiConfig::from_env()?,
        })
    }
}

impl AiConfig {
    fn from_env() -> Result<Self> {
        let api_key = validate_api_key(std::env::var("GEMINI_API_KEY").ok())?;

        Ok(AiConfig {
            api_key,
            api_url: env_or("GEMINI_API_URL", DEFAULT_API_URL),
            default_model: env_or("GEMINI_MODEL", "models/gemini-1.5-flash-8b"),
            fallback_model: env_or("GEMINI_FALLBACK_MODEL", "models/gemma-3-4b-it"),
            max_requests_per_minute: parse_or("MAX_REQUESTS_PER_MINUTE", 60)?,
            cache_timeout: Duration::from_secs(parse_or("CACHE_TIMEOUT", 3600)?),
            max_cache_size: parse_or("MAX_CACHE_SIZE", 1000)?,
            cache_sweep_interval: Duration::from_secs(parse_or("CACHE_SWEEP_INTERVAL", 300)?),
            retry_backoff: Duration::from_millis(parse_or("RETRY_BACKOFF_MS", 0)?),
            fallback_catalog_path: std::env::var_os("FALLBACK_CATALOG_PATH").map(PathBuf::from),
        })
    }
}

/// A missing, blank, or placeholder credential is fatal.
fn validate_api_key(value: Option<String>) -> Result<String> {
    let Some(key) = value.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) else {
        bail!("Required environment variable 'GEMINI_API_KEY' is not set");
    };
    if key == PLACEHOLDER_API_KEY {
        bail!("GEMINI_API_KEY still holds the placeholder value; set a real API key");
    }
    Ok(key)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_value(key, std::env::var(key).ok().as_deref(), default)
}

fn parse_value<T>(key: &str, raw: Option<&str>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
    }
}
