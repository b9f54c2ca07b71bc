// AI content generation: resume feedback, career advice, detailed roadmap.
// All backend calls go through llm_client; nothing here talks HTTP directly.

pub mod fallback;
pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod retry;
pub mod validator;
