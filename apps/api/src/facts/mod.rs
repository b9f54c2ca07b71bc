//! Read access to a user's stored career facts.
//!
//! The generators never touch storage. Route handlers use a `FactsStore` to
//! backfill whatever the client did not send before calling into generation.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::facts::Experience;

pub mod store;

pub use store::PgFactsStore;

/// Looks up stored experiences by user email. Unknown users have no facts.
#[async_trait]
pub trait FactsStore: Send + Sync {
    async fn internships(&self, identifier: &str) -> Result<Vec<Experience>, AppError>;
    async fn milestones(&self, identifier: &str) -> Result<Vec<Experience>, AppError>;
}
