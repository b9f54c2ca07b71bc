use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::errors::AppError;
use crate::facts::FactsStore;
use crate::models::facts::Experience;

/// Milestone dates render as `YYYY-MM-DD`.
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, FromRow)]
struct InternshipRow {
    company: Option<String>,
    role: Option<String>,
    dates: Option<String>,
    description: Option<String>,
}

impl From<InternshipRow> for Experience {
    fn from(row: InternshipRow) -> Self {
        Experience::internship(row.company, row.role, row.dates, row.description)
    }
}

#[derive(Debug, FromRow)]
struct MilestoneRow {
    title: Option<String>,
    date: Option<NaiveDate>,
    description: Option<String>,
}

impl From<MilestoneRow> for Experience {
    fn from(row: MilestoneRow) -> Self {
        Experience::milestone(
            row.title,
            row.date.map(|d| d.format(DATE_FORMAT).to_string()),
            row.description,
        )
    }
}

/// Postgres-backed facts store over the `users`, `internships` and `milestones` tables.
#[derive(Clone)]
pub struct PgFactsStore {
    pool: PgPool,
}

impl PgFactsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        info!("Connecting to PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        info!("PostgreSQL connection pool established");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl FactsStore for PgFactsStore {
    async fn internships(&self, identifier: &str) -> Result<Vec<Experience>, AppError> {
        let rows = sqlx::query_as::<_, InternshipRow>(
            r#"
            SELECT i.company, i.role, i.dates, i.description
            FROM internships i
            JOIN users u ON u.id = i.user_id
            WHERE u.email = $1
            ORDER BY i.id
            "#,
        )
        .bind(identifier)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Experience::from).collect())
    }

    async fn milestones(&self, identifier: &str) -> Result<Vec<Experience>, AppError> {
        let rows = sqlx::query_as::<_, MilestoneRow>(
            r#"
            SELECT m.title, m.date, m.description
            FROM milestones m
            JOIN users u ON u.id = m.user_id
            WHERE u.email = $1
            ORDER BY m.id
            "#,
        )
        .bind(identifier)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Experience::from).collect())
    }
}
