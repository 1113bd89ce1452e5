//! Repository layer for database operations

#[cfg(test)]
pub mod memory;
pub mod users;
pub mod visitors;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        query::{PageRequest, VisitorFilter},
        stats::DashboardStats,
        visitor::{NewVisitor, Visitor, VisitorDetails},
    },
};

/// Persistence for visitor records
///
/// Implementations must make `mark_checked_in` a single atomic conditional
/// write: of two concurrent calls for the same id, at most one returns a row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitorStore: Send + Sync {
    /// Insert a visitor; `AppError::Conflict` if the unique code is taken
    async fn insert(&self, visitor: &NewVisitor) -> AppResult<Visitor>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Visitor>>;

    async fn get_by_code(&self, code: &str) -> AppResult<Option<Visitor>>;

    /// Overwrite the mutable fields; `None` if the row is gone
    async fn update_details(
        &self,
        id: Uuid,
        details: &VisitorDetails,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Visitor>>;

    /// Set `checked_in_at` only if still null; `None` if already checked in or gone
    async fn mark_checked_in(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Option<Visitor>>;

    /// Delete by id; false if no row was removed
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Matching visitors newest first, with the total match count
    async fn list(&self, filter: &VisitorFilter, page: &PageRequest) -> AppResult<(Vec<Visitor>, i64)>;

    async fn stats(&self, today: NaiveDate) -> AppResult<DashboardStats>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub visitors: visitors::VisitorsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            visitors: visitors::VisitorsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
