//! Visitors repository (PostgreSQL)

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Pool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        query::{start_of_day, PageRequest, VisitorFilter},
        stats::{sort_nationalities, DashboardStats, NationalityCount},
        visitor::{NewVisitor, Visitor, VisitorDetails},
    },
};

use super::VisitorStore;

#[derive(Clone)]
pub struct VisitorsRepository {
    pool: Pool<Postgres>,
}

impl VisitorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitorStore for VisitorsRepository {
    async fn insert(&self, visitor: &NewVisitor) -> AppResult<Visitor> {
        let result = sqlx::query_as::<_, Visitor>(
            r#"
            INSERT INTO visitors (
                id, staff_id, full_name, email, phone_number, purpose_of_visit,
                expected_check_in_date, nationality, unique_code, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING *
            "#,
        )
        .bind(visitor.id)
        .bind(visitor.staff_id)
        .bind(&visitor.details.full_name)
        .bind(&visitor.details.email)
        .bind(&visitor.details.phone_number)
        .bind(&visitor.details.purpose_of_visit)
        .bind(visitor.details.expected_check_in_date)
        .bind(&visitor.details.nationality)
        .bind(&visitor.unique_code)
        .bind(visitor.created_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                format!("Unique code {} already in use", visitor.unique_code),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Visitor>> {
        let visitor = sqlx::query_as::<_, Visitor>("SELECT * FROM visitors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(visitor)
    }

    async fn get_by_code(&self, code: &str) -> AppResult<Option<Visitor>> {
        let visitor = sqlx::query_as::<_, Visitor>("SELECT * FROM visitors WHERE unique_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(visitor)
    }

    async fn update_details(
        &self,
        id: Uuid,
        details: &VisitorDetails,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Visitor>> {
        let visitor = sqlx::query_as::<_, Visitor>(
            r#"
            UPDATE visitors SET
                full_name = $1,
                email = $2,
                phone_number = $3,
                purpose_of_visit = $4,
                expected_check_in_date = $5,
                nationality = $6,
                updated_at = $7
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(&details.full_name)
        .bind(&details.email)
        .bind(&details.phone_number)
        .bind(&details.purpose_of_visit)
        .bind(details.expected_check_in_date)
        .bind(&details.nationality)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(visitor)
    }

    async fn mark_checked_in(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Option<Visitor>> {
        // Row lock on UPDATE serializes concurrent attempts; the loser re-evaluates
        // the predicate, sees a non-null checked_in_at and matches nothing.
        let visitor = sqlx::query_as::<_, Visitor>(
            r#"
            UPDATE visitors SET checked_in_at = $1, updated_at = $1
            WHERE id = $2 AND checked_in_at IS NULL
            RETURNING *
            "#,
        )
        .bind(at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(visitor)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM visitors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &VisitorFilter, page: &PageRequest) -> AppResult<(Vec<Visitor>, i64)> {
        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM visitors");
        filter.push_where(&mut count_builder);
        let total: i64 = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM visitors");
        filter.push_where(&mut builder);
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let visitors = builder
            .build_query_as::<Visitor>()
            .fetch_all(&self.pool)
            .await?;

        Ok((visitors, total))
    }

    async fn stats(&self, today: NaiveDate) -> AppResult<DashboardStats> {
        let day_start = start_of_day(today);
        let day_end = today.succ_opt().map(start_of_day);

        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_visitors,
                COUNT(*) FILTER (WHERE checked_in_at IS NOT NULL) AS checked_in_visitors,
                COUNT(*) FILTER (WHERE checked_in_at IS NULL) AS pending_visitors,
                COUNT(*) FILTER (
                    WHERE created_at >= $1 AND ($2::timestamptz IS NULL OR created_at < $2)
                ) AS visitors_today
            FROM visitors
            "#,
        )
        .bind(day_start)
        .bind(day_end)
        .fetch_one(&self.pool)
        .await?;

        let mut by_nationality = sqlx::query_as::<_, NationalityCount>(
            r#"
            SELECT nationality, COUNT(*) AS count
            FROM visitors
            GROUP BY nationality
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        sort_nationalities(&mut by_nationality);

        Ok(DashboardStats {
            total_visitors: row.get("total_visitors"),
            checked_in_visitors: row.get("checked_in_visitors"),
            pending_visitors: row.get("pending_visitors"),
            visitors_today: row.get("visitors_today"),
            visitors_by_nationality: by_nationality,
        })
    }
}
