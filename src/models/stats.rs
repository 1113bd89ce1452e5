//! Dashboard statistics

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::visitor::Visitor;

/// Visitor count for one nationality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct NationalityCount {
    pub nationality: String,
    pub count: i64,
}

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub total_visitors: i64,
    pub checked_in_visitors: i64,
    pub pending_visitors: i64,
    /// Visitors registered on the current UTC date
    pub visitors_today: i64,
    /// One row per distinct nationality, largest first
    pub visitors_by_nationality: Vec<NationalityCount>,
}

impl DashboardStats {
    /// Aggregate in a single pass
    pub fn aggregate<'a>(visitors: impl IntoIterator<Item = &'a Visitor>, today: NaiveDate) -> Self {
        let mut stats = DashboardStats::default();
        let mut by_nationality: HashMap<&str, i64> = HashMap::new();

        for visitor in visitors {
            stats.total_visitors += 1;
            if visitor.checked_in_at.is_some() {
                stats.checked_in_visitors += 1;
            } else {
                stats.pending_visitors += 1;
            }
            if visitor.created_at.date_naive() == today {
                stats.visitors_today += 1;
            }
            *by_nationality.entry(visitor.nationality.as_str()).or_default() += 1;
        }

        stats.visitors_by_nationality = by_nationality
            .into_iter()
            .map(|(nationality, count)| NationalityCount {
                nationality: nationality.to_string(),
                count,
            })
            .collect();
        sort_nationalities(&mut stats.visitors_by_nationality);
        stats
    }
}

/// Count descending, then nationality ascending
pub fn sort_nationalities(rows: &mut [NationalityCount]) {
    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.nationality.cmp(&b.nationality))
    });
}
