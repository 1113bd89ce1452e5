//! Dashboard statistics service

use std::sync::Arc;

use chrono::Utc;

use crate::{error::AppResult, models::stats::DashboardStats, repository::VisitorStore};

#[derive(Clone)]
pub struct StatsService {
    store: Arc<dyn VisitorStore>,
}

impl StatsService {
    pub fn new(store: Arc<dyn VisitorStore>) -> Self {
        Self { store }
    }

    /// Counters over the whole visitor table, recomputed on every call
    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let today = Utc::now().date_naive();
        tracing::debug!("Computing dashboard stats for {}", today);
        self.store.stats(today).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::*;
    use crate::{
        models::visitor::{NewVisitor, VisitorDetails},
        repository::memory::MemoryVisitorStore,
    };

    fn seed(store: &MemoryVisitorStore, nationality: &str, checked_in: bool) {
        let now = Utc::now();
        let details = VisitorDetails {
            full_name: "Visitor".to_string(),
            email: "visitor@example.com".to_string(),
            phone_number: "1234567890".to_string(),
            purpose_of_visit: "Tour".to_string(),
            expected_check_in_date: now.date_naive(),
            nationality: nationality.to_string(),
        };
        let mut visitor = NewVisitor::new(Uuid::now_v7(), details, now).into_visitor();
        if checked_in {
            visitor.checked_in_at = Some(now + Duration::seconds(1));
        }
        store.seed(visitor);
    }

    #[tokio::test]
    async fn test_stats_are_recomputed() {
        let store = Arc::new(MemoryVisitorStore::new());
        let stats = StatsService::new(store.clone());

        assert_eq!(stats.dashboard().await.unwrap(), DashboardStats::default());

        seed(&store, "Ghana", true);
        seed(&store, "Ghana", false);
        seed(&store, "Chile", false);

        let result = stats.dashboard().await.unwrap();
        assert_eq!(result.total_visitors, 3);
        assert_eq!(result.checked_in_visitors, 1);
        assert_eq!(result.pending_visitors, 2);
        assert_eq!(result.visitors_today, 3);
        assert_eq!(result.visitors_by_nationality[0].nationality, "Ghana");
        assert_eq!(result.visitors_by_nationality[0].count, 2);

        seed(&store, "Chile", false);
        let result = stats.dashboard().await.unwrap();
        assert_eq!(result.total_visitors, 4);
        // Tie on count: alphabetical
        assert_eq!(result.visitors_by_nationality[0].nationality, "Chile");
    }
}
