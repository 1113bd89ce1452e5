//! In-memory visitor store for tests

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        query::{PageRequest, VisitorFilter},
        stats::DashboardStats,
        visitor::{NewVisitor, Visitor, VisitorDetails},
    },
};

use super::VisitorStore;

#[derive(Default)]
pub struct MemoryVisitorStore {
    rows: Mutex<Vec<Visitor>>,
}

impl MemoryVisitorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed row, bypassing code generation
    pub fn seed(&self, visitor: Visitor) {
        self.lock().push(visitor);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Visitor>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl VisitorStore for MemoryVisitorStore {
    async fn insert(&self, visitor: &NewVisitor) -> AppResult<Visitor> {
        let mut rows = self.lock();
        if rows.iter().any(|v| v.unique_code == visitor.unique_code) {
            return Err(AppError::Conflict(format!(
                "Unique code {} already in use",
                visitor.unique_code
            )));
        }
        let row = visitor.clone().into_visitor();
        rows.push(row.clone());
        Ok(row)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Visitor>> {
        Ok(self.lock().iter().find(|v| v.id == id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> AppResult<Option<Visitor>> {
        Ok(self.lock().iter().find(|v| v.unique_code == code).cloned())
    }

    async fn update_details(
        &self,
        id: Uuid,
        details: &VisitorDetails,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Visitor>> {
        let mut rows = self.lock();
        let Some(row) = rows.iter_mut().find(|v| v.id == id) else {
            return Ok(None);
        };
        row.full_name = details.full_name.clone();
        row.email = details.email.clone();
        row.phone_number = details.phone_number.clone();
        row.purpose_of_visit = details.purpose_of_visit.clone();
        row.expected_check_in_date = details.expected_check_in_date;
        row.nationality = details.nationality.clone();
        row.updated_at = now;
        Ok(Some(row.clone()))
    }

    async fn mark_checked_in(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Option<Visitor>> {
        let mut rows = self.lock();
        match rows.iter_mut().find(|v| v.id == id && v.checked_in_at.is_none()) {
            Some(row) => {
                row.checked_in_at = Some(at);
                row.updated_at = at;
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut rows = self.lock();
        let before = rows.len();
        rows.retain(|v| v.id != id);
        Ok(rows.len() < before)
    }

    async fn list(&self, filter: &VisitorFilter, page: &PageRequest) -> AppResult<(Vec<Visitor>, i64)> {
        let mut matching: Vec<Visitor> = self
            .lock()
            .iter()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .collect();
        Ok((items, total))
    }

    async fn stats(&self, today: NaiveDate) -> AppResult<DashboardStats> {
        Ok(DashboardStats::aggregate(self.lock().iter(), today))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn new_visitor(code: &str) -> NewVisitor {
        let now = Utc::now();
        let mut visitor = NewVisitor::new(
            Uuid::now_v7(),
            VisitorDetails {
                full_name: "Kofi Mensah".to_string(),
                email: "kofi@example.com".to_string(),
                phone_number: "0244000000".to_string(),
                purpose_of_visit: "Interview".to_string(),
                expected_check_in_date: now.date_naive(),
                nationality: "Ghana".to_string(),
            },
            now,
        );
        visitor.unique_code = code.to_string();
        visitor
    }

    #[test]
    fn test_duplicate_code_conflicts() {
        let store = MemoryVisitorStore::new();
        tokio_test::block_on(async {
            store.insert(&new_visitor("AAAAAAAAAA")).await.unwrap();
            let dup = store.insert(&new_visitor("AAAAAAAAAA")).await;
            assert!(matches!(dup, Err(AppError::Conflict(_))));
        });
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_mark_checked_in_only_once() {
        let store = MemoryVisitorStore::new();
        tokio_test::block_on(async {
            let visitor = store.insert(&new_visitor("BBBBBBBBBB")).await.unwrap();
            let first = Utc::now();
            let second = first + Duration::minutes(5);

            let marked = store.mark_checked_in(visitor.id, first).await.unwrap();
            assert_eq!(marked.unwrap().checked_in_at, Some(first));
            assert!(store.mark_checked_in(visitor.id, second).await.unwrap().is_none());

            let stored = store.get_by_id(visitor.id).await.unwrap().unwrap();
            assert_eq!(stored.checked_in_at, Some(first));
        });
    }
}
