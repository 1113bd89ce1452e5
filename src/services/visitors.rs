//! Visitor registration, check-in and query service

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        query::{Page, PageRequest, Pagination, VisitorFilter},
        visitor::{NewVisitor, Visitor, VisitorRequest},
    },
    repository::VisitorStore,
    services::{
        check_in::{check_in, CheckInError},
        policy::{authorize, Actor, VisitorAction},
    },
};

/// Attempts at finding a free unique code before giving up
const MAX_CODE_ATTEMPTS: usize = 5;

/// Source of the current time
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

fn visitor_not_found() -> AppError {
    AppError::NotFound("Visitor not found.".to_string())
}

#[derive(Clone)]
pub struct VisitorService {
    store: Arc<dyn VisitorStore>,
    clock: Clock,
}

impl VisitorService {
    pub fn new(store: Arc<dyn VisitorStore>) -> Self {
        Self::with_clock(store, Arc::new(Utc::now))
    }

    pub fn with_clock(store: Arc<dyn VisitorStore>, clock: Clock) -> Self {
        Self { store, clock }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Register a visitor on behalf of the acting staff member
    pub async fn register(&self, actor: &Actor, request: VisitorRequest) -> AppResult<Visitor> {
        authorize(actor, VisitorAction::Create)?;
        let Actor::Authenticated(identity) = actor else {
            return Err(AppError::Authentication("Unauthenticated.".to_string()));
        };

        let now = self.now();
        let details = request.into_details(now.date_naive())?;

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let new_visitor = NewVisitor::new(identity.id, details.clone(), now);
            match self.store.insert(&new_visitor).await {
                Ok(visitor) => {
                    tracing::info!(
                        "Visitor {} registered by {} with code {}",
                        visitor.id,
                        identity.id,
                        visitor.unique_code
                    );
                    return Ok(visitor);
                }
                Err(AppError::Conflict(msg)) => {
                    tracing::warn!("Unique code collision (attempt {}): {}", attempt, msg);
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Internal(format!(
            "Could not allocate a unique visitor code after {} attempts",
            MAX_CODE_ATTEMPTS
        )))
    }

    /// Replace the mutable fields of a visitor
    pub async fn update_details(&self, actor: &Actor, id: Uuid, request: VisitorRequest) -> AppResult<Visitor> {
        let visitor = self.store.get_by_id(id).await?.ok_or_else(visitor_not_found)?;
        authorize(actor, VisitorAction::Update(&visitor))?;

        let now = self.now();
        let details = request.into_details(now.date_naive())?;

        let updated = self
            .store
            .update_details(id, &details, now)
            .await?
            .ok_or_else(visitor_not_found)?;
        tracing::info!("Visitor {} updated", id);
        Ok(updated)
    }

    /// Filtered, paginated listing, newest first
    pub async fn list(&self, actor: &Actor, filter: &VisitorFilter, page: &PageRequest) -> AppResult<Page<Visitor>> {
        authorize(actor, VisitorAction::ViewAny)?;

        let (items, total) = self.store.list(filter, page).await?;
        tracing::debug!("Listed {} of {} visitors (page {})", items.len(), total, page.page);
        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    /// Check a visitor in by their unique code
    pub async fn check_in(&self, actor: &Actor, code: &str) -> AppResult<Visitor> {
        let visitor = self.store.get_by_code(code).await?.ok_or_else(visitor_not_found)?;
        authorize(actor, VisitorAction::CheckIn(&visitor))?;

        let at = check_in(&visitor, self.now())?;

        let Some(checked_in) = self.store.mark_checked_in(visitor.id, at).await? else {
            // Either a concurrent check-in won or the row was deleted meanwhile
            return match self.store.get_by_id(visitor.id).await? {
                Some(_) => Err(CheckInError::AlreadyCheckedIn.into()),
                None => Err(visitor_not_found()),
            };
        };

        tracing::info!("Visitor {} checked in at {}", checked_in.id, at);
        Ok(checked_in)
    }

    /// Public lookup by unique code
    pub async fn show_by_code(&self, code: &str) -> AppResult<Visitor> {
        tracing::debug!("Looking up visitor by code");
        self.store.get_by_code(code).await?.ok_or_else(visitor_not_found)
    }

    /// Delete a visitor record
    pub async fn remove(&self, actor: &Actor, id: Uuid) -> AppResult<()> {
        let visitor = self.store.get_by_id(id).await?.ok_or_else(visitor_not_found)?;
        authorize(actor, VisitorAction::Delete(&visitor))?;

        if !self.store.delete(id).await? {
            return Err(visitor_not_found());
        }
        tracing::info!("Visitor {} deleted", id);
        Ok(())
    }
}
