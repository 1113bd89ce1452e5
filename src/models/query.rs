//! Visitor list filters and pagination
//!
//! A [`VisitorFilter`] is evaluated two ways: against a single visitor in
//! memory ([`VisitorFilter::matches`]) and as a SQL `WHERE` clause
//! ([`VisitorFilter::push_where`]). Both must agree.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::visitor::Visitor,
};

pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 100;

/// Start of a calendar day in UTC
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Query parameters for `GET /visitors`
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct VisitorQuery {
    /// Case-insensitive substring of full name, email or phone number
    pub search: Option<String>,
    /// Exact nationality
    pub nationality: Option<String>,
    /// `null` for pending visitors, or a check-in date (YYYY-MM-DD)
    pub checked_in_at: Option<String>,
    /// First check-in date of a range (YYYY-MM-DD), needs `checked_in_end`
    pub checked_in_start: Option<String>,
    /// Last check-in date of a range (YYYY-MM-DD), needs `checked_in_start`
    pub checked_in_end: Option<String>,
    /// Page number (1-based); unparsable values fall back to 1
    #[param(value_type = Option<i64>)]
    #[schema(value_type = Option<i64>)]
    pub page: Option<String>,
    /// Items per page (1-100, default 10); unparsable values fall back to 10
    #[param(value_type = Option<i64>)]
    #[schema(value_type = Option<i64>)]
    pub per_page: Option<String>,
}

/// Check-in state filter; the modes are mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInFilter {
    /// Not checked in yet
    Pending,
    /// Checked in on this UTC date
    On(NaiveDate),
    /// Checked in on a UTC date within the inclusive range
    Between(NaiveDate, NaiveDate),
}

impl CheckInFilter {
    pub fn matches(&self, checked_in_at: Option<DateTime<Utc>>) -> bool {
        match (self, checked_in_at) {
            (CheckInFilter::Pending, at) => at.is_none(),
            (_, None) => false,
            (CheckInFilter::On(date), Some(at)) => at.date_naive() == *date,
            (CheckInFilter::Between(start, end), Some(at)) => {
                let day = at.date_naive();
                *start <= day && day <= *end
            }
        }
    }

    /// Half-open UTC instant bounds for the date modes
    fn bounds(&self) -> Option<(DateTime<Utc>, Option<DateTime<Utc>>)> {
        let (first, last) = match *self {
            CheckInFilter::Pending => return None,
            CheckInFilter::On(date) => (date, date),
            CheckInFilter::Between(start, end) => (start, end),
        };
        Some((start_of_day(first), last.succ_opt().map(start_of_day)))
    }
}

/// Parsed visitor filter; all present conditions are ANDed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitorFilter {
    pub search: Option<String>,
    pub nationality: Option<String>,
    pub check_in: Option<CheckInFilter>,
}

/// Escape LIKE metacharacters so the term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl VisitorFilter {
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.nationality.is_none() && self.check_in.is_none()
    }

    /// Evaluate the filter against one visitor
    pub fn matches(&self, visitor: &Visitor) -> bool {
        if let Some(ref term) = self.search {
            let term = term.to_lowercase();
            let hit = [&visitor.full_name, &visitor.email, &visitor.phone_number]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }

        if let Some(ref nationality) = self.nationality {
            if visitor.nationality != *nationality {
                return false;
            }
        }

        match self.check_in {
            Some(ref filter) => filter.matches(visitor.checked_in_at),
            None => true,
        }
    }

    /// Append ` WHERE ...` for the `visitors` table
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(" WHERE TRUE");

        if let Some(ref term) = self.search {
            let pattern = format!("%{}%", escape_like(term));
            builder
                .push(" AND (full_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR phone_number ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(ref nationality) = self.nationality {
            builder
                .push(" AND nationality = ")
                .push_bind(nationality.clone());
        }

        if let Some(filter) = self.check_in {
            match filter.bounds() {
                None => {
                    builder.push(" AND checked_in_at IS NULL");
                }
                Some((from, until)) => {
                    builder.push(" AND checked_in_at >= ").push_bind(from);
                    if let Some(until) = until {
                        builder.push(" AND checked_in_at < ").push_bind(until);
                    }
                }
            }
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(field: &str, raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        AppError::invalid_field(
            field,
            format!("The {} field must be a date in YYYY-MM-DD format.", field),
        )
    })
}

impl VisitorQuery {
    /// Build the filter; a complete range takes precedence over `checked_in_at`
    pub fn filter(&self) -> AppResult<VisitorFilter> {
        let range = match (
            non_empty(&self.checked_in_start),
            non_empty(&self.checked_in_end),
        ) {
            (Some(start), Some(end)) => {
                let start = parse_date("checked_in_start", start)?;
                let end = parse_date("checked_in_end", end)?;
                if start > end {
                    return Err(AppError::invalid_field(
                        "checked_in_end",
                        "The checked in end must be a date after or equal to checked in start.",
                    ));
                }
                Some(CheckInFilter::Between(start, end))
            }
            _ => None,
        };

        let check_in = match (range, non_empty(&self.checked_in_at)) {
            (Some(range), _) => Some(range),
            (None, Some(raw)) if raw.eq_ignore_ascii_case("null") => Some(CheckInFilter::Pending),
            (None, Some(raw)) => Some(CheckInFilter::On(parse_date("checked_in_at", raw)?)),
            (None, None) => None,
        };

        Ok(VisitorFilter {
            // search is not trimmed: surrounding spaces are part of the term
            search: self.search.clone().filter(|s| !s.is_empty()),
            nationality: self.nationality.clone().filter(|s| !s.is_empty()),
            check_in,
        })
    }

    pub fn page_request(&self) -> PageRequest {
        fn number(raw: &Option<String>) -> Option<i64> {
            raw.as_deref().and_then(|s| s.trim().parse().ok())
        }
        PageRequest::new(number(&self.page), number(&self.per_page))
    }
}

/// Offset pagination request, already clamped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(1),
            per_page: per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination block of a list response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub per_page: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub has_more_pages: bool,
    pub next_page: Option<i64>,
    pub prev_page: Option<i64>,
}

impl Pagination {
    pub fn new(request: &PageRequest, total_items: i64) -> Self {
        let total_pages = ((total_items + request.per_page - 1) / request.per_page).max(1);
        let has_more_pages = request.page < total_pages;
        Self {
            per_page: request.per_page,
            current_page: request.page,
            total_pages,
            total_items,
            has_more_pages,
            next_page: has_more_pages.then_some(request.page + 1),
            prev_page: (request.page > 1).then_some(request.page - 1),
        }
    }
}

/// One page of results
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
