//! Visitor check-in state machine
//!
//! `Pending` (no `checked_in_at`) moves once to `CheckedIn`. There is no way
//! back and no further transition out of `CheckedIn`.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{query::start_of_day, visitor::Visitor};

/// Business-rule rejections of a check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckInError {
    #[error("Already checked in.")]
    AlreadyCheckedIn,

    #[error("Cannot check in before expected date.")]
    TooEarly,
}

/// Decide whether `visitor` may check in at `now`; returns the timestamp to record
pub fn check_in(visitor: &Visitor, now: DateTime<Utc>) -> Result<DateTime<Utc>, CheckInError> {
    if visitor.checked_in_at.is_some() {
        return Err(CheckInError::AlreadyCheckedIn);
    }
    if now < start_of_day(visitor.expected_check_in_date) {
        return Err(CheckInError::TooEarly);
    }
    Ok(now)
}
