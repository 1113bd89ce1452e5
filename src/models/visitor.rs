//! Visitor model and related types

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{field_errors, AppError, AppResult, FieldErrors};

/// Length of the self-service code handed to visitors
pub const UNIQUE_CODE_LEN: usize = 10;

const UNIQUE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random uppercase alphanumeric visitor code
pub fn generate_unique_code() -> String {
    let mut rng = rand::thread_rng();
    (0..UNIQUE_CODE_LEN)
        .map(|_| UNIQUE_CODE_ALPHABET[rng.gen_range(0..UNIQUE_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Whether a string has the shape of a visitor code
pub fn is_valid_unique_code(code: &str) -> bool {
    code.len() == UNIQUE_CODE_LEN
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Visitor record as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Visitor {
    pub id: Uuid,
    /// Account that registered the visitor
    pub staff_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub purpose_of_visit: String,
    pub expected_check_in_date: NaiveDate,
    /// Null while the visitor is pending
    pub checked_in_at: Option<DateTime<Utc>>,
    pub nationality: String,
    pub unique_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Visitor {
    pub fn status(&self) -> VisitorStatus {
        match self.checked_in_at {
            Some(_) => VisitorStatus::CheckedIn,
            None => VisitorStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum VisitorStatus {
    Pending,
    CheckedIn,
}

/// Visitor as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VisitorResource {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub purpose_of_visit: String,
    pub expected_check_in_date: NaiveDate,
    pub nationality: String,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub unique_code: String,
    pub status: VisitorStatus,
}

impl From<Visitor> for VisitorResource {
    fn from(v: Visitor) -> Self {
        let status = v.status();
        Self {
            id: v.id,
            full_name: v.full_name,
            email: v.email,
            phone_number: v.phone_number,
            purpose_of_visit: v.purpose_of_visit,
            expected_check_in_date: v.expected_check_in_date,
            nationality: v.nationality,
            checked_in_at: v.checked_in_at,
            unique_code: v.unique_code,
            status,
        }
    }
}

/// Create/update visitor request body
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct VisitorRequest {
    #[validate(
        required(message = "The full name field is required."),
        length(max = 150, message = "The full name field must not be greater than 150 characters.")
    )]
    pub full_name: Option<String>,
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address."),
        length(max = 100, message = "The email field must not be greater than 100 characters.")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "The phone number field is required."),
        length(max = 20, message = "The phone number field must not be greater than 20 characters.")
    )]
    pub phone_number: Option<String>,
    #[validate(
        required(message = "The purpose of visit field is required."),
        length(max = 500, message = "The purpose of visit field must not be greater than 500 characters.")
    )]
    pub purpose_of_visit: Option<String>,
    /// YYYY-MM-DD, today or later
    pub expected_check_in_date: Option<String>,
    #[validate(
        required(message = "The nationality field is required."),
        length(max = 100, message = "The nationality field must not be greater than 100 characters.")
    )]
    pub nationality: Option<String>,
}

/// Validated mutable visitor fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorDetails {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub purpose_of_visit: String,
    pub expected_check_in_date: NaiveDate,
    pub nationality: String,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl VisitorRequest {
    /// Validate the request against `today` (UTC) and extract the fields
    pub fn into_details(self, today: NaiveDate) -> AppResult<VisitorDetails> {
        let request = VisitorRequest {
            full_name: blank_to_none(self.full_name),
            email: blank_to_none(self.email),
            phone_number: blank_to_none(self.phone_number),
            purpose_of_visit: blank_to_none(self.purpose_of_visit),
            expected_check_in_date: blank_to_none(self.expected_check_in_date),
            nationality: blank_to_none(self.nationality),
        };

        let mut errors = match request.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => field_errors(&e),
        };

        let expected_check_in_date = match request.expected_check_in_date.as_deref() {
            None => {
                errors
                    .entry("expected_check_in_date".to_string())
                    .or_default()
                    .push("The expected check in date field is required.".to_string());
                None
            }
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) if date < today => {
                    errors
                        .entry("expected_check_in_date".to_string())
                        .or_default()
                        .push("The check-in date cannot be in the past.".to_string());
                    None
                }
                Ok(date) => Some(date),
                Err(_) => {
                    errors
                        .entry("expected_check_in_date".to_string())
                        .or_default()
                        .push("The expected check in date field must be a valid date.".to_string());
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        match (
            request.full_name,
            request.email,
            request.phone_number,
            request.purpose_of_visit,
            expected_check_in_date,
            request.nationality,
        ) {
            (
                Some(full_name),
                Some(email),
                Some(phone_number),
                Some(purpose_of_visit),
                Some(expected_check_in_date),
                Some(nationality),
            ) => Ok(VisitorDetails {
                full_name,
                email,
                phone_number,
                purpose_of_visit,
                expected_check_in_date,
                nationality,
            }),
            _ => Err(AppError::Internal(
                "Visitor request passed validation with missing fields".to_string(),
            )),
        }
    }
}

/// Row to insert on registration
#[derive(Debug, Clone)]
pub struct NewVisitor {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub details: VisitorDetails,
    pub unique_code: String,
    pub created_at: DateTime<Utc>,
}

impl NewVisitor {
    pub fn new(staff_id: Uuid, details: VisitorDetails, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            staff_id,
            details,
            unique_code: generate_unique_code(),
            created_at: now,
        }
    }

    pub fn into_visitor(self) -> Visitor {
        Visitor {
            id: self.id,
            staff_id: self.staff_id,
            full_name: self.details.full_name,
            email: self.details.email,
            phone_number: self.details.phone_number,
            purpose_of_visit: self.details.purpose_of_visit,
            expected_check_in_date: self.details.expected_check_in_date,
            checked_in_at: None,
            nationality: self.details.nationality,
            unique_code: self.unique_code,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Self check-in request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckInRequest {
    pub unique_code: Option<String>,
}
