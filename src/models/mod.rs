//! Data models for Visitdesk

pub mod query;
pub mod stats;
pub mod user;
pub mod visitor;

// Re-export commonly used types
pub use query::{CheckInFilter, Page, PageRequest, Pagination, VisitorFilter, VisitorQuery};
pub use stats::{DashboardStats, NationalityCount};
pub use user::{Identity, Role, User, UserClaims, UserInfo};
pub use visitor::{NewVisitor, Visitor, VisitorDetails, VisitorRequest, VisitorResource};
