//! Dashboard statistics endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, models::stats::DashboardStats};

use super::{response::ApiResponse, AuthenticatedUser};

/// Visitor counters for the dashboard
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard statistics", body = ApiResponse<DashboardStats>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let stats = state.services.stats.dashboard().await?;
    Ok(Json(ApiResponse::ok("Dashboard stats retrieved successfully.", stats)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    use crate::{api::test_support::TestApp, models::user::Role};

    #[tokio::test]
    async fn test_dashboard_counts() {
        let app = TestApp::new();
        let token = app.token(Uuid::now_v7(), Role::Admin).await;
        let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();

        for nationality in ["Peru", "Peru", "Fiji"] {
            let (status, _) = app
                .send(
                    "POST",
                    "/api/visitors",
                    Some(&token),
                    Some(json!({
                        "full_name": "Guest",
                        "email": "guest@example.com",
                        "phone_number": "5550000",
                        "purpose_of_visit": "Tour",
                        "expected_check_in_date": today,
                        "nationality": nationality
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = app.send("GET", "/api/dashboard/stats", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["total_visitors"], 3);
        assert_eq!(data["pending_visitors"], 3);
        assert_eq!(data["checked_in_visitors"], 0);
        assert_eq!(data["visitors_today"], 3);
        assert_eq!(data["visitors_by_nationality"][0]["nationality"], "Peru");
        assert_eq!(data["visitors_by_nationality"][0]["count"], 2);
    }
}
