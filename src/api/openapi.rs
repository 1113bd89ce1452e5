//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, dashboard, health, response, visitors};

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Visitdesk API",
        version = "1.0.0",
        description = "Visitor registration and check-in REST API"
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::logout,
        auth::me,
        // Dashboard
        dashboard::stats,
        // Visitors
        visitors::create_visitor,
        visitors::list_visitors,
        visitors::show_visitor,
        visitors::update_visitor,
        visitors::delete_visitor,
        visitors::check_in,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::LoginRequest,
            crate::models::user::UserInfo,
            crate::models::user::Role,
            auth::LoginResponse,
            // Visitors
            crate::models::visitor::VisitorRequest,
            crate::models::visitor::VisitorResource,
            crate::models::visitor::VisitorStatus,
            crate::models::visitor::CheckInRequest,
            crate::models::query::Pagination,
            // Dashboard
            crate::models::stats::DashboardStats,
            crate::models::stats::NationalityCount,
            // Envelope
            response::MessageResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "dashboard", description = "Dashboard statistics"),
        (name = "visitors", description = "Visitor registration and check-in")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
