//! API handlers for Visitdesk REST endpoints

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod openapi;
pub mod response;
pub mod visitors;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::Identity, AppState};

/// JSON body extractor whose rejections use the error envelope
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the error envelope
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor whose rejections use the error envelope
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

fn unauthenticated() -> AppError {
    AppError::Authentication("Unauthenticated.".to_string())
}

/// Bearer token of the request, if an Authorization header is present
fn bearer_token(parts: &Parts) -> Option<Result<&str, AppError>> {
    let header = parts.headers.get(AUTHORIZATION)?;
    Some(
        header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(unauthenticated),
    )
}

/// Extractor for the authenticated user behind a valid, unrevoked bearer token
pub struct AuthenticatedUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(unauthenticated)??;
        let identity = state.services.auth.validate_token(token).await?;
        Ok(AuthenticatedUser(identity))
    }
}

/// Like [`AuthenticatedUser`] but a missing header yields `None`.
/// A header that is present and invalid is still rejected.
pub struct MaybeUser(pub Option<Identity>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(MaybeUser(None)),
            Some(token) => {
                let identity = state.services.auth.validate_token(token?).await?;
                Ok(MaybeUser(Some(identity)))
            }
        }
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found.".to_string())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check).fallback(method_not_allowed))
        .route("/ready", get(health::readiness_check).fallback(method_not_allowed))
        // Authentication
        .route("/auth/login", post(auth::login).fallback(method_not_allowed))
        .route("/auth/logout", post(auth::logout).fallback(method_not_allowed))
        .route("/auth/me", get(auth::me).fallback(method_not_allowed))
        // Dashboard
        .route("/dashboard/stats", get(dashboard::stats).fallback(method_not_allowed))
        // Visitors
        .route(
            "/visitors",
            get(visitors::list_visitors)
                .post(visitors::create_visitor)
                .fallback(method_not_allowed),
        )
        .route("/visitors/check-in", post(visitors::check_in).fallback(method_not_allowed))
        // GET takes a unique code, PUT and DELETE a visitor id
        .route(
            "/visitors/:key",
            get(visitors::show_visitor)
                .put(visitors::update_visitor)
                .delete(visitors::delete_visitor)
                .fallback(method_not_allowed),
        )
        .fallback(not_found)
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
