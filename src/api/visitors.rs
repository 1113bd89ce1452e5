//! Visitor endpoints

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        query::VisitorQuery,
        visitor::{is_valid_unique_code, CheckInRequest, VisitorRequest, VisitorResource, UNIQUE_CODE_LEN},
    },
    services::policy::Actor,
};

use super::{
    response::{ApiResponse, MessageResponse, PaginatedResponse},
    ApiJson, ApiPath, ApiQuery, AuthenticatedUser, MaybeUser,
};

/// Register a visitor
#[utoipa::path(
    post,
    path = "/visitors",
    tag = "visitors",
    security(("bearer_auth" = [])),
    request_body = VisitorRequest,
    responses(
        (status = 201, description = "Visitor registered", body = ApiResponse<VisitorResource>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 422, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ApiJson(request): ApiJson<VisitorRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<VisitorResource>>)> {
    let visitor = state
        .services
        .visitors
        .register(&Actor::from(identity), request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Visitor registered successfully.", visitor.into())),
    ))
}

/// List visitors with filters and pagination
#[utoipa::path(
    get,
    path = "/visitors",
    tag = "visitors",
    security(("bearer_auth" = [])),
    params(VisitorQuery),
    responses(
        (status = 200, description = "Page of visitors, newest first", body = PaginatedResponse<VisitorResource>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 422, description = "Invalid filter", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_visitors(
    State(state): State<crate::AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ApiQuery(query): ApiQuery<VisitorQuery>,
) -> AppResult<Json<PaginatedResponse<VisitorResource>>> {
    let filter = query.filter()?;
    let page = state
        .services
        .visitors
        .list(&Actor::from(identity), &filter, &query.page_request())
        .await?;

    Ok(Json(PaginatedResponse::ok(
        "Visitors retrieved successfully.",
        page.map(VisitorResource::from),
    )))
}

/// Get a visitor by unique code
#[utoipa::path(
    get,
    path = "/visitors/{unique_code}",
    tag = "visitors",
    params(
        ("unique_code" = String, Path, description = "10-character visitor code")
    ),
    responses(
        (status = 200, description = "Visitor details", body = ApiResponse<VisitorResource>),
        (status = 404, description = "Visitor not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn show_visitor(
    State(state): State<crate::AppState>,
    ApiPath(code): ApiPath<String>,
) -> AppResult<Json<ApiResponse<VisitorResource>>> {
    if !is_valid_unique_code(&code) {
        return Err(AppError::NotFound("Visitor not found.".to_string()));
    }

    let visitor = state.services.visitors.show_by_code(&code).await?;
    Ok(Json(ApiResponse::ok("Visitor retrieved successfully.", visitor.into())))
}

/// Update a visitor's details
#[utoipa::path(
    put,
    path = "/visitors/{id}",
    tag = "visitors",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Visitor ID")
    ),
    request_body = VisitorRequest,
    responses(
        (status = 200, description = "Visitor updated", body = ApiResponse<VisitorResource>),
        (status = 403, description = "Not the visitor's registrar", body = crate::error::ErrorResponse),
        (status = 404, description = "Visitor not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<VisitorRequest>,
) -> AppResult<Json<ApiResponse<VisitorResource>>> {
    let visitor = state
        .services
        .visitors
        .update_details(&Actor::from(identity), id, request)
        .await?;

    Ok(Json(ApiResponse::ok("Visitor updated successfully.", visitor.into())))
}

/// Delete a visitor
#[utoipa::path(
    delete,
    path = "/visitors/{id}",
    tag = "visitors",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Visitor ID")
    ),
    responses(
        (status = 200, description = "Visitor deleted", body = MessageResponse),
        (status = 403, description = "Not the visitor's registrar", body = crate::error::ErrorResponse),
        (status = 404, description = "Visitor not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .visitors
        .remove(&Actor::from(identity), id)
        .await?;

    Ok(Json(MessageResponse::ok("Visitor record deleted.")))
}

/// Check a visitor in with their unique code
///
/// Works without credentials. With a bearer token the caller acts as that
/// user, so staff can only check in visitors they registered.
#[utoipa::path(
    post,
    path = "/visitors/check-in",
    tag = "visitors",
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Check-in successful", body = ApiResponse<VisitorResource>),
        (status = 400, description = "Already checked in, or before the expected date", body = crate::error::ErrorResponse),
        (status = 404, description = "Visitor not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Invalid code", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_in(
    State(state): State<crate::AppState>,
    MaybeUser(identity): MaybeUser,
    ApiJson(request): ApiJson<CheckInRequest>,
) -> AppResult<Json<ApiResponse<VisitorResource>>> {
    let code = request
        .unique_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::invalid_field("unique_code", "The unique code field is required."))?;

    if code.chars().count() != UNIQUE_CODE_LEN {
        return Err(AppError::invalid_field(
            "unique_code",
            format!("The unique code field must be {} characters.", UNIQUE_CODE_LEN),
        ));
    }

    let visitor = state
        .services
        .visitors
        .check_in(&Actor::from(identity), code)
        .await?;

    Ok(Json(ApiResponse::ok("Check-in successful!", visitor.into())))
}
