//! Rental API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        rental::{ExtendRental, IssueRental, RentalView, ReturnRental},
        RentalStatus,
    },
};

use super::{AuthenticatedUser, JsonBody, MessageResponse};

/// Result of a ledger transition
#[derive(Serialize, ToSchema)]
pub struct RentalActionResponse {
    pub message: String,
    pub rental: RentalView,
}

/// List rentals (all for Admin, own for User)
#[utoipa::path(
    get,
    path = "/rental",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Rentals, newest first", body = Vec<RentalView>)
    )
)]
pub async fn list_rentals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<Vec<RentalView>>> {
    let rentals = state.services.rentals.list(&actor).await?;
    Ok(Json(rentals))
}

/// List active rentals
#[utoipa::path(
    get,
    path = "/rental/active",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active rentals", body = Vec<RentalView>)
    )
)]
pub async fn list_active(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<Vec<RentalView>>> {
    let rentals = state
        .services
        .rentals
        .list_by_status(&actor, RentalStatus::Active)
        .await?;
    Ok(Json(rentals))
}

/// List completed rentals
#[utoipa::path(
    get,
    path = "/rental/completed",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Completed rentals", body = Vec<RentalView>)
    )
)]
pub async fn list_completed(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<Vec<RentalView>>> {
    let rentals = state
        .services
        .rentals
        .list_by_status(&actor, RentalStatus::Completed)
        .await?;
    Ok(Json(rentals))
}

/// List overdue rentals
#[utoipa::path(
    get,
    path = "/rental/overdue",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue rentals", body = Vec<RentalView>),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_overdue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<Vec<RentalView>>> {
    let rentals = state
        .services
        .rentals
        .list_by_status(&actor, RentalStatus::Overdue)
        .await?;
    Ok(Json(rentals))
}

/// Get rental by ID
#[utoipa::path(
    get,
    path = "/rental/{id}",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Rental ID")),
    responses(
        (status = 200, description = "Rental details", body = RentalView),
        (status = 404, description = "Rental not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<RentalView>> {
    let rental = state.services.rentals.get(&actor, id).await?;
    Ok(Json(rental))
}

/// Rental history of a piece of equipment
#[utoipa::path(
    get,
    path = "/rental/equipment/{id}",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Rentals of this equipment, newest first", body = Vec<RentalView>)
    )
)]
pub async fn equipment_history(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<RentalView>>> {
    let rentals = state.services.rentals.equipment_history(&actor, id).await?;
    Ok(Json(rentals))
}

/// Rentals of a customer
#[utoipa::path(
    get,
    path = "/customer/{id}/rentals",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer rentals", body = Vec<RentalView>)
    )
)]
pub async fn customer_rentals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<RentalView>>> {
    let rentals = state.services.rentals.customer_rentals(&actor, id).await?;
    Ok(Json(rentals))
}

/// Unreturned rental of a customer, or `null`
#[utoipa::path(
    get,
    path = "/customer/{id}/active-rental",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Open rental, or null when none", body = RentalView)
    )
)]
pub async fn customer_active_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Option<RentalView>>> {
    let rental = state
        .services
        .rentals
        .customer_active_rental(&actor, id)
        .await?;
    Ok(Json(rental))
}

/// Issue equipment to a customer
#[utoipa::path(
    post,
    path = "/rental/issue",
    tag = "rentals",
    security(("bearer_auth" = [])),
    request_body = IssueRental,
    responses(
        (status = 201, description = "Rental issued", body = RentalActionResponse),
        (status = 400, description = "Equipment unavailable or customer already renting", body = crate::error::ErrorResponse)
    )
)]
pub async fn issue_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    JsonBody(request): JsonBody<IssueRental>,
) -> AppResult<(StatusCode, Json<RentalActionResponse>)> {
    let rental = state.services.rentals.issue(&actor, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(RentalActionResponse {
            message: "Equipment issued successfully".to_string(),
            rental,
        }),
    ))
}

/// Return rented equipment
#[utoipa::path(
    post,
    path = "/rental/return",
    tag = "rentals",
    security(("bearer_auth" = [])),
    request_body = ReturnRental,
    responses(
        (status = 200, description = "Rental completed", body = RentalActionResponse),
        (status = 400, description = "Rental is not active", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    JsonBody(request): JsonBody<ReturnRental>,
) -> AppResult<Json<RentalActionResponse>> {
    let rental = state.services.rentals.return_rental(&actor, request).await?;
    Ok(Json(RentalActionResponse {
        message: "Equipment returned successfully".to_string(),
        rental,
    }))
}

/// Extend the due date of an active rental
#[utoipa::path(
    put,
    path = "/rental/{id}",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Rental ID")),
    request_body = ExtendRental,
    responses(
        (status = 200, description = "Rental extended", body = RentalActionResponse)
    )
)]
pub async fn extend_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
    JsonBody(request): JsonBody<ExtendRental>,
) -> AppResult<Json<RentalActionResponse>> {
    let rental = state.services.rentals.extend(&actor, id, request).await?;
    Ok(Json(RentalActionResponse {
        message: "Rental extended successfully".to_string(),
        rental,
    }))
}

/// Cancel an unreturned rental
#[utoipa::path(
    delete,
    path = "/rental/{id}",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Rental ID")),
    responses(
        (status = 200, description = "Rental cancelled", body = MessageResponse)
    )
)]
pub async fn cancel_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.rentals.cancel(&actor, id).await?;
    Ok(Json(MessageResponse::new("Rental cancelled successfully")))
}
