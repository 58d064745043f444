//! Customer API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::customer::{CreateCustomer, Customer, UpdateCustomer},
};

use super::{AuthenticatedUser, JsonBody};

/// List customers
#[utoipa::path(
    get,
    path = "/customer",
    tag = "customers",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All customers", body = Vec<Customer>),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_customers(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<Vec<Customer>>> {
    let customers = state.services.customers.list(&actor).await?;
    Ok(Json(customers))
}

/// Get customer by ID
#[utoipa::path(
    get,
    path = "/customer/{id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer details", body = Customer),
        (status = 404, description = "Customer not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_customer(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Customer>> {
    let customer = state.services.customers.get_by_id(&actor, id).await?;
    Ok(Json(customer))
}

/// Get customer by username
#[utoipa::path(
    get,
    path = "/customer/username/{username}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("username" = String, Path, description = "Login name")),
    responses(
        (status = 200, description = "Customer details", body = Customer)
    )
)]
pub async fn get_customer_by_username(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(username): Path<String>,
) -> AppResult<Json<Customer>> {
    let customer = state
        .services
        .customers
        .get_by_username(&actor, &username)
        .await?;
    Ok(Json(customer))
}

/// Register a customer. Anonymous callers may sign up as User.
#[utoipa::path(
    post,
    path = "/customer",
    tag = "customers",
    request_body = CreateCustomer,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 400, description = "Invalid input or duplicate username", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_customer(
    State(state): State<crate::AppState>,
    user: Option<AuthenticatedUser>,
    JsonBody(data): JsonBody<CreateCustomer>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let actor = user.map(|AuthenticatedUser(actor)| actor);
    let customer = state.services.customers.create(actor.as_ref(), data).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Update customer
#[utoipa::path(
    put,
    path = "/customer/{id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Customer ID")),
    request_body = UpdateCustomer,
    responses(
        (status = 200, description = "Customer updated", body = Customer)
    )
)]
pub async fn update_customer(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
    JsonBody(data): JsonBody<UpdateCustomer>,
) -> AppResult<Json<Customer>> {
    let customer = state.services.customers.update(&actor, id, data).await?;
    Ok(Json(customer))
}

/// Delete customer
#[utoipa::path(
    delete,
    path = "/customer/{id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 400, description = "Customer holds an active rental", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_customer(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.customers.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
