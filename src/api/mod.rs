//! API handlers for the rental REST endpoints

pub mod auth;
pub mod customers;
pub mod equipment;
pub mod health;
pub mod openapi;
pub mod rentals;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{error::AppError, policy::Actor, AppState};

/// Extractor for the authenticated actor from a bearer JWT
pub struct AuthenticatedUser(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = auth::ActorClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims.actor()))
    }
}

/// JSON request body whose rejections render as `BadValue` errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Plain acknowledgement body
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/me", get(auth::me))
        // Equipment
        .route(
            "/equipment",
            get(equipment::list_equipment).post(equipment::create_equipment),
        )
        .route("/equipment/available", get(equipment::list_available))
        .route("/equipment/rented", get(equipment::list_rented))
        .route(
            "/equipment/:id",
            get(equipment::get_equipment)
                .put(equipment::update_equipment)
                .delete(equipment::delete_equipment),
        )
        // Customers
        .route(
            "/customer",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route(
            "/customer/username/:username",
            get(customers::get_customer_by_username),
        )
        .route(
            "/customer/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route("/customer/:id/rentals", get(rentals::customer_rentals))
        .route("/customer/:id/active-rental", get(rentals::customer_active_rental))
        // Rentals
        .route("/rental", get(rentals::list_rentals))
        .route("/rental/active", get(rentals::list_active))
        .route("/rental/completed", get(rentals::list_completed))
        .route("/rental/overdue", get(rentals::list_overdue))
        .route("/rental/equipment/:id", get(rentals::equipment_history))
        .route("/rental/issue", post(rentals::issue_rental))
        .route("/rental/return", post(rentals::return_rental))
        .route(
            "/rental/:id",
            get(rentals::get_rental)
                .put(rentals::extend_rental)
                .delete(rentals::cancel_rental),
        )
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
