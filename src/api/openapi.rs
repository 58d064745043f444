//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, customers, equipment, health, rentals};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Equipment Rental API",
        version = "0.1.0",
        description = "Equipment, customer and rental ledger REST API"
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::me,
        // Equipment
        equipment::list_equipment,
        equipment::list_available,
        equipment::list_rented,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        // Customers
        customers::list_customers,
        customers::get_customer,
        customers::get_customer_by_username,
        customers::create_customer,
        customers::update_customer,
        customers::delete_customer,
        // Rentals
        rentals::list_rentals,
        rentals::list_active,
        rentals::list_completed,
        rentals::list_overdue,
        rentals::get_rental,
        rentals::equipment_history,
        rentals::customer_rentals,
        rentals::customer_active_rental,
        rentals::issue_rental,
        rentals::return_rental,
        rentals::extend_rental,
        rentals::cancel_rental,
    ),
    components(
        schemas(
            crate::models::Category,
            crate::models::Condition,
            crate::models::Role,
            crate::models::RentalStatus,
            crate::models::equipment::Equipment,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            crate::models::customer::Customer,
            crate::models::customer::CreateCustomer,
            crate::models::customer::UpdateCustomer,
            crate::models::rental::Rental,
            crate::models::rental::RentalView,
            crate::models::rental::IssueRental,
            crate::models::rental::ReturnRental,
            crate::models::rental::ExtendRental,
            rentals::RentalActionResponse,
            crate::api::MessageResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Caller identity"),
        (name = "equipment", description = "Equipment registry"),
        (name = "customers", description = "Customer registry"),
        (name = "rentals", description = "Rental ledger")
    )
)]
pub struct ApiDoc;

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

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
