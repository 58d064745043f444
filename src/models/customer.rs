//! Customer model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::Role;

/// Customer account, created locally or provisioned from an SSO identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    /// Login name. Absent for SSO-originated accounts.
    pub username: Option<String>,
    /// Argon2 hash
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    pub role: Role,
    pub external_provider: Option<String>,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn is_sso(&self) -> bool {
        self.external_id.is_some()
    }
}

/// Create customer request (sign-up or admin creation)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomer {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: Option<String>,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// Update customer request. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomer {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: Option<String>,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: Option<String>,
    /// Only honoured for Admin actors
    pub role: Option<Role>,
}

/// Row to insert; the password is already hashed
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Role,
    pub external_provider: Option<String>,
    pub external_id: Option<String>,
}

/// Identity asserted by an external SSO provider
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub provider: String,
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
}
