//! Bearer token claims and the `/auth/me` endpoint

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{customer::Customer, Role},
    policy::Actor,
};

use super::AuthenticatedUser;

/// JWT claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl ActorClaims {
    /// Claims for `actor` valid for `ttl_hours`.
    ///
    /// The server never mints tokens; this and [`ActorClaims::create_token`]
    /// stand in for the identity provider in tests and local tooling.
    pub fn new(actor: &Actor, subject: impl Into<String>, ttl_hours: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: subject.into(),
            user_id: actor.id,
            role: actor.role,
            exp: now + ttl_hours * 3600,
            iat: now,
        }
    }

    /// Sign these claims with the shared HS256 secret, as the identity
    /// provider does. Only [`ActorClaims::from_token`] runs on requests.
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Decode and validate a JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }
}

/// Get the customer record of the caller
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current customer", body = Customer),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<Customer>> {
    let customer = state.services.customers.get_by_id(&actor, actor.id).await?;
    Ok(Json(customer))
}
