//! In-process test harness: router over the in-memory store plus seed data

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use equipment_rental_server::{
    api::{self, auth::ActorClaims},
    config::AppConfig,
    models::{
        customer::{Customer, NewCustomer},
        equipment::{CreateEquipment, Equipment},
        Category, Condition, Role,
    },
    policy::Actor,
    repository::{memory::MemoryStore, Repository},
    AppState,
};

pub const SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub repository: Repository,
}

impl TestApp {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = SECRET.to_string();

        let store = MemoryStore::new();
        let repository = Repository::from_memory(store.clone());
        let state = AppState::new(config, repository.clone(), None);

        Self {
            router: api::create_router(state),
            store,
            repository,
        }
    }

    pub async fn customer(&self, username: &str, role: Role) -> Customer {
        self.repository
            .customers
            .create(&NewCustomer {
                name: username.to_string(),
                username: Some(username.to_string()),
                role,
                ..Default::default()
            })
            .await
            .unwrap()
    }

    pub async fn equipment(&self, name: &str) -> Equipment {
        self.repository
            .equipment
            .create(&CreateEquipment {
                name: name.to_string(),
                description: format!("{} for hire", name),
                category: Category::Vehicles,
                condition: Condition::Excellent,
                rental_price: Decimal::new(25000, 2),
                image_url: None,
            })
            .await
            .unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

pub fn token_for(customer: &Customer) -> String {
    let actor = Actor::new(customer.id, customer.role);
    ActorClaims::new(&actor, customer.name.clone(), 1)
        .create_token(SECRET)
        .unwrap()
}
