//! Equipment Rental Server
//!
//! REST JSON API for an equipment rental business: an equipment registry, a
//! customer registry and a rental ledger that keeps equipment availability in
//! step with open rentals.

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    /// Database pool, absent with the in-memory backend
    pub pool: Option<Pool<Postgres>>,
}

impl AppState {
    pub fn new(config: AppConfig, repository: repository::Repository, pool: Option<Pool<Postgres>>) -> Self {
        let services = services::Services::new(repository, config.auth.clone());
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
            pool,
        }
    }

    pub fn storage_name(&self) -> &'static str {
        if self.pool.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }
}
