//! Repository layer: storage traits and their backends
//!
//! Services only see the traits below. Two backends implement them: a
//! PostgreSQL store built on a shared connection pool and an in-memory store
//! used for tests and for `storage.backend = "memory"`.

pub mod customers;
pub mod equipment;
pub mod memory;
pub mod rentals;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        customer::{Customer, NewCustomer},
        equipment::{Availability, CreateEquipment, Equipment, UpdateEquipment},
        rental::{NewRental, Rental, RentalFilter},
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EquipmentStore: Send + Sync {
    /// All equipment ordered by name, optionally filtered by availability
    async fn list(&self, availability: Option<Availability>) -> AppResult<Vec<Equipment>>;
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Equipment>>;
    async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment>;
    /// Returns `None` when the row does not exist
    async fn update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Option<Equipment>>;
    /// Returns `false` when the row does not exist
    async fn delete(&self, id: i32) -> AppResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Customer>>;
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Customer>>;
    async fn get_by_username(&self, username: &str) -> AppResult<Option<Customer>>;
    /// First customer whose external id or email matches
    async fn find_external(&self, external_id: &str, email: &str) -> AppResult<Option<Customer>>;
    async fn username_exists(&self, username: &str, exclude_id: Option<i32>) -> AppResult<bool>;
    async fn create(&self, data: &NewCustomer) -> AppResult<Customer>;
    /// Overwrite every column of an existing row
    async fn update(&self, customer: &Customer) -> AppResult<Option<Customer>>;
    async fn delete(&self, id: i32) -> AppResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RentalStore: Send + Sync {
    /// Rentals matching `filter`, newest issue first
    async fn list(&self, filter: &RentalFilter) -> AppResult<Vec<Rental>>;
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Rental>>;
    /// Start a unit of work for a ledger transition
    async fn begin(&self) -> AppResult<Box<dyn LedgerTransaction>>;
}

/// Unit of work spanning the rows touched by one ledger transition.
///
/// Reads take row locks where the backend supports them. Nothing is visible
/// to other readers until [`LedgerTransaction::commit`]; dropping the
/// transaction without committing discards every write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerTransaction: Send {
    async fn customer(&mut self, id: i32) -> AppResult<Option<Customer>>;
    async fn equipment(&mut self, id: i32) -> AppResult<Option<Equipment>>;
    async fn rental(&mut self, id: i32) -> AppResult<Option<Rental>>;
    /// The unreturned rental held by a customer, if any
    async fn open_rental_for_customer(&mut self, customer_id: i32) -> AppResult<Option<Rental>>;
    async fn insert_rental(&mut self, rental: &NewRental) -> AppResult<Rental>;
    async fn save_rental(&mut self, rental: &Rental) -> AppResult<()>;
    async fn delete_rental(&mut self, id: i32) -> AppResult<()>;
    /// Returns `false` when the equipment row no longer exists
    async fn set_equipment_available(&mut self, id: i32, available: bool) -> AppResult<bool>;
    async fn commit(&mut self) -> AppResult<()>;
}

/// Main repository struct holding one store per entity
#[derive(Clone)]
pub struct Repository {
    pub equipment: Arc<dyn EquipmentStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub rentals: Arc<dyn RentalStore>,
}

impl Repository {
    /// Create a repository backed by PostgreSQL
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            equipment: Arc::new(equipment::PgEquipmentStore::new(pool.clone())),
            customers: Arc::new(customers::PgCustomerStore::new(pool.clone())),
            rentals: Arc::new(rentals::PgRentalStore::new(pool)),
        }
    }

    /// Create a repository backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::from_memory(memory::MemoryStore::new())
    }

    pub fn from_memory(store: memory::MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            equipment: store.clone(),
            customers: store.clone(),
            rentals: store,
        }
    }
}

/// Unique-index violations are rule violations, not storage failures.
pub(crate) fn unique_violation_as_conflict(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::{borrow::Cow, error::Error, fmt};

    #[derive(Debug)]
    struct IndexViolation {
        unique: bool,
    }

    impl fmt::Display for IndexViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "index violation")
        }
    }

    impl Error for IndexViolation {}

    impl DatabaseError for IndexViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23505"))
        }

        fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::Other
            }
        }
    }

    #[test]
    fn unique_violations_become_conflicts() {
        let err = sqlx::Error::Database(Box::new(IndexViolation { unique: true }));
        let mapped = unique_violation_as_conflict(err, "username already taken");
        assert!(matches!(mapped, AppError::Conflict(ref m) if m == "username already taken"));
    }

    #[test]
    fn other_errors_stay_database_failures() {
        let err = sqlx::Error::Database(Box::new(IndexViolation { unique: false }));
        assert!(matches!(
            unique_violation_as_conflict(err, "unused"),
            AppError::Database(_)
        ));
        assert!(matches!(
            unique_violation_as_conflict(sqlx::Error::RowNotFound, "unused"),
            AppError::Database(_)
        ));
    }
}
