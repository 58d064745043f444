//! In-memory store
//!
//! All tables live behind one `tokio::sync::Mutex`. A ledger transaction owns
//! the lock for its whole lifetime and works on a copy of the tables, so a
//! transition is either fully applied by `commit` or not at all.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{CustomerStore, EquipmentStore, LedgerTransaction, RentalStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        customer::{Customer, NewCustomer},
        equipment::{Availability, CreateEquipment, Equipment, UpdateEquipment},
        rental::{NewRental, Rental, RentalFilter},
    },
};

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub equipment: BTreeMap<i32, Equipment>,
    pub customers: BTreeMap<i32, Customer>,
    pub rentals: BTreeMap<i32, Rental>,
    last_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current committed state
    pub async fn snapshot(&self) -> Tables {
        self.tables.lock().await.clone()
    }
}

#[async_trait]
impl EquipmentStore for MemoryStore {
    async fn list(&self, availability: Option<Availability>) -> AppResult<Vec<Equipment>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Equipment> = tables
            .equipment
            .values()
            .filter(|e| availability.map_or(true, |a| a.matches(e)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Equipment>> {
        Ok(self.tables.lock().await.equipment.get(&id).cloned())
    }

    async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let row = Equipment {
            id,
            name: data.name.clone(),
            description: data.description.clone(),
            category: data.category,
            condition: data.condition,
            rental_price: data.rental_price,
            is_available: true,
            image_url: data.image_url.clone(),
            created_at: Utc::now(),
        };
        tables.equipment.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Option<Equipment>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.equipment.get_mut(&id).map(|row| {
            data.apply_to(row);
            row.clone()
        }))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        Ok(self.tables.lock().await.equipment.remove(&id).is_some())
    }
}

fn same_ignoring_case(stored: Option<&str>, wanted: &str) -> bool {
    stored.map_or(false, |s| s.eq_ignore_ascii_case(wanted))
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Customer>> {
        Ok(self.tables.lock().await.customers.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Customer>> {
        Ok(self.tables.lock().await.customers.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<Customer>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .customers
            .values()
            .find(|c| same_ignoring_case(c.username.as_deref(), username))
            .cloned())
    }

    async fn find_external(&self, external_id: &str, email: &str) -> AppResult<Option<Customer>> {
        let tables = self.tables.lock().await;
        let by_subject = tables
            .customers
            .values()
            .find(|c| c.external_id.as_deref() == Some(external_id));
        let by_email = || {
            tables
                .customers
                .values()
                .find(|c| same_ignoring_case(c.email.as_deref(), email))
        };
        Ok(by_subject.or_else(by_email).cloned())
    }

    async fn username_exists(&self, username: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let tables = self.tables.lock().await;
        Ok(tables.customers.values().any(|c| {
            Some(c.id) != exclude_id && same_ignoring_case(c.username.as_deref(), username)
        }))
    }

    async fn create(&self, data: &NewCustomer) -> AppResult<Customer> {
        let mut tables = self.tables.lock().await;
        if let Some(ref external_id) = data.external_id {
            if tables
                .customers
                .values()
                .any(|c| c.external_id.as_ref() == Some(external_id))
            {
                return Err(AppError::Conflict("External identity already linked".to_string()));
            }
        }
        let id = tables.next_id();
        let row = Customer {
            id,
            name: data.name.clone(),
            email: data.email.clone(),
            username: data.username.clone(),
            password: data.password.clone(),
            role: data.role,
            external_provider: data.external_provider.clone(),
            external_id: data.external_id.clone(),
            created_at: Utc::now(),
        };
        tables.customers.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, customer: &Customer) -> AppResult<Option<Customer>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.customers.get_mut(&customer.id).map(|row| {
            let created_at = row.created_at;
            *row = Customer { created_at, ..customer.clone() };
            row.clone()
        }))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        let removed = tables.customers.remove(&id).is_some();
        if removed {
            tables.rentals.retain(|_, r| r.customer_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl RentalStore for MemoryStore {
    async fn list(&self, filter: &RentalFilter) -> AppResult<Vec<Rental>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Rental> = tables
            .rentals
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.issued_at.cmp(&a.issued_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Rental>> {
        Ok(self.tables.lock().await.rentals.get(&id).cloned())
    }

    async fn begin(&self) -> AppResult<Box<dyn LedgerTransaction>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard: Some(guard),
            working,
        }))
    }
}

pub struct MemoryTransaction {
    guard: Option<OwnedMutexGuard<Tables>>,
    working: Tables,
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn customer(&mut self, id: i32) -> AppResult<Option<Customer>> {
        Ok(self.working.customers.get(&id).cloned())
    }

    async fn equipment(&mut self, id: i32) -> AppResult<Option<Equipment>> {
        Ok(self.working.equipment.get(&id).cloned())
    }

    async fn rental(&mut self, id: i32) -> AppResult<Option<Rental>> {
        Ok(self.working.rentals.get(&id).cloned())
    }

    async fn open_rental_for_customer(&mut self, customer_id: i32) -> AppResult<Option<Rental>> {
        Ok(self
            .working
            .rentals
            .values()
            .find(|r| r.customer_id == customer_id && r.is_open())
            .cloned())
    }

    async fn insert_rental(&mut self, rental: &NewRental) -> AppResult<Rental> {
        let clash = self.working.rentals.values().any(|r| {
            r.is_open()
                && (r.equipment_id == rental.equipment_id || r.customer_id == rental.customer_id)
        });
        if clash {
            return Err(AppError::Conflict(
                "equipment or customer already has an active rental".to_string(),
            ));
        }
        let id = self.working.next_id();
        let row = Rental {
            id,
            equipment_id: rental.equipment_id,
            customer_id: rental.customer_id,
            issued_at: rental.issued_at,
            due_date: rental.due_date,
            returned_at: None,
            condition_on_return: None,
            notes: rental.notes.clone(),
        };
        self.working.rentals.insert(id, row.clone());
        Ok(row)
    }

    async fn save_rental(&mut self, rental: &Rental) -> AppResult<()> {
        if let Some(row) = self.working.rentals.get_mut(&rental.id) {
            *row = rental.clone();
        }
        Ok(())
    }

    async fn delete_rental(&mut self, id: i32) -> AppResult<()> {
        self.working.rentals.remove(&id);
        Ok(())
    }

    async fn set_equipment_available(&mut self, id: i32, available: bool) -> AppResult<bool> {
        Ok(match self.working.equipment.get_mut(&id) {
            Some(row) => {
                row.is_available = available;
                true
            }
            None => false,
        })
    }

    async fn commit(&mut self) -> AppResult<()> {
        let mut guard = self
            .guard
            .take()
            .ok_or_else(|| AppError::Internal("Transaction already committed".to_string()))?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }
}
