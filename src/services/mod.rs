//! Business logic services

pub mod customers;
pub mod equipment;
pub mod rentals;

#[cfg(test)]
pub(crate) mod testing;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub equipment: equipment::EquipmentService,
    pub customers: customers::CustomersService,
    pub rentals: rentals::RentalsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            equipment: equipment::EquipmentService::new(repository.clone()),
            customers: customers::CustomersService::new(repository.clone(), auth_config),
            rentals: rentals::RentalsService::new(repository),
        }
    }
}
