//! Shared fixtures for service tests

use rust_decimal::Decimal;

use crate::{
    models::{
        customer::{CreateCustomer, Customer, NewCustomer},
        equipment::{CreateEquipment, Equipment},
        Category, Condition, Role,
    },
    policy::Actor,
    repository::Repository,
};

pub fn admin() -> Actor {
    Actor::new(1_000, Role::Admin)
}

pub fn as_customer(customer: &Customer) -> Actor {
    Actor::new(customer.id, customer.role)
}

pub fn equipment_request(name: &str) -> CreateEquipment {
    CreateEquipment {
        name: name.to_string(),
        description: format!("{} for hire", name),
        category: Category::HeavyMachinery,
        condition: Condition::Good,
        rental_price: Decimal::new(15000, 2),
        image_url: None,
    }
}

pub fn signup(username: &str) -> CreateCustomer {
    CreateCustomer {
        name: username.to_string(),
        email: Some(format!("{}@example.com", username.to_lowercase())),
        username: Some(username.to_string()),
        password: Some("secret".to_string()),
        role: None,
    }
}

pub async fn seed_equipment(repository: &Repository, name: &str) -> Equipment {
    repository
        .equipment
        .create(&equipment_request(name))
        .await
        .unwrap()
}

pub async fn seed_customer(repository: &Repository, username: &str) -> Customer {
    repository
        .customers
        .create(&NewCustomer {
            name: username.to_string(),
            username: Some(username.to_string()),
            role: Role::User,
            ..Default::default()
        })
        .await
        .unwrap()
}
