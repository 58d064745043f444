//! Data models for the rental server

pub mod customer;
pub mod enums;
pub mod equipment;
pub mod rental;

// Re-export commonly used types
pub use customer::Customer;
pub use enums::{Category, Condition, RentalStatus, Role};
pub use equipment::Equipment;
pub use rental::{Rental, RentalView};
