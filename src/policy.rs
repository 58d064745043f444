//! Role-based access policy
//!
//! Every service operation calls [`authorize`] with the acting identity, the
//! operation and, for owner-scoped operations, the id of the customer that
//! owns the target record.

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::Role,
};

/// Authenticated caller as asserted by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Customer id of the caller
    pub id: i32,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i32, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Customer whose records this actor may see in listings; `None` means all.
    pub fn scope(&self) -> Option<i32> {
        if self.is_admin() {
            None
        } else {
            Some(self.id)
        }
    }
}

/// What an operation demands of the actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    AnyActor,
    /// Admin, or the customer owning the target
    OwnerOrAdmin,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListEquipment,
    ViewEquipment,
    ListRentedEquipment,
    CreateEquipment,
    UpdateEquipment,
    DeleteEquipment,
    ListCustomers,
    ViewCustomer,
    CreateAdmin,
    UpdateCustomer,
    ChangeRole,
    DeleteCustomer,
    ListRentals,
    ViewRental,
    ListOverdueRentals,
    ViewCustomerRentals,
    ViewEquipmentHistory,
    IssueRental,
    ReturnRental,
    ExtendRental,
    CancelRental,
}

impl Operation {
    pub fn requirement(self) -> Requirement {
        use Operation::*;
        match self {
            ListEquipment | ViewEquipment | ListRentals | ViewEquipmentHistory => {
                Requirement::AnyActor
            }
            ViewCustomer | UpdateCustomer | ViewRental | ViewCustomerRentals | IssueRental
            | ReturnRental => Requirement::OwnerOrAdmin,
            ListRentedEquipment | CreateEquipment | UpdateEquipment | DeleteEquipment
            | ListCustomers | CreateAdmin | ChangeRole | DeleteCustomer | ListOverdueRentals
            | ExtendRental | CancelRental => Requirement::Admin,
        }
    }
}

/// Check that `actor` may perform `operation` on a record owned by `owner_id`
pub fn authorize(actor: &Actor, operation: Operation, owner_id: Option<i32>) -> AppResult<()> {
    let allowed = match operation.requirement() {
        Requirement::AnyActor => true,
        Requirement::OwnerOrAdmin => actor.is_admin() || owner_id == Some(actor.id),
        Requirement::Admin => actor.is_admin(),
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Not allowed to perform {:?}",
            operation
        )))
    }
}
