//! Rental ledger service
//!
//! Issue, return, extend and cancel are the only operations that write
//! rentals. Each one runs its checks and writes inside a single
//! [`LedgerTransaction`](crate::repository::LedgerTransaction) so that the
//! equipment availability flag always agrees with the set of open rentals.

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        rental::{ExtendRental, IssueRental, NewRental, RentalFilter, RentalView, ReturnRental},
        RentalStatus,
    },
    policy::{authorize, Actor, Operation},
    repository::Repository,
};

#[derive(Clone)]
pub struct RentalsService {
    repository: Repository,
}

fn rental_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Rental {} not found", id))
}

impl RentalsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn list_views(&self, filter: RentalFilter) -> AppResult<Vec<RentalView>> {
        let now = Utc::now();
        let rentals = self.repository.rentals.list(&filter).await?;
        Ok(rentals.into_iter().map(|r| r.view(now)).collect())
    }

    /// All rentals visible to the actor, newest first
    pub async fn list(&self, actor: &Actor) -> AppResult<Vec<RentalView>> {
        authorize(actor, Operation::ListRentals, None)?;
        self.list_views(RentalFilter {
            customer_id: actor.scope(),
            ..Default::default()
        })
        .await
    }

    /// Rentals in the given derived status. Overdue listings are Admin-only.
    pub async fn list_by_status(
        &self,
        actor: &Actor,
        status: RentalStatus,
    ) -> AppResult<Vec<RentalView>> {
        let operation = match status {
            RentalStatus::Overdue => Operation::ListOverdueRentals,
            RentalStatus::Active | RentalStatus::Completed => Operation::ListRentals,
        };
        authorize(actor, operation, None)?;

        let views = self
            .list_views(RentalFilter {
                customer_id: actor.scope(),
                open: Some(status != RentalStatus::Completed),
                ..Default::default()
            })
            .await?;
        Ok(views.into_iter().filter(|v| v.status == status).collect())
    }

    pub async fn get(&self, actor: &Actor, id: i32) -> AppResult<RentalView> {
        let rental = self
            .repository
            .rentals
            .get_by_id(id)
            .await?
            .ok_or_else(|| rental_not_found(id))?;
        authorize(actor, Operation::ViewRental, Some(rental.customer_id))?;
        Ok(rental.view(Utc::now()))
    }

    async fn ensure_customer(&self, customer_id: i32) -> AppResult<()> {
        self.repository
            .customers
            .get_by_id(customer_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", customer_id)))
    }

    pub async fn customer_rentals(
        &self,
        actor: &Actor,
        customer_id: i32,
    ) -> AppResult<Vec<RentalView>> {
        authorize(actor, Operation::ViewCustomerRentals, Some(customer_id))?;
        self.ensure_customer(customer_id).await?;
        self.list_views(RentalFilter {
            customer_id: Some(customer_id),
            ..Default::default()
        })
        .await
    }

    /// The customer's unreturned rental, if any
    pub async fn customer_active_rental(
        &self,
        actor: &Actor,
        customer_id: i32,
    ) -> AppResult<Option<RentalView>> {
        authorize(actor, Operation::ViewCustomerRentals, Some(customer_id))?;
        self.ensure_customer(customer_id).await?;
        let views = self
            .list_views(RentalFilter {
                customer_id: Some(customer_id),
                open: Some(true),
                ..Default::default()
            })
            .await?;
        Ok(views.into_iter().next())
    }

    /// Rental history of one piece of equipment, newest first
    pub async fn equipment_history(
        &self,
        actor: &Actor,
        equipment_id: i32,
    ) -> AppResult<Vec<RentalView>> {
        authorize(actor, Operation::ViewEquipmentHistory, None)?;
        if self.repository.equipment.get_by_id(equipment_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Equipment {} not found",
                equipment_id
            )));
        }
        self.list_views(RentalFilter {
            customer_id: actor.scope(),
            equipment_id: Some(equipment_id),
            ..Default::default()
        })
        .await
    }

    /// Hand equipment over to a customer
    pub async fn issue(&self, actor: &Actor, request: IssueRental) -> AppResult<RentalView> {
        authorize(actor, Operation::IssueRental, Some(request.customer_id))?;

        let mut tx = self.repository.rentals.begin().await?;

        if tx.customer(request.customer_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Customer {} not found",
                request.customer_id
            )));
        }
        let equipment = tx
            .equipment(request.equipment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Equipment {} not found", request.equipment_id))
            })?;
        if !equipment.is_available {
            return Err(AppError::Conflict("equipment is not available".to_string()));
        }
        if tx.open_rental_for_customer(request.customer_id).await?.is_some() {
            return Err(AppError::Conflict(
                "customer already has an active rental".to_string(),
            ));
        }

        let now = Utc::now();
        let rental = tx
            .insert_rental(&NewRental {
                equipment_id: equipment.id,
                customer_id: request.customer_id,
                issued_at: now,
                due_date: request.due_date,
                notes: request.notes,
            })
            .await?;
        tx.set_equipment_available(equipment.id, false).await?;
        tx.commit().await?;

        tracing::info!(
            rental_id = rental.id,
            equipment_id = rental.equipment_id,
            customer_id = rental.customer_id,
            due_date = %rental.due_date,
            "Rental issued"
        );
        Ok(rental.view(now))
    }

    /// Take equipment back and close the rental
    pub async fn return_rental(
        &self,
        actor: &Actor,
        request: ReturnRental,
    ) -> AppResult<RentalView> {
        let mut tx = self.repository.rentals.begin().await?;

        let mut rental = tx
            .rental(request.rental_id)
            .await?
            .ok_or_else(|| rental_not_found(request.rental_id))?;
        authorize(actor, Operation::ReturnRental, Some(rental.customer_id))?;

        let now = Utc::now();
        if rental.status_at(now) != RentalStatus::Active {
            return Err(AppError::Conflict(
                "only active rentals can be returned".to_string(),
            ));
        }

        rental.returned_at = Some(now);
        rental.condition_on_return = Some(request.condition_on_return);
        rental.notes = request.notes;
        tx.save_rental(&rental).await?;
        if !tx.set_equipment_available(rental.equipment_id, true).await? {
            tracing::warn!(
                rental_id = rental.id,
                equipment_id = rental.equipment_id,
                "Returned equipment no longer exists"
            );
        }
        tx.commit().await?;

        tracing::info!(
            rental_id = rental.id,
            equipment_id = rental.equipment_id,
            customer_id = rental.customer_id,
            condition = %request.condition_on_return,
            "Rental returned"
        );
        Ok(rental.view(now))
    }

    /// Push the due date of an active rental further out
    pub async fn extend(
        &self,
        actor: &Actor,
        id: i32,
        request: ExtendRental,
    ) -> AppResult<RentalView> {
        authorize(actor, Operation::ExtendRental, None)?;

        let mut tx = self.repository.rentals.begin().await?;
        let mut rental = tx.rental(id).await?.ok_or_else(|| rental_not_found(id))?;

        let now = Utc::now();
        if rental.status_at(now) != RentalStatus::Active {
            return Err(AppError::Conflict(
                "only active rentals can be extended".to_string(),
            ));
        }
        if request.new_due_date <= rental.due_date {
            return Err(AppError::Conflict(
                "new due date must be after current due date".to_string(),
            ));
        }

        let previous = rental.due_date;
        rental.due_date = request.new_due_date;
        tx.save_rental(&rental).await?;
        tx.commit().await?;

        tracing::info!(
            rental_id = rental.id,
            from = %previous,
            to = %rental.due_date,
            "Rental extended"
        );
        Ok(rental.view(now))
    }

    /// Void an unreturned rental and release its equipment
    pub async fn cancel(&self, actor: &Actor, id: i32) -> AppResult<()> {
        authorize(actor, Operation::CancelRental, None)?;

        let mut tx = self.repository.rentals.begin().await?;
        let rental = tx.rental(id).await?.ok_or_else(|| rental_not_found(id))?;

        if rental.status_at(Utc::now()) == RentalStatus::Completed {
            return Err(AppError::Conflict(
                "cannot cancel completed rentals".to_string(),
            ));
        }

        if !tx.set_equipment_available(rental.equipment_id, true).await? {
            tracing::warn!(
                rental_id = rental.id,
                equipment_id = rental.equipment_id,
                "Cancelled rental refers to missing equipment"
            );
        }
        tx.delete_rental(rental.id).await?;
        tx.commit().await?;

        tracing::info!(
            rental_id = rental.id,
            equipment_id = rental.equipment_id,
            customer_id = rental.customer_id,
            "Rental cancelled"
        );
        Ok(())
    }
}
