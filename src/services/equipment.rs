//! Equipment registry service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::equipment::{Availability, CreateEquipment, Equipment, UpdateEquipment},
    policy::{authorize, Actor, Operation},
    repository::Repository,
};

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
}

impl EquipmentService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, actor: &Actor) -> AppResult<Vec<Equipment>> {
        authorize(actor, Operation::ListEquipment, None)?;
        self.repository.equipment.list(None).await
    }

    /// List available or rented equipment
    pub async fn list_by_availability(
        &self,
        actor: &Actor,
        availability: Availability,
    ) -> AppResult<Vec<Equipment>> {
        let operation = match availability {
            Availability::Available => Operation::ListEquipment,
            Availability::Rented => Operation::ListRentedEquipment,
        };
        authorize(actor, operation, None)?;
        self.repository.equipment.list(Some(availability)).await
    }

    pub async fn get_by_id(&self, actor: &Actor, id: i32) -> AppResult<Equipment> {
        authorize(actor, Operation::ViewEquipment, None)?;
        self.repository
            .equipment
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    pub async fn create(&self, actor: &Actor, data: &CreateEquipment) -> AppResult<Equipment> {
        authorize(actor, Operation::CreateEquipment, None)?;
        data.validate()?;
        let equipment = self.repository.equipment.create(data).await?;
        tracing::info!(equipment_id = equipment.id, "Equipment created");
        Ok(equipment)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: i32,
        data: &UpdateEquipment,
    ) -> AppResult<Equipment> {
        authorize(actor, Operation::UpdateEquipment, None)?;
        data.validate()?;
        self.repository
            .equipment
            .update(id, data)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    pub async fn delete(&self, actor: &Actor, id: i32) -> AppResult<()> {
        authorize(actor, Operation::DeleteEquipment, None)?;
        if !self.repository.equipment.delete(id).await? {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }
        tracing::info!(equipment_id = id, "Equipment deleted");
        Ok(())
    }
}
