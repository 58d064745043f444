//! Equipment model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::enums::{Category, Condition};

/// Equipment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub condition: Condition,
    /// Daily rental price
    #[schema(value_type = String, example = "150.00")]
    pub rental_price: Decimal,
    /// False while an open rental references this item
    pub is_available: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create equipment request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEquipment {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub condition: Condition,
    #[validate(custom(function = "non_negative_price"))]
    #[schema(value_type = String, example = "150.00")]
    pub rental_price: Decimal,
    pub image_url: Option<String>,
}

/// Update equipment request. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEquipment {
    #[validate(length(min = 1, max = 200, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    pub category: Option<Category>,
    pub condition: Option<Condition>,
    #[validate(custom(function = "non_negative_price"))]
    #[schema(value_type = Option<String>, example = "150.00")]
    pub rental_price: Option<Decimal>,
    pub image_url: Option<String>,
}

impl UpdateEquipment {
    /// Apply the present fields onto an existing record
    pub fn apply_to(&self, equipment: &mut Equipment) {
        if let Some(ref name) = self.name {
            equipment.name = name.clone();
        }
        if let Some(ref description) = self.description {
            equipment.description = description.clone();
        }
        if let Some(category) = self.category {
            equipment.category = category;
        }
        if let Some(condition) = self.condition {
            equipment.condition = condition;
        }
        if let Some(price) = self.rental_price {
            equipment.rental_price = price;
        }
        if let Some(ref image_url) = self.image_url {
            equipment.image_url = Some(image_url.clone());
        }
    }
}

fn non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        let mut err = ValidationError::new("range");
        err.message = Some("Rental price must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Availability filter for equipment listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Rented,
}

impl Availability {
    pub fn matches(self, equipment: &Equipment) -> bool {
        match self {
            Availability::Available => equipment.is_available,
            Availability::Rented => !equipment.is_available,
        }
    }
}
