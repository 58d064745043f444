//! PostgreSQL equipment store

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::EquipmentStore;
use crate::{
    error::AppResult,
    models::equipment::{Availability, CreateEquipment, Equipment, UpdateEquipment},
};

#[derive(Clone)]
pub struct PgEquipmentStore {
    pool: Pool<Postgres>,
}

impl PgEquipmentStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EquipmentStore for PgEquipmentStore {
    async fn list(&self, availability: Option<Availability>) -> AppResult<Vec<Equipment>> {
        let rows = match availability {
            None => {
                sqlx::query_as::<_, Equipment>("SELECT * FROM equipment ORDER BY name, id")
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(filter) => {
                sqlx::query_as::<_, Equipment>(
                    "SELECT * FROM equipment WHERE is_available = $1 ORDER BY name, id",
                )
                .bind(filter == Availability::Available)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Equipment>> {
        let row = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let row = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (name, description, category, condition, rental_price, image_url, is_available)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.category)
        .bind(data.condition)
        .bind(data.rental_price)
        .bind(&data.image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Option<Equipment>> {
        let mut sets: Vec<String> = Vec::new();
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.name, "name");
        add_field!(data.description, "description");
        add_field!(data.category, "category");
        add_field!(data.condition, "condition");
        add_field!(data.rental_price, "rental_price");
        add_field!(data.image_url, "image_url");

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!(
            "UPDATE equipment SET {} WHERE id = $1 RETURNING *",
            sets.join(", ")
        );

        let mut builder = sqlx::query_as::<_, Equipment>(&query).bind(id);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.name);
        bind_field!(data.description);
        bind_field!(data.category);
        bind_field!(data.condition);
        bind_field!(data.rental_price);
        bind_field!(data.image_url);

        let row = builder.fetch_optional(&self.pool).await?;
        Ok(row)
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
