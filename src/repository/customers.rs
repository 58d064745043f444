//! PostgreSQL customer store

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{unique_violation_as_conflict, CustomerStore};
use crate::{
    error::{AppError, AppResult},
    models::customer::{Customer, NewCustomer},
};

#[derive(Clone)]
pub struct PgCustomerStore {
    pool: Pool<Postgres>,
}

impl PgCustomerStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Usernames and linked external identities are unique indexes.
fn identity_clash(err: sqlx::Error) -> AppError {
    unique_violation_as_conflict(err, "username or external identity already in use")
}

#[async_trait]
impl CustomerStore for PgCustomerStore {
    async fn list(&self) -> AppResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE LOWER(username) = LOWER($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_external(&self, external_id: &str, email: &str) -> AppResult<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE external_id = $1 OR LOWER(email) = LOWER($2)
            ORDER BY (external_id = $1) DESC NULLS LAST, id
            LIMIT 1
            "#,
        )
        .bind(external_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn username_exists(&self, username: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM customers WHERE LOWER(username) = LOWER($1) AND id != $2)",
            )
            .bind(username)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM customers WHERE LOWER(username) = LOWER($1))",
            )
            .bind(username)
            .fetch_one(&self.pool)
            .await?
        };
        Ok(exists)
    }

    async fn create(&self, data: &NewCustomer) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, username, password, role, external_provider, external_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.username)
        .bind(&data.password)
        .bind(data.role)
        .bind(&data.external_provider)
        .bind(&data.external_id)
        .fetch_one(&self.pool)
        .await
        .map_err(identity_clash)?;
        Ok(row)
    }

    async fn update(&self, customer: &Customer) -> AppResult<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $2, email = $3, username = $4, password = $5, role = $6,
                external_provider = $7, external_id = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.username)
        .bind(&customer.password)
        .bind(customer.role)
        .bind(&customer.external_provider)
        .bind(&customer.external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(identity_clash)?;
        Ok(row)
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
