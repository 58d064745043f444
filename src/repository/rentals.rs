//! PostgreSQL rental store and ledger transaction

use async_trait::async_trait;
use sqlx::{postgres::PgConnection, Pool, Postgres, Transaction};

use super::{unique_violation_as_conflict, LedgerTransaction, RentalStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        customer::Customer,
        equipment::Equipment,
        rental::{NewRental, Rental, RentalFilter},
    },
};

#[derive(Clone)]
pub struct PgRentalStore {
    pool: Pool<Postgres>,
}

impl PgRentalStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RentalStore for PgRentalStore {
    async fn list(&self, filter: &RentalFilter) -> AppResult<Vec<Rental>> {
        let rows = sqlx::query_as::<_, Rental>(
            r#"
            SELECT * FROM rentals
            WHERE ($1::int IS NULL OR customer_id = $1)
              AND ($2::int IS NULL OR equipment_id = $2)
              AND ($3::bool IS NULL OR (returned_at IS NULL) = $3)
            ORDER BY issued_at DESC, id DESC
            "#,
        )
        .bind(filter.customer_id)
        .bind(filter.equipment_id)
        .bind(filter.open)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Rental>> {
        let row = sqlx::query_as::<_, Rental>("SELECT * FROM rentals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn begin(&self) -> AppResult<Box<dyn LedgerTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTransaction { tx: Some(tx) }))
    }
}

/// Ledger unit of work on a single database transaction.
///
/// Row reads use `FOR UPDATE`; callers lock the customer before the
/// equipment so concurrent issues serialize without deadlocking.
pub struct PgLedgerTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgLedgerTransaction {
    fn conn(&mut self) -> AppResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal("Transaction already committed".to_string()))
    }
}

/// Open-rental uniqueness is also enforced by partial unique indexes.
fn open_rental_clash(err: sqlx::Error) -> AppError {
    unique_violation_as_conflict(err, "equipment or customer already has an active rental")
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn customer(&mut self, id: i32) -> AppResult<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(row)
    }

    async fn equipment(&mut self, id: i32) -> AppResult<Option<Equipment>> {
        let row = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(row)
    }

    async fn rental(&mut self, id: i32) -> AppResult<Option<Rental>> {
        let row = sqlx::query_as::<_, Rental>("SELECT * FROM rentals WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(row)
    }

    async fn open_rental_for_customer(&mut self, customer_id: i32) -> AppResult<Option<Rental>> {
        let row = sqlx::query_as::<_, Rental>(
            "SELECT * FROM rentals WHERE customer_id = $1 AND returned_at IS NULL LIMIT 1",
        )
        .bind(customer_id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(row)
    }

    async fn insert_rental(&mut self, rental: &NewRental) -> AppResult<Rental> {
        sqlx::query_as::<_, Rental>(
            r#"
            INSERT INTO rentals (equipment_id, customer_id, issued_at, due_date, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(rental.equipment_id)
        .bind(rental.customer_id)
        .bind(rental.issued_at)
        .bind(rental.due_date)
        .bind(&rental.notes)
        .fetch_one(self.conn()?)
        .await
        .map_err(open_rental_clash)
    }

    async fn save_rental(&mut self, rental: &Rental) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE rentals
            SET due_date = $2, returned_at = $3, condition_on_return = $4, notes = $5
            WHERE id = $1
            "#,
        )
        .bind(rental.id)
        .bind(rental.due_date)
        .bind(rental.returned_at)
        .bind(rental.condition_on_return)
        .bind(&rental.notes)
        .execute(self.conn()?)
        .await?;
        Ok(())
    }

    async fn delete_rental(&mut self, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM rentals WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn set_equipment_available(&mut self, id: i32, available: bool) -> AppResult<bool> {
        let result = sqlx::query("UPDATE equipment SET is_available = $2 WHERE id = $1")
            .bind(id)
            .bind(available)
            .execute(self.conn()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(&mut self) -> AppResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }
}
