use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::customers::Customer;

const CUSTOMER_COLUMNS: &str = "id, name, email, revenue, since";

/// Repository for the customer attributes read and written by the order workflow
#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cumulative revenue, or None for an unknown customer
    pub async fn get_revenue(&self, id: i64) -> Result<Option<Decimal>, sqlx::Error> {
        sqlx::query_scalar("SELECT revenue FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Membership start; the outer None means the customer does not exist
    pub async fn get_membership_since(
        &self,
        id: i64,
    ) -> Result<Option<Option<DateTime<Utc>>>, sqlx::Error> {
        sqlx::query_scalar("SELECT since FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Read the customer and hold a row lock until the caller's transaction ends
    pub async fn lock_for_order(
        conn: &mut PgConnection,
        id: i64,
    ) -> Result<Option<Customer>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM users WHERE id = $1 FOR UPDATE",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    pub async fn increment_revenue(
        conn: &mut PgConnection,
        id: i64,
        amount: Decimal,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET revenue = revenue + $1, updated_at = NOW() WHERE id = $2")
            .bind(amount)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}
