use sqlx::{PgConnection, PgPool};

use crate::catalog::Product;

const PRODUCT_COLUMNS: &str = "id, category_id, name, price, stock, created_at, updated_at";

/// Repository for products and categories
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a product by ID
    pub async fn get_product(&self, id: i64) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find multiple products by IDs, ordered by id
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ANY($1) ORDER BY id",
            PRODUCT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
    }

    /// Whether the product currently holds at least `quantity` units
    ///
    /// Advisory only; the reservation itself is `decrement_stock`.
    pub async fn check_stock(&self, id: i64, quantity: i32) -> Result<bool, sqlx::Error> {
        let available: Option<bool> = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND stock >= $2)",
        )
        .bind(id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(available.unwrap_or(false))
    }

    /// Atomically take `quantity` units of stock inside the caller's transaction
    ///
    /// Returns false when the row did not hold enough stock; nothing is changed then.
    pub async fn decrement_stock(
        conn: &mut PgConnection,
        id: i64,
        quantity: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $1, updated_at = NOW()
            WHERE id = $2 AND stock >= $1
            "#,
        )
        .bind(quantity)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn category_exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        let exists: Option<bool> =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists.unwrap_or(false))
    }
}
