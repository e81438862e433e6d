use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::orders::{Order, OrderError, OrderItem, OrderItemRow, OrderStatus};

const ORDER_COLUMNS: &str =
    "id, user_id, total_amount, discount_amount, final_amount, status, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, quantity, unit_price, total_price, discount_amount, final_price";

/// Repository for orders
///
/// Writes made while placing an order take the caller's transaction connection.
#[derive(Clone)]
pub struct OrdersRepository {
    pool: PgPool,
}

impl OrdersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending order with no discount yet
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: i64,
        total_amount: Decimal,
    ) -> Result<Order, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (user_id, total_amount, discount_amount, final_amount, status)
            VALUES ($1, $2, 0, $2, $3)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .bind(total_amount)
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&mut *conn)
        .await?;

        Ok(order)
    }

    /// Write the discount pass result back onto the order
    pub async fn apply_discount(
        conn: &mut PgConnection,
        order_id: Uuid,
        discount_amount: Decimal,
        final_amount: Decimal,
    ) -> Result<(), OrderError> {
        sqlx::query(
            r#"
            UPDATE orders
            SET discount_amount = $1, final_amount = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(discount_amount)
        .bind(final_amount)
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// A customer's orders, newest first
    pub async fn find_by_user_id(&self, user_id: i64) -> Result<Vec<Order>, OrderError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    pub async fn update_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(status.as_str())
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }
}

/// Repository for order lines
#[derive(Clone)]
pub struct OrderItemsRepository {
    pool: PgPool,
}

impl OrderItemsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one line; the discount is carried at order level so the line keeps its full price
    pub async fn insert(
        conn: &mut PgConnection,
        order_id: Uuid,
        product_id: i64,
        quantity: i32,
        unit_price: Decimal,
        total_price: Decimal,
    ) -> Result<OrderItem, OrderError> {
        let item = sqlx::query_as::<_, OrderItem>(&format!(
            r#"
            INSERT INTO order_items (
                order_id, product_id, quantity, unit_price, total_price, discount_amount, final_price
            )
            VALUES ($1, $2, $3, $4, $5, 0, $5)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(total_price)
        .fetch_one(&mut *conn)
        .await?;

        Ok(item)
    }

    /// Lines of the given orders with product and category, grouped by order in line order
    pub async fn find_with_products(
        &self,
        order_ids: &[Uuid],
    ) -> Result<Vec<OrderItemRow>, OrderError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.unit_price,
                   oi.total_price, oi.discount_amount, oi.final_price,
                   p.name AS product_name, p.price AS product_price,
                   c.id AS category_id, c.name AS category_name
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            JOIN categories c ON c.id = p.category_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.order_id, oi.id
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
