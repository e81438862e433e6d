use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::catalog::{CatalogRepository, Product};
use crate::customers::CustomerRepository;
use crate::discounts::{
    AuditLogger, CustomerSnapshot, DiscountEngine, DiscountMetrics, DiscountResult, DiscountRule,
    OrderSnapshot, RuleStore, SnapshotItem,
};
use crate::orders::{
    CreateOrderRequest, Order, OrderDetails, OrderError, OrderItemRequest, OrderItemRow,
    OrderItemsRepository, OrderStatus, OrdersRepository, PriceCalculator,
};
use crate::validation::field_error;

/// Attempts at placing one order; a conflict on the last one is reported as a stock shortage
const MAX_PLACEMENT_ATTEMPTS: u32 = 2;

/// Service for order business logic
#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    orders_repo: OrdersRepository,
    order_items_repo: OrderItemsRepository,
    catalog: CatalogRepository,
    customers: CustomerRepository,
    rule_store: RuleStore,
    audit: AuditLogger,
    metrics: DiscountMetrics,
}

impl OrderService {
    pub fn new(pool: PgPool, rule_store: RuleStore, metrics: DiscountMetrics) -> Self {
        Self {
            orders_repo: OrdersRepository::new(pool.clone()),
            order_items_repo: OrderItemsRepository::new(pool.clone()),
            catalog: CatalogRepository::new(pool.clone()),
            customers: CustomerRepository::new(pool.clone()),
            audit: AuditLogger::new(pool.clone()),
            pool,
            rule_store,
            metrics,
        }
    }

    /// Place an order for the acting customer
    ///
    /// Stock is reserved, the order and its lines are persisted, discounts are
    /// computed and written back and the customer's revenue grows by the final
    /// amount, all in one transaction. A conflict is retried once.
    pub async fn create_order(
        &self,
        actor_id: i64,
        request: CreateOrderRequest,
    ) -> Result<OrderDetails, OrderError> {
        request.validate()?;

        let _timer = self.metrics.start_order_creation();
        let mut attempt = 1;

        let (order, result) = loop {
            match self.place_order(actor_id, &request.items).await {
                Ok(placed) => break placed,
                Err(OrderError::TransactionConflict { product_id, reason }) => {
                    self.metrics.record_stock_conflict();

                    if attempt >= MAX_PLACEMENT_ATTEMPTS {
                        tracing::warn!(actor_id, %reason, "Order placement conflicted again, giving up");
                        return Err(self.diagnose_shortage(&request.items, product_id).await);
                    }

                    tracing::warn!(actor_id, attempt, %reason, "Order placement conflicted, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        tracing::info!(
            order_id = %order.id,
            actor_id,
            total = %result.total_amount,
            discount = %result.total_discount,
            "Order created"
        );

        self.audit.log_discount_result(order.id, &result).await;

        let order = self
            .orders_repo
            .find_by_id(order.id)
            .await?
            .ok_or(OrderError::NotFound(order.id))?;
        self.load_details(order).await
    }

    /// One attempt at the order transaction
    async fn place_order(
        &self,
        actor_id: i64,
        items: &[OrderItemRequest],
    ) -> Result<(Order, DiscountResult), OrderError> {
        let quantities = PriceCalculator::aggregate_quantities(items);
        let product_ids: Vec<i64> = quantities.keys().copied().collect();

        let products: HashMap<i64, Product> = self
            .catalog
            .find_by_ids(&product_ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        ensure_available(&quantities, &products)?;

        let rules = self.rule_store.list_active_rules().await?;

        let mut tx = self.pool.begin().await?;

        let customer = CustomerRepository::lock_for_order(&mut *tx, actor_id)
            .await?
            .ok_or(OrderError::CustomerNotFound(actor_id))?;

        // Always in product-id order
        for (&product_id, &quantity) in &quantities {
            let quantity = i32::try_from(quantity).map_err(|_| OrderError::TransactionConflict {
                product_id: Some(product_id),
                reason: format!("quantity overflow for product {}", product_id),
            })?;

            if !CatalogRepository::decrement_stock(&mut *tx, product_id, quantity).await? {
                return Err(OrderError::TransactionConflict {
                    product_id: Some(product_id),
                    reason: format!("stock for product {} changed during checkout", product_id),
                });
            }
        }

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = products
                .get(&item.product_id)
                .ok_or(OrderError::ProductNotFound(item.product_id))?;
            let total_price = PriceCalculator::calculate_line_total(item.quantity, product.price);
            lines.push((item, product, total_price));
        }

        let line_totals: Vec<Decimal> = lines.iter().map(|(_, _, total)| *total).collect();
        let total_amount = PriceCalculator::calculate_total(&line_totals);

        let order = OrdersRepository::insert(&mut *tx, actor_id, total_amount).await?;

        let mut snapshot_items = Vec::with_capacity(lines.len());
        for (item, product, total_price) in lines {
            let row = OrderItemsRepository::insert(
                &mut *tx,
                order.id,
                product.id,
                item.quantity,
                product.price,
                total_price,
            )
            .await?;

            snapshot_items.push(SnapshotItem {
                product_id: row.product_id,
                category_id: product.category_id,
                quantity: row.quantity,
                unit_price: row.unit_price,
                total_price: row.total_price,
            });
        }

        let snapshot = OrderSnapshot {
            order_id: order.id,
            total_amount: order.total_amount,
            items: snapshot_items,
        };
        let result = self.run_engine(&snapshot, &rules, &CustomerSnapshot::from(&customer));

        OrdersRepository::apply_discount(&mut *tx, order.id, result.total_discount, result.final_amount)
            .await?;
        CustomerRepository::increment_revenue(&mut *tx, actor_id, result.final_amount).await?;

        tx.commit().await?;

        Ok((order, result))
    }

    /// Turn a repeated conflict into a stock shortage, reported against current stock
    async fn diagnose_shortage(&self, items: &[OrderItemRequest], conflicted: Option<i64>) -> OrderError {
        let quantities = PriceCalculator::aggregate_quantities(items);
        let mut current = HashMap::new();
        let mut short = None;

        for (&product_id, &quantity) in &quantities {
            let requested = i32::try_from(quantity).unwrap_or(i32::MAX);

            match self.catalog.check_stock(product_id, requested).await {
                Ok(false) if short.is_none() => short = Some(product_id),
                Ok(_) => {}
                Err(e) => return OrderError::Database(e),
            }

            match self.catalog.get_product(product_id).await {
                Ok(Some(product)) => {
                    current.insert(product_id, product);
                }
                Ok(None) => {}
                Err(e) => return OrderError::Database(e),
            }
        }

        shortage_after_conflict(&quantities, &current, short.or(conflicted))
    }

    fn run_engine(
        &self,
        snapshot: &OrderSnapshot,
        rules: &[DiscountRule],
        customer: &CustomerSnapshot,
    ) -> DiscountResult {
        let _timer = self.metrics.start_discount_calculation();
        DiscountEngine::compute_order_discounts(snapshot, rules, customer, Utc::now())
    }

    /// The actor's orders with their lines, newest first
    pub async fn list_orders(&self, actor_id: i64) -> Result<Vec<OrderDetails>, OrderError> {
        let orders = self.orders_repo.find_by_user_id(actor_id).await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<Uuid> = orders.iter().map(|order| order.id).collect();
        let mut items_by_order: HashMap<Uuid, Vec<OrderItemRow>> = HashMap::new();
        for row in self.order_items_repo.find_with_products(&order_ids).await? {
            items_by_order.entry(row.order_id).or_default().push(row);
        }

        tracing::debug!(actor_id, count = orders.len(), "Listing orders");

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                OrderDetails::new(order, items)
            })
            .collect())
    }

    pub async fn get_order_details(
        &self,
        actor_id: i64,
        order_id: Uuid,
    ) -> Result<OrderDetails, OrderError> {
        let order = self.owned_order(actor_id, order_id).await?;
        self.load_details(order).await
    }

    /// Change the status of one of the actor's orders; amounts are left untouched
    pub async fn update_status(
        &self,
        actor_id: i64,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderDetails, OrderError> {
        let current = self.owned_order(actor_id, order_id).await?;

        let order = self
            .orders_repo
            .update_status(order_id, status)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        tracing::info!(
            %order_id,
            from = %current.status,
            to = %order.status,
            "Order status updated"
        );

        self.load_details(order).await
    }

    /// Recompute the discount breakdown of a stored order against the current rules
    ///
    /// Nothing is persisted.
    pub async fn calculate_discounts(
        &self,
        actor_id: i64,
        order_id: Uuid,
    ) -> Result<DiscountResult, OrderError> {
        let order = self.owned_order(actor_id, order_id).await?;
        let rows = self.order_items_repo.find_with_products(&[order.id]).await?;
        let snapshot = snapshot_from_rows(&order, &rows);

        let customer = CustomerSnapshot {
            customer_id: order.user_id,
            revenue: self
                .customers
                .get_revenue(order.user_id)
                .await?
                .unwrap_or(Decimal::ZERO),
            since: self
                .customers
                .get_membership_since(order.user_id)
                .await?
                .flatten(),
        };

        let rules = self.rule_store.list_active_rules().await?;
        Ok(self.run_engine(&snapshot, &rules, &customer))
    }

    async fn owned_order(&self, actor_id: i64, order_id: Uuid) -> Result<Order, OrderError> {
        let order = self
            .orders_repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        if !order.is_owned_by(actor_id) {
            tracing::warn!(%order_id, actor_id, "Order access denied");
            return Err(OrderError::Forbidden);
        }

        Ok(order)
    }

    async fn load_details(&self, order: Order) -> Result<OrderDetails, OrderError> {
        let items = self.order_items_repo.find_with_products(&[order.id]).await?;
        Ok(OrderDetails::new(order, items))
    }
}

/// Every product exists and holds the aggregated quantity requested of it
fn ensure_available(
    quantities: &BTreeMap<i64, i64>,
    products: &HashMap<i64, Product>,
) -> Result<(), OrderError> {
    for (&product_id, &requested) in quantities {
        let product = products
            .get(&product_id)
            .ok_or(OrderError::ProductNotFound(product_id))?;

        let covered = i32::try_from(requested).map_or(false, |q| product.has_stock_for(q));
        if !covered {
            return Err(OrderError::InsufficientStock {
                product_id,
                name: product.name.clone(),
                requested,
                available: product.stock,
            });
        }
    }

    Ok(())
}

/// The error reported once placement has conflicted on every attempt
///
/// Blames `blamed` when it is part of the order, else the first product. The result is
/// always a shortage unless the product has disappeared.
fn shortage_after_conflict(
    quantities: &BTreeMap<i64, i64>,
    products: &HashMap<i64, Product>,
    blamed: Option<i64>,
) -> OrderError {
    let product_id = match blamed
        .filter(|id| quantities.contains_key(id))
        .or_else(|| quantities.keys().next().copied())
    {
        Some(product_id) => product_id,
        None => {
            let mut errors = ValidationErrors::new();
            errors.add("items", field_error("length", "Order must contain at least one item"));
            return OrderError::Validation(errors);
        }
    };

    match products.get(&product_id) {
        Some(product) => OrderError::InsufficientStock {
            product_id,
            name: product.name.clone(),
            requested: quantities.get(&product_id).copied().unwrap_or_default(),
            available: product.stock,
        },
        None => OrderError::ProductNotFound(product_id),
    }
}

/// Rebuild the engine's view of a stored order
fn snapshot_from_rows(order: &Order, rows: &[OrderItemRow]) -> OrderSnapshot {
    OrderSnapshot {
        order_id: order.id,
        total_amount: order.total_amount,
        items: rows
            .iter()
            .map(|row| SnapshotItem {
                product_id: row.product_id,
                category_id: row.category_id,
                quantity: row.quantity,
                unit_price: row.unit_price,
                total_price: row.total_price,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(id: i64, stock: i32) -> Product {
        Product {
            id,
            category_id: 1,
            name: format!("Product {}", id),
            price: dec!(10.00),
            stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<i64, Product> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    #[test]
    fn test_ensure_available_passes_when_stock_covers_request() {
        let quantities = BTreeMap::from([(1, 2), (2, 5)]);
        let products = catalog(vec![product(1, 2), product(2, 10)]);
        assert!(ensure_available(&quantities, &products).is_ok());
    }

    #[test]
    fn test_ensure_available_reports_first_short_product() {
        let quantities = BTreeMap::from([(1, 1), (2, 3)]);
        let products = catalog(vec![product(1, 5), product(2, 2)]);

        match ensure_available(&quantities, &products) {
            Err(OrderError::InsufficientStock {
                product_id,
                requested,
                available,
                ..
            }) => {
                assert_eq!(product_id, 2);
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }
    }

    #[test]
    fn test_ensure_available_checks_aggregated_quantity() {
        let items = vec![
            OrderItemRequest {
                product_id: 1,
                quantity: 2,
            },
            OrderItemRequest {
                product_id: 1,
                quantity: 2,
            },
        ];
        let quantities = PriceCalculator::aggregate_quantities(&items);
        let products = catalog(vec![product(1, 3)]);

        assert!(matches!(
            ensure_available(&quantities, &products),
            Err(OrderError::InsufficientStock { requested: 4, .. })
        ));
    }

    #[test]
    fn test_ensure_available_unknown_product() {
        let quantities = BTreeMap::from([(9, 1)]);
        assert!(matches!(
            ensure_available(&quantities, &HashMap::new()),
            Err(OrderError::ProductNotFound(9))
        ));
    }

    #[test]
    fn test_repeated_conflict_with_stock_restored_is_still_a_shortage() {
        // Stock looks sufficient again, but the retry conflicted on product 2
        let quantities = BTreeMap::from([(1, 1), (2, 3)]);
        let products = catalog(vec![product(1, 5), product(2, 4)]);

        match shortage_after_conflict(&quantities, &products, Some(2)) {
            OrderError::InsufficientStock {
                product_id,
                requested,
                available,
                ..
            } => {
                assert_eq!(product_id, 2);
                assert_eq!(requested, 3);
                assert_eq!(available, 4);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_serialization_failure_blames_first_product() {
        let quantities = BTreeMap::from([(3, 1), (7, 2)]);
        let products = catalog(vec![product(3, 10), product(7, 10)]);

        assert!(matches!(
            shortage_after_conflict(&quantities, &products, None),
            OrderError::InsufficientStock { product_id: 3, .. }
        ));
        assert!(matches!(
            shortage_after_conflict(&quantities, &products, Some(99)),
            OrderError::InsufficientStock { product_id: 3, .. }
        ));
    }

    #[test]
    fn test_repeated_conflict_on_deleted_product() {
        let quantities = BTreeMap::from([(4, 1)]);
        assert!(matches!(
            shortage_after_conflict(&quantities, &HashMap::new(), Some(4)),
            OrderError::ProductNotFound(4)
        ));
    }

    #[test]
    fn test_snapshot_from_rows_carries_categories() {
        let order = Order {
            id: Uuid::new_v4(),
            user_id: 1,
            total_amount: dec!(45.00),
            discount_amount: dec!(0),
            final_amount: dec!(45.00),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let rows: Vec<OrderItemRow> = [(1, 3, dec!(10.00)), (2, 4, dec!(35.00))]
            .into_iter()
            .map(|(id, category_id, total)| OrderItemRow {
                id,
                order_id: order.id,
                product_id: id * 10,
                quantity: 1,
                unit_price: total,
                total_price: total,
                discount_amount: dec!(0),
                final_price: total,
                product_name: "Item".to_string(),
                product_price: total,
                category_id,
                category_name: "Category".to_string(),
            })
            .collect();

        let snapshot = snapshot_from_rows(&order, &rows);
        assert_eq!(snapshot.order_id, order.id);
        assert_eq!(snapshot.total_amount, dec!(45.00));
        let categories: Vec<i64> = snapshot.items.iter().map(|i| i.category_id).collect();
        assert_eq!(categories, vec![3, 4]);
    }
}
