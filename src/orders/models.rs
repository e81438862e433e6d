use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::validation::field_error;

/// Order lifecycle status
///
/// `cancelled` is accepted on input as an alias of `declined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    #[serde(alias = "cancelled")]
    Declined,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "declined" | "cancelled" => Ok(OrderStatus::Declined),
            other => Err(format!("Unknown order status: {}", other)),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Order row
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: i64,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

/// Order line row
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: Uuid,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
}

/// Order line joined with its product and category
#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: Uuid,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
    pub product_name: String,
    pub product_price: Decimal,
    pub category_id: i64,
    pub category_name: String,
}

/// Request DTO for one order line
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: i64,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

/// Request DTO for placing an order
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    #[validate]
    pub items: Vec<OrderItemRequest>,
}

/// Request DTO for changing an order's status
///
/// Kept as a string so unknown values surface as a 422 field error.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    #[schema(example = "processing")]
    pub status: String,
}

impl UpdateStatusRequest {
    pub fn parse_status(&self) -> Result<OrderStatus, ValidationErrors> {
        self.status.parse().map_err(|_| {
            let mut errors = ValidationErrors::new();
            errors.add(
                "status",
                field_error(
                    "in",
                    "Status must be one of: pending, processing, completed, declined",
                ),
            );
            errors
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub category: CategorySummary,
}

/// Response DTO for an order line with its product
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
    pub product: ProductSummary,
}

impl From<OrderItemRow> for OrderItemResponse {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
            discount_amount: row.discount_amount,
            final_price: row.final_price,
            product: ProductSummary {
                id: row.product_id,
                name: row.product_name,
                price: row.product_price,
                category: CategorySummary {
                    id: row.category_id,
                    name: row.category_name,
                },
            },
        }
    }
}

/// Response DTO for an order with its lines
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetails {
    pub id: Uuid,
    pub user_id: i64,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderDetails {
    pub fn new(order: Order, items: Vec<OrderItemRow>) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            total_amount: order.total_amount,
            discount_amount: order.discount_amount,
            final_amount: order.final_amount,
            status: order.status,
            items: items.into_iter().map(OrderItemResponse::from).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_parsing_accepts_cancelled_alias() {
        assert_eq!("declined".parse::<OrderStatus>(), Ok(OrderStatus::Declined));
        assert_eq!("cancelled".parse::<OrderStatus>(), Ok(OrderStatus::Declined));
        assert_eq!("pending".parse::<OrderStatus>(), Ok(OrderStatus::Pending));
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"processing\""
        );
        let status: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, OrderStatus::Declined);
        assert_eq!(OrderStatus::Declined.to_string(), "declined");
    }

    #[test]
    fn test_create_order_request_validation() {
        let empty = CreateOrderRequest { items: vec![] };
        assert!(empty.validate().is_err());

        let zero_quantity = CreateOrderRequest {
            items: vec![OrderItemRequest {
                product_id: 1,
                quantity: 0,
            }],
        };
        assert!(zero_quantity.validate().is_err());

        let valid = CreateOrderRequest {
            items: vec![OrderItemRequest {
                product_id: 1,
                quantity: 2,
            }],
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_empty_items_error_names_the_field() {
        let errors = CreateOrderRequest { items: vec![] }.validate().unwrap_err();
        let items = &errors.field_errors()["items"];

        assert_eq!(items[0].code, "length");
        assert_eq!(items[0].params["min"], 1);

        let json = serde_json::to_value(&errors).unwrap();
        assert!(json["items"].is_array());
    }

    #[test]
    fn test_update_status_request_rejects_unknown_status() {
        let request = UpdateStatusRequest {
            status: "shipped".to_string(),
        };
        let errors = request.parse_status().unwrap_err();
        assert!(errors.field_errors().contains_key("status"));

        let request = UpdateStatusRequest {
            status: "cancelled".to_string(),
        };
        assert_eq!(request.parse_status().unwrap(), OrderStatus::Declined);
    }

    #[test]
    fn test_order_details_nests_product_and_category() {
        let order_id = Uuid::new_v4();
        let order = Order {
            id: order_id,
            user_id: 7,
            total_amount: dec!(30.00),
            discount_amount: dec!(3.00),
            final_amount: dec!(27.00),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let row = OrderItemRow {
            id: 1,
            order_id,
            product_id: 4,
            quantity: 2,
            unit_price: dec!(15.00),
            total_price: dec!(30.00),
            discount_amount: dec!(0),
            final_price: dec!(30.00),
            product_name: "Rust in Action".to_string(),
            product_price: dec!(15.00),
            category_id: 2,
            category_name: "Books".to_string(),
        };

        let details = OrderDetails::new(order, vec![row]);
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].product.category.name, "Books");

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["items"][0]["product"]["name"], "Rust in Action");
    }
}
