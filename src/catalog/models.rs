use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Product row; `stock` never drops below zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: i64,
    pub category_id: i64,
    #[schema(example = "The Rust Programming Language")]
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn has_stock_for(&self, quantity: i32) -> bool {
        quantity > 0 && self.stock >= quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(stock: i32) -> Product {
        Product {
            id: 1,
            category_id: 1,
            name: "Notebook".to_string(),
            price: dec!(4.50),
            stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_stock_for() {
        assert!(product(5).has_stock_for(5));
        assert!(product(5).has_stock_for(1));
        assert!(!product(5).has_stock_for(6));
        assert!(!product(0).has_stock_for(1));
        assert!(!product(5).has_stock_for(0));
    }

    #[test]
    fn test_price_serializes_as_string() {
        let json = serde_json::to_value(product(1)).unwrap();
        assert_eq!(json["price"], "4.50");
    }
}
