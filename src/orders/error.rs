use uuid::Uuid;
use validator::ValidationErrors;

use crate::db;
use crate::discounts::DiscountError;
use crate::error::ApiError;
use crate::validation::field_error;

/// Error types for order operations
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("You do not have permission to access this order")]
    Forbidden,

    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    #[error("Customer not found: {0}")]
    CustomerNotFound(i64),

    #[error("Insufficient stock for product {name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: i64,
        name: String,
        requested: i64,
        available: i32,
    },

    /// A concurrent order took the stock, or Postgres aborted the transaction
    #[error("Transaction conflict: {reason}")]
    TransactionConflict {
        product_id: Option<i64>,
        reason: String,
    },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Discount error: {0}")]
    Discount(#[from] DiscountError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for OrderError {
    fn from(error: sqlx::Error) -> Self {
        if db::is_retryable(&error) {
            OrderError::TransactionConflict {
                product_id: None,
                reason: error.to_string(),
            }
        } else {
            OrderError::Database(error)
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(error: OrderError) -> Self {
        match error {
            OrderError::NotFound(id) => ApiError::NotFound {
                resource: "Order".to_string(),
                id: id.to_string(),
            },
            OrderError::CustomerNotFound(id) => ApiError::NotFound {
                resource: "Customer".to_string(),
                id: id.to_string(),
            },
            OrderError::Forbidden => ApiError::Forbidden(error.to_string()),
            OrderError::ProductNotFound(_) => {
                let mut errors = ValidationErrors::new();
                errors.add(
                    "items",
                    field_error("exists", "The selected product does not exist"),
                );
                ApiError::ValidationError(errors)
            }
            OrderError::InsufficientStock { .. } | OrderError::TransactionConflict { .. } => {
                ApiError::BadRequest(error.to_string())
            }
            OrderError::Validation(errors) => ApiError::ValidationError(errors),
            OrderError::Discount(discount_error) => discount_error.into(),
            OrderError::Database(db_error) => ApiError::DatabaseError(db_error),
        }
    }
}
