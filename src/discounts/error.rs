use crate::error::ApiError;

/// Error types for discount rule operations
#[derive(Debug, thiserror::Error)]
pub enum DiscountError {
    #[error("Discount not found: {0}")]
    NotFound(i64),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<DiscountError> for ApiError {
    fn from(error: DiscountError) -> Self {
        match error {
            DiscountError::NotFound(id) => ApiError::NotFound {
                resource: "Discount".to_string(),
                id: id.to_string(),
            },
            DiscountError::Validation(errors) => ApiError::ValidationError(errors),
            DiscountError::Database(db_error) => ApiError::DatabaseError(db_error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_error_display() {
        assert_eq!(DiscountError::NotFound(4).to_string(), "Discount not found: 4");
    }

    #[test]
    fn test_conversion_to_api_error() {
        assert_eq!(
            ApiError::from(DiscountError::NotFound(4)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DiscountError::Validation(validator::ValidationErrors::new())).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(DiscountError::from(sqlx::Error::RowNotFound)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
