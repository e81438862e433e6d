// Error handling module for the Order & Discount API
// Provides the HTTP-facing error type and its envelope rendering

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{debug, error, warn};

/// Main error type for the API
/// All handlers return Result<T, ApiError>; module errors convert into it.
#[derive(Debug)]
pub enum ApiError {
    /// Request validation failed
    /// Maps to HTTP 422 Unprocessable Entity with field errors
    ValidationError(validator::ValidationErrors),

    /// Resource not found by ID
    /// Maps to HTTP 404 Not Found
    NotFound { resource: String, id: String },

    /// Request is well-formed but cannot be fulfilled (e.g. insufficient stock)
    /// Maps to HTTP 400 Bad Request
    BadRequest(String),

    /// Database operation errors
    /// Maps to HTTP 500; details are logged, not returned
    DatabaseError(sqlx::Error),

    /// Internal server errors
    /// Maps to HTTP 500; details are logged, not returned
    InternalError(String),

    /// Missing or invalid credentials
    /// Maps to HTTP 401 Unauthorized
    Unauthorized(String),

    /// Authenticated actor may not touch the resource
    /// Maps to HTTP 403 Forbidden
    Forbidden(String),
}

/// Error body, the failure half of the response envelope
///
/// `{"success": false, "message": "...", "errors": {...}}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_error_response();
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    /// Convert to a status code and envelope, logging by severity
    ///
    /// 5xx errors are logged at `error!` with full detail and returned with a generic
    /// message; client faults are logged at `warn!` or `debug!`.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);

                let mut body = ErrorResponse::new("The given data was invalid");
                body.errors = Some(serde_json::to_value(errors).unwrap_or_else(|_| serde_json::json!({})));
                (StatusCode::UNPROCESSABLE_ENTITY, body)
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new(format!("{} with id {} not found", resource, id)),
                )
            }
            ApiError::BadRequest(message) => {
                warn!("Bad request: {}", message);
                (StatusCode::BAD_REQUEST, ErrorResponse::new(message.clone()))
            }
            ApiError::DatabaseError(db_error) => {
                error!("Database error: {:?}", db_error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("A database error occurred"),
                )
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("An internal server error occurred"),
                )
            }
            ApiError::Unauthorized(message) => {
                warn!("Unauthorized access attempt: {}", message);
                (StatusCode::UNAUTHORIZED, ErrorResponse::new(message.clone()))
            }
            ApiError::Forbidden(message) => {
                warn!("Forbidden access attempt: {}", message);
                (StatusCode::FORBIDDEN, ErrorResponse::new(message.clone()))
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::DatabaseError(error)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::field_error;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::ValidationError(validator::ValidationErrors::new()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::NotFound { resource: "Order".into(), id: "1".into() }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::DatabaseError(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_validation_envelope_carries_field_errors() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("discount_rate", field_error("required", "Discount rate is required"));

        let (status, body) = ApiError::ValidationError(errors).to_error_response();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["success"], false);
        assert!(json["errors"]["discount_rate"].is_array());
        assert_eq!(json["errors"]["discount_rate"][0]["code"], "required");
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let (_, body) = ApiError::InternalError("connection string secret".into()).to_error_response();
        assert_eq!(body.message, "An internal server error occurred");
        assert!(body.errors.is_none());

        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("errors").is_none());
    }
}
