// Authentication error types

use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::TokenGenerationError(msg) => ApiError::InternalError(msg),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_auth_errors_map_to_unauthorized() {
        for error in [AuthError::MissingToken, AuthError::InvalidToken, AuthError::ExpiredToken] {
            assert_eq!(ApiError::from(error).status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_generation_failure_is_internal() {
        let error = ApiError::from(AuthError::TokenGenerationError("bad key".into()));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
