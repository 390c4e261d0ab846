use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised by token validation and the auth service. Converted to JSON
/// `{error, message}` responses, same shape as the backend's `ApiError`.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account disabled")]
    AccountDisabled,
    #[error("Email already exists")]
    EmailAlreadyExists,
    #[error("User not found")]
    UserNotFound,
    #[error("Missing authorization header")]
    MissingAuthHeader,
    #[error("Invalid authorization header format")]
    InvalidAuthHeaderFormat,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("Password hashing error: {0}")]
    Password(#[from] crate::auth::password::PasswordError),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AuthError {
    fn status_and_label(&self) -> (StatusCode, &'static str) {
        use AuthError::*;
        match self {
            InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AccountDisabled => (StatusCode::FORBIDDEN, "Account disabled"),
            EmailAlreadyExists => (StatusCode::CONFLICT, "Email already exists"),
            UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            MissingAuthHeader => (StatusCode::UNAUTHORIZED, "Missing authorization header"),
            InvalidAuthHeaderFormat => {
                (StatusCode::UNAUTHORIZED, "Invalid authorization header format")
            }
            InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
            Jwt(_) => (StatusCode::UNAUTHORIZED, "Token error"),
            Validation(_) => (StatusCode::BAD_REQUEST, "Validation failed"),
            Password(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Password processing error"),
            Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, label) = self.status_and_label();
        let body = Json(json!({
            "error": label,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failures_map_to_401() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::InvalidToken,
            AuthError::TokenExpired,
            AuthError::MissingAuthHeader,
        ] {
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_conflict_and_forbidden_mappings() {
        assert_eq!(
            AuthError::EmailAlreadyExists.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::AccountDisabled.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
