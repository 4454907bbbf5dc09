//! API error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::AuthError;
use crate::store::StoreError;

pub const DEACTIVATED_MESSAGE: &str = "Your account has been deactivated. Please contact support.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing, malformed or rejected bearer credential.
    #[error("{0}")]
    InvalidCredential(String),

    /// Authenticated, but not a super admin.
    #[error("Access denied")]
    Forbidden,

    /// Deactivated account.
    #[error("{}", DEACTIVATED_MESSAGE)]
    AccessDenied,

    #[error("User not found")]
    NotFound,

    #[error("{0}")]
    InvalidOperation(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::InvalidCredential(e.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden | ApiError::AccessDenied => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::InvalidCredential(_) => "invalid_credential",
            ApiError::Forbidden => "forbidden",
            ApiError::AccessDenied => "account_deactivated",
            ApiError::NotFound => "not_found",
            ApiError::InvalidOperation(_) => "invalid_operation",
            ApiError::Store(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Store(e) => {
                tracing::error!(error = %e, "Request failed");
                "Internal server error".to_string()
            }
            other => {
                tracing::debug!(error = %other, "Request rejected");
                other.to_string()
            }
        };

        let body = Json(json!({
            "error": {
                "type": self.error_type(),
                "message": message
            }
        }));

        (self.status(), body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::InvalidCredential("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::AccessDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidOperation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Store(StoreError::DatabaseError("locked".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_becomes_invalid_credential() {
        let err = ApiError::from(AuthError::MissingPhoneNumber);
        assert!(matches!(err, ApiError::InvalidCredential(_)));
        assert_eq!(err.to_string(), "Phone number not found in token");
    }

    #[tokio::test]
    async fn test_deactivated_body() {
        let response = ApiError::AccessDenied.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "account_deactivated");
        assert_eq!(body["error"]["message"], DEACTIVATED_MESSAGE);
    }

    #[tokio::test]
    async fn test_store_error_message_is_generic() {
        let response =
            ApiError::Store(StoreError::DatabaseError("disk I/O error at /var/db".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "internal_error");
        assert_eq!(body["error"]["message"], "Internal server error");
    }
}
