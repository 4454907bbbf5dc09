//! Bearer-token authentication against the identity authority.

pub mod jwks;
pub mod super_admins;

pub use jwks::JwksClient;
pub use super_admins::SuperAdmins;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Identity vouched for by the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    /// Subject (Firebase uid).
    pub subject_id: String,
    pub phone_number: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,
    #[error("Invalid Authorization header format")]
    InvalidFormat,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Phone number not found in token")]
    MissingPhoneNumber,
    #[error("JWKS fetch error: {0}")]
    JwksFetchError(String),
    #[error("Key not found for kid: {0}")]
    KeyNotFound(String),
}

/// Verifies an opaque bearer credential.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError>;
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?;

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::InvalidFormat),
    }
}

/// Authenticate a request by validating its bearer token.
pub async fn authenticate(
    verifier: &dyn TokenVerifier,
    headers: &HeaderMap,
) -> Result<VerifiedToken, AuthError> {
    let token = bearer_token(headers)?;
    verifier.verify(token).await
}
