//! Test helpers shared by unit and integration tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::auth::{AuthError, TokenVerifier, VerifiedToken};
use crate::config::{
    AdminsConfig, Config, CorsConfig, DatabaseConfig, IdentityConfig, LoggingConfig,
};
use crate::store::SqliteUserStore;
use crate::AppState;

/// RSA key used to sign test ID tokens. Never used outside tests.
pub const TEST_KEY_PEM: &str = include_str!("test_key.pem");

/// Base64url modulus of [`TEST_KEY_PEM`].
pub const TEST_KEY_N: &str = "k6b_xaitqs0_avv7umGJjWtnRVDxe7bTB4iPSEdKY8qIOhdhfXVmsQOMqzqYXxEfIGxAvydjZ0oda4grASdmOqoAUayOayqCRNp-CgCAe2np-sMjn8_AcUlkh97pLsI-Gp3H4I-9Ono0GWalJNnxClmdolr2Kh_m6OGs-RQRp1jE5hh1D7PEIYo4E7ueEbYVuDMETIqzUoyHQ4Z7x7Ubf7OXX7Nqj6UrfijwF6PPD7DAIlXOOlVwCUg0maU5fiNij_daGNJBhG-ootJF_F0fGIaHkDApLfZwZMRyVsixLr_4JwDytC1ecdEOlyZ7xV9CI68JfqnES1h5zfn-G0pvUw";

pub const TEST_KEY_E: &str = "AQAB";

pub const TEST_KID: &str = "test-key";

/// A JWKS document publishing the test key under `kid`.
pub fn jwks_json(kid: &str) -> serde_json::Value {
    serde_json::json!({
        "keys": [{
            "kid": kid,
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "n": TEST_KEY_N,
            "e": TEST_KEY_E
        }]
    })
}

/// Sign arbitrary claims with the test key.
pub fn sign_token(claims: &serde_json::Value, kid: &str) -> String {
    let header = Header {
        alg: Algorithm::RS256,
        kid: Some(kid.to_string()),
        ..Default::default()
    };
    let key = EncodingKey::from_rsa_pem(TEST_KEY_PEM.as_bytes()).expect("Invalid test key");
    encode(&header, claims, &key).expect("Failed to encode JWT")
}

/// Verifier that accepts a fixed set of opaque tokens.
#[derive(Default)]
pub struct StaticVerifier {
    tokens: HashMap<String, VerifiedToken>,
}

impl StaticVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: &str, subject_id: &str, phone_number: &str) -> Self {
        self.tokens.insert(
            token.to_string(),
            VerifiedToken {
                subject_id: subject_id.to_string(),
                phone_number: phone_number.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken("Unknown test token".to_string()))
    }
}

pub fn test_config(admins: &[&str]) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 8001,
        identity: IdentityConfig {
            project_id: Some("food-cart-test".to_string()),
            credentials_file: None,
            jwks_url: "http://localhost/jwks".to_string(),
        },
        database: DatabaseConfig {
            url: ":memory:".to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        cors: CorsConfig {
            origins: "*".to_string(),
        },
        admins: AdminsConfig {
            phone_numbers: admins.iter().map(|s| s.to_string()).collect(),
        },
    }
}

/// State over an in-memory store. Returns the store for direct inspection.
pub fn test_state(
    verifier: StaticVerifier,
    admins: &[&str],
) -> (Arc<AppState>, Arc<SqliteUserStore>) {
    let store = Arc::new(SqliteUserStore::new(":memory:").expect("in-memory store"));
    let state = AppState::new(test_config(admins), Arc::new(verifier), store.clone());
    (Arc::new(state), store)
}
