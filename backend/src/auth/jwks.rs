use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use super::{AuthError, TokenVerifier, VerifiedToken};

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
const LEEWAY_SECS: u64 = 60;

/// JWKS key set response.
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

/// Firebase ID token claims.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    auth_time: Option<u64>,
}

/// Verifies Firebase ID tokens against the project's published signing keys.
pub struct JwksClient {
    http_client: Client,
    jwks_uri: String,
    keys: RwLock<HashMap<String, DecodingKey>>,
    last_refresh: Mutex<Option<Instant>>,
    min_refresh_interval: Duration,
    project_id: String,
    issuer: String,
}

impl JwksClient {
    /// Create a client for `project_id` and fetch the current key set.
    pub async fn new(jwks_uri: &str, project_id: &str) -> Result<Self, AuthError> {
        let client = Self {
            http_client: Client::new(),
            jwks_uri: jwks_uri.to_string(),
            keys: RwLock::new(HashMap::new()),
            last_refresh: Mutex::new(None),
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            project_id: project_id.to_string(),
            issuer: format!("{}{}", ISSUER_PREFIX, project_id),
        };

        client.refresh_keys().await?;

        Ok(client)
    }

    /// Minimum time between key refreshes triggered by unknown `kid`s.
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub async fn key_count(&self) -> usize {
        self.keys.read().await.len()
    }

    async fn refresh_keys(&self) -> Result<(), AuthError> {
        tracing::info!("Fetching JWKS from {}", self.jwks_uri);

        let response: JwksResponse = self
            .http_client
            .get(&self.jwks_uri)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        let mut fresh = HashMap::new();
        for jwk in response.keys {
            if jwk.kty != "RSA" {
                continue;
            }
            if jwk.alg.as_deref().is_some_and(|alg| alg != "RS256") {
                tracing::warn!("Skipping key {} with algorithm {:?}", jwk.kid, jwk.alg);
                continue;
            }
            if let (Some(n), Some(e)) = (&jwk.n, &jwk.e) {
                match DecodingKey::from_rsa_components(n, e) {
                    Ok(key) => {
                        fresh.insert(jwk.kid.clone(), key);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse RSA key {}: {}", jwk.kid, e);
                    }
                }
            }
        }

        tracing::info!("Loaded {} JWKS keys", fresh.len());
        *self.keys.write().await = fresh;
        *self.last_refresh.lock().await = Some(Instant::now());
        Ok(())
    }

    /// Look up the key for `kid`, refetching the key set once if it is unknown.
    async fn key_for(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(key) = self.keys.read().await.get(kid) {
            return Ok(key.clone());
        }

        let due = self
            .last_refresh
            .lock()
            .await
            .map_or(true, |at| at.elapsed() >= self.min_refresh_interval);
        if due {
            tracing::debug!(kid = %kid, "Unknown signing key, refreshing JWKS");
            self.refresh_keys().await?;
        }

        self.keys
            .read()
            .await
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::KeyNotFound(kid.to_string()))
    }

    /// Validate a raw ID token and extract the caller's identity.
    pub async fn validate_token(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!(
                "Unexpected algorithm {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("Missing kid in token header".to_string()))?;

        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.project_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = LEEWAY_SECS;

        let claims = decode::<Claims>(token, &key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("Empty subject".to_string()));
        }

        if let Some(auth_time) = claims.auth_time {
            if auth_time > unix_now() + LEEWAY_SECS {
                return Err(AuthError::InvalidToken(
                    "auth_time is in the future".to_string(),
                ));
            }
        }

        let phone_number = claims
            .phone_number
            .filter(|p| !p.is_empty())
            .ok_or(AuthError::MissingPhoneNumber)?;

        Ok(VerifiedToken {
            subject_id: claims.sub,
            phone_number,
        })
    }
}

#[async_trait]
impl TokenVerifier for JwksClient {
    async fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        self.validate_token(token).await
    }
}

fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{jwks_json, sign_token, TEST_KID};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PROJECT: &str = "food-cart-test";

    async fn jwks_server(kid: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json(kid)))
            .mount(&server)
            .await;
        server
    }

    fn claims(phone: Option<&str>) -> serde_json::Value {
        let now = unix_now();
        let mut claims = json!({
            "iss": format!("{}{}", ISSUER_PREFIX, PROJECT),
            "aud": PROJECT,
            "sub": "uid1",
            "iat": now,
            "exp": now + 3600,
            "auth_time": now,
        });
        if let Some(phone) = phone {
            claims["phone_number"] = json!(phone);
        }
        claims
    }

    #[tokio::test]
    async fn test_new_loads_keys() {
        let server = jwks_server(TEST_KID).await;
        let client = JwksClient::new(&format!("{}/jwks", server.uri()), PROJECT)
            .await
            .unwrap();
        assert_eq!(client.key_count().await, 1);
        assert_eq!(client.issuer(), "https://securetoken.google.com/food-cart-test");
    }

    #[tokio::test]
    async fn test_new_fails_when_jwks_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = JwksClient::new(&format!("{}/jwks", server.uri()), PROJECT).await;
        assert!(matches!(result, Err(AuthError::JwksFetchError(_))));
    }

    #[tokio::test]
    async fn test_valid_token() {
        let server = jwks_server(TEST_KID).await;
        let client = JwksClient::new(&format!("{}/jwks", server.uri()), PROJECT)
            .await
            .unwrap();

        let token = sign_token(&claims(Some("+911111111111")), TEST_KID);
        let verified = client.verify(&token).await.unwrap();
        assert_eq!(verified.subject_id, "uid1");
        assert_eq!(verified.phone_number, "+911111111111");
    }

    #[tokio::test]
    async fn test_token_without_phone_number() {
        let server = jwks_server(TEST_KID).await;
        let client = JwksClient::new(&format!("{}/jwks", server.uri()), PROJECT)
            .await
            .unwrap();

        let token = sign_token(&claims(None), TEST_KID);
        let err = client.verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingPhoneNumber));
    }

    #[tokio::test]
    async fn test_wrong_audience_rejected() {
        let server = jwks_server(TEST_KID).await;
        let client = JwksClient::new(&format!("{}/jwks", server.uri()), PROJECT)
            .await
            .unwrap();

        let mut claims = claims(Some("+911111111111"));
        claims["aud"] = json!("some-other-project");
        let err = client.verify(&sign_token(&claims, TEST_KID)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_wrong_issuer_rejected() {
        let server = jwks_server(TEST_KID).await;
        let client = JwksClient::new(&format!("{}/jwks", server.uri()), PROJECT)
            .await
            .unwrap();

        let mut claims = claims(Some("+911111111111"));
        claims["iss"] = json!("https://accounts.example.com");
        let err = client.verify(&sign_token(&claims, TEST_KID)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let server = jwks_server(TEST_KID).await;
        let client = JwksClient::new(&format!("{}/jwks", server.uri()), PROJECT)
            .await
            .unwrap();

        let now = unix_now();
        let mut claims = claims(Some("+911111111111"));
        claims["iat"] = json!(now - 7200);
        claims["exp"] = json!(now - 3600);
        let err = client.verify(&sign_token(&claims, TEST_KID)).await.unwrap_err();
        assert!(err.to_string().contains("Invalid token"));
    }

    #[tokio::test]
    async fn test_future_auth_time_rejected() {
        let server = jwks_server(TEST_KID).await;
        let client = JwksClient::new(&format!("{}/jwks", server.uri()), PROJECT)
            .await
            .unwrap();

        let mut claims = claims(Some("+911111111111"));
        claims["auth_time"] = json!(unix_now() + 3600);
        let err = client.verify(&sign_token(&claims, TEST_KID)).await.unwrap_err();
        assert!(err.to_string().contains("auth_time"));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let server = jwks_server(TEST_KID).await;
        let client = JwksClient::new(&format!("{}/jwks", server.uri()), PROJECT)
            .await
            .unwrap();

        let err = client.verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_unknown_kid_refreshes_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json("old-key")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json(TEST_KID)))
            .mount(&server)
            .await;

        let client = JwksClient::new(&format!("{}/jwks", server.uri()), PROJECT)
            .await
            .unwrap()
            .with_min_refresh_interval(Duration::ZERO);

        let token = sign_token(&claims(Some("+911111111111")), TEST_KID);
        let verified = client.verify(&token).await.unwrap();
        assert_eq!(verified.phone_number, "+911111111111");
    }

    #[tokio::test]
    async fn test_unknown_kid_within_refresh_interval() {
        let server = jwks_server("old-key").await;
        let client = JwksClient::new(&format!("{}/jwks", server.uri()), PROJECT)
            .await
            .unwrap();

        let token = sign_token(&claims(Some("+911111111111")), TEST_KID);
        let err = client.verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::KeyNotFound(_)));
    }

    #[tokio::test]
    async fn test_keys_for_other_algorithms_are_skipped() {
        let mut jwks = jwks_json(TEST_KID);
        jwks["keys"][0]["alg"] = json!("RS512");
        let mut unlabelled = jwks_json("no-alg")["keys"][0].clone();
        unlabelled.as_object_mut().unwrap().remove("alg");
        jwks["keys"].as_array_mut().unwrap().push(unlabelled);

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
            .mount(&server)
            .await;

        let client = JwksClient::new(&format!("{}/jwks", server.uri()), PROJECT)
            .await
            .unwrap();
        assert_eq!(client.key_count().await, 1);

        let token = sign_token(&claims(Some("+911111111111")), TEST_KID);
        let err = client.verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::KeyNotFound(_)));

        let token = sign_token(&claims(Some("+911111111111")), "no-alg");
        assert!(client.verify(&token).await.is_ok());
    }
}
