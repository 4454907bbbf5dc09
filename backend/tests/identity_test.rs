//! End-to-end login with signed Firebase-style ID tokens against a mocked JWKS endpoint.

use std::sync::Arc;

use axum::body::Body;
use chrono::Utc;
use food_cart_backend::test_util::{jwks_json, sign_token, test_config, TEST_KID};
use food_cart_backend::{routes, AppState, JwksClient, SqliteUserStore, UserStore};
use http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "food-cart-test";

async fn setup() -> (MockServer, axum::Router, Arc<SqliteUserStore>) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json(TEST_KID)))
        .mount(&server)
        .await;

    let verifier = JwksClient::new(&format!("{}/jwks", server.uri()), PROJECT)
        .await
        .unwrap();
    let store = Arc::new(SqliteUserStore::new(":memory:").unwrap());
    let state = AppState::new(
        test_config(&["+919899273448"]),
        Arc::new(verifier),
        store.clone(),
    );

    (server, routes::app(Arc::new(state)), store)
}

fn id_token(sub: &str, phone: Option<&str>) -> String {
    let now = Utc::now().timestamp();
    let mut claims = json!({
        "iss": format!("https://securetoken.google.com/{}", PROJECT),
        "aud": PROJECT,
        "sub": sub,
        "user_id": sub,
        "iat": now,
        "exp": now + 3600,
        "auth_time": now,
        "firebase": {"sign_in_provider": "phone"}
    });
    if let Some(phone) = phone {
        claims["phone_number"] = json!(phone);
    }
    sign_token(&claims, TEST_KID)
}

async fn verify(app: &axum::Router, token: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/verify-token")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_signed_token_logs_in() {
    let (_server, app, store) = setup().await;

    let (status, body) = verify(&app, &id_token("uid1", Some("+911111111111"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["phoneNumber"], "+911111111111");
    assert_eq!(body["user"]["isSuperAdmin"], false);

    let record = store.find_by_phone("+911111111111").unwrap().unwrap();
    assert_eq!(record.external_subject_id, "uid1");
}

#[tokio::test]
async fn test_token_without_phone_is_unauthorized() {
    let (_server, app, store) = setup().await;

    let (status, body) = verify(&app, &id_token("uid1", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Phone number not found in token");
    assert!(store.list_excluding(&[]).unwrap().is_empty());
}

#[tokio::test]
async fn test_tampered_token_is_unauthorized() {
    let (_server, app, _) = setup().await;

    // Admin claims spliced onto a user token's signature.
    let user_token = id_token("uid1", Some("+911111111111"));
    let admin_token = id_token("uid1", Some("+919899273448"));
    let user_parts: Vec<&str> = user_token.split('.').collect();
    let admin_parts: Vec<&str> = admin_token.split('.').collect();
    let forged = format!("{}.{}.{}", user_parts[0], admin_parts[1], user_parts[2]);

    let (status, body) = verify(&app, &forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["type"], "invalid_credential");
}
