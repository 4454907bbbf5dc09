//! HTTP routes.

pub mod admin;
pub mod auth;
pub mod health;
pub mod profile;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;
use crate::error::ApiError;
use crate::logging::request_logger;
use crate::AppState;

/// Middleware that requires a valid bearer token.
///
/// Stores the caller's [`VerifiedToken`](crate::auth::VerifiedToken) in the
/// request extensions for the handlers.
async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = crate::auth::authenticate(state.verifier.as_ref(), request.headers())
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, path = %request.uri().path(), "Rejected credential");
            ApiError::from(e)
        })?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// API routes under `/api`, without the outer middleware stack.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .merge(auth::router())
        .merge(profile::router())
        .nest("/admin", admin::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().nest("/api", health::router().merge(protected))
}

/// The complete application: routes plus CORS and request logging.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors);

    router(state)
        .layer(cors)
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if cors.origins.trim() == "*" {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = cors
        .origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
