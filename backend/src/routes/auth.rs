use std::sync::Arc;

use axum::{extract::State, routing::post, Extension, Json, Router};
use food_cart_common::{UserSummary, VerifyTokenResponse};

use crate::auth::VerifiedToken;
use crate::error::ApiResult;
use crate::AppState;

/// POST /auth/verify-token - Log in: reconcile the caller's record and gate it.
async fn verify_token(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<VerifiedToken>,
) -> ApiResult<Json<VerifyTokenResponse>> {
    let user = state
        .users
        .reconcile(&caller.phone_number, &caller.subject_id)?;

    Ok(Json(VerifyTokenResponse {
        success: true,
        user: UserSummary::from(&user),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/auth/verify-token", post(verify_token))
}
