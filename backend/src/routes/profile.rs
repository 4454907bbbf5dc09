//! Self-service profile routes. The phone number always comes from the
//! caller's own credential.

use std::sync::Arc;

use axum::{extract::State, routing::get, Extension, Json, Router};
use food_cart_common::{ActionResponse, ProfileResponse, UpdateProfileRequest};

use crate::auth::VerifiedToken;
use crate::error::ApiResult;
use crate::AppState;

/// GET /users/profile
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<VerifiedToken>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state.users.get_profile(&caller.phone_number)?;
    Ok(Json(ProfileResponse { user }))
}

/// PUT /users/profile
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<VerifiedToken>,
    Json(body): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ActionResponse>> {
    state
        .users
        .update_profile(&caller.phone_number, &body.name)?;
    Ok(Json(ActionResponse::ok("Profile updated successfully")))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/users/profile", get(get_profile).put(update_profile))
}
