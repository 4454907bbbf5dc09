//! Admin API routes.
//!
//! Provides:
//! - User listing (`/admin/users`)
//! - Phone-number search (`/admin/users/search?query=`)
//! - Name and activation edits (`/admin/users/:phone`)
//!
//! Every route requires the caller to be on the super-admin allow-list.
//! Allow-listed accounts are never listed and cannot be edited here.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Extension, Json, Router,
};
use food_cart_common::{ActionResponse, UpdateUserRequest, UsersResponse};
use serde::Deserialize;

use crate::auth::VerifiedToken;
use crate::error::ApiResult;
use crate::AppState;

/// GET /admin/users - List all non-admin users
async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<VerifiedToken>,
) -> ApiResult<Json<UsersResponse>> {
    let users = state.users.list_users(&caller.phone_number)?;
    Ok(Json(users.into()))
}

/// Query parameters for the search endpoint.
#[derive(Debug, Deserialize)]
struct SearchQuery {
    query: String,
}

/// GET /admin/users/search - Find users whose phone number contains `query`
async fn search_users(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<VerifiedToken>,
    Query(search): Query<SearchQuery>,
) -> ApiResult<Json<UsersResponse>> {
    let users = state
        .users
        .search_users(&caller.phone_number, &search.query)?;
    Ok(Json(users.into()))
}

/// PUT /admin/users/:phone - Rename and (de)activate a user
async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<VerifiedToken>,
    Path(phone): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<Json<ActionResponse>> {
    state
        .users
        .update_user(&caller.phone_number, &phone, &body.name, body.is_active)?;
    Ok(Json(ActionResponse::ok("User updated successfully")))
}

/// Build the admin router. Authentication is applied by the parent router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/search", get(search_users))
        .route("/users/:phone", put(update_user))
}
