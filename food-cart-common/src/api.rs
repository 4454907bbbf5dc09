//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::user::{UserRecord, UserSummary};

/// Response for `POST /api/auth/verify-token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    pub success: bool,
    pub user: UserSummary,
}

/// Response for `GET /api/users/profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserRecord,
}

/// Body for `PUT /api/users/profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

/// Body for `PUT /api/admin/users/{phone}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: String,
    pub is_active: bool,
}

/// Response for the admin listing and search endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<UserRecord>,
    pub total: usize,
}

impl From<Vec<UserRecord>> for UsersResponse {
    fn from(users: Vec<UserRecord>) -> Self {
        let total = users.len();
        Self { users, total }
    }
}

/// Generic acknowledgement for mutating endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
