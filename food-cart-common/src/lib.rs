//! Food Cart Common Types
//!
//! Wire types shared by the backend and its clients.

pub mod api;
pub mod user;

pub use api::{
    ActionResponse, ProfileResponse, UpdateProfileRequest, UpdateUserRequest, UsersResponse,
    VerifyTokenResponse,
};
pub use user::{UserRecord, UserSummary};
