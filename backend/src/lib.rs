pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod store;
pub mod test_util;
pub mod users;

pub use auth::{JwksClient, SuperAdmins, TokenVerifier, VerifiedToken};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use store::{SqliteUserStore, UserStore};
pub use users::UserService;

use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Identity authority used by the auth middleware.
    pub verifier: Arc<dyn TokenVerifier>,
    /// Reconciliation, gate, and profile/admin operations.
    pub users: UserService,
}

impl AppState {
    pub fn new(config: Config, verifier: Arc<dyn TokenVerifier>, store: Arc<dyn UserStore>) -> Self {
        let admins = SuperAdmins::new(config.admins.phone_numbers.iter().cloned());
        Self {
            config,
            verifier,
            users: UserService::new(store, admins),
        }
    }
}
