//! Persistence for user records.

pub mod sqlite;

pub use sqlite::SqliteUserStore;

use chrono::{DateTime, Utc};
use food_cart_common::UserRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

/// Single-record operations on the `users` collection, keyed by phone number.
///
/// Update methods return whether a record matched.
#[cfg_attr(test, mockall::automock)]
pub trait UserStore: Send + Sync {
    fn find_by_phone(&self, phone_number: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a new record. Returns `false` if the phone number already exists.
    fn insert(&self, user: &UserRecord) -> Result<bool, StoreError>;

    fn record_login(
        &self,
        phone_number: &str,
        is_super_admin: bool,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    fn update_name(
        &self,
        phone_number: &str,
        name: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    fn update_account(
        &self,
        phone_number: &str,
        name: &str,
        is_active: bool,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// All records whose phone number is not in `excluded`.
    fn list_excluding(&self, excluded: &[String]) -> Result<Vec<UserRecord>, StoreError>;

    /// Records whose phone number contains `fragment`, minus `excluded`.
    fn search_excluding(
        &self,
        fragment: &str,
        excluded: &[String],
    ) -> Result<Vec<UserRecord>, StoreError>;
}
