//! User record as exchanged over the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user, keyed by phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub phone_number: String,
    /// Subject identifier issued by the identity provider.
    pub external_subject_id: String,
    #[serde(default)]
    pub name: String,
    pub is_active: bool,
    /// Snapshot of the allow-list decision taken at the last login.
    pub is_super_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

impl UserRecord {
    /// A fresh record as created on first login.
    pub fn new(
        phone_number: impl Into<String>,
        external_subject_id: impl Into<String>,
        is_super_admin: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            phone_number: phone_number.into(),
            external_subject_id: external_subject_id.into(),
            name: String::new(),
            is_active: true,
            is_super_admin,
            created_at: now,
            updated_at: now,
            last_login: now,
        }
    }
}

/// The subset of a record returned after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub phone_number: String,
    pub name: String,
    pub is_active: bool,
    pub is_super_admin: bool,
}

impl From<&UserRecord> for UserSummary {
    fn from(record: &UserRecord) -> Self {
        Self {
            phone_number: record.phone_number.clone(),
            name: record.name.clone(),
            is_active: record.is_active,
            is_super_admin: record.is_super_admin,
        }
    }
}
