//! User reconciliation, the active-account gate, and profile/admin operations.

use std::sync::Arc;

use chrono::Utc;
use food_cart_common::UserRecord;
use tracing::instrument;

use crate::auth::SuperAdmins;
use crate::error::{ApiError, ApiResult};
use crate::store::UserStore;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    admins: SuperAdmins,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, admins: SuperAdmins) -> Self {
        Self { store, admins }
    }

    pub fn admins(&self) -> &SuperAdmins {
        &self.admins
    }

    pub fn is_super_admin(&self, phone_number: &str) -> bool {
        self.admins.is_super_admin(phone_number)
    }

    /// Find-or-create the caller's record, refresh its login metadata, then gate it.
    #[instrument(skip(self))]
    pub fn reconcile(&self, phone_number: &str, subject_id: &str) -> ApiResult<UserRecord> {
        let is_admin = self.is_super_admin(phone_number);
        let now = Utc::now();

        let created = match self.store.find_by_phone(phone_number)? {
            Some(_) => false,
            None => self
                .store
                .insert(&UserRecord::new(phone_number, subject_id, is_admin, now))?,
        };

        if created {
            tracing::info!(phone = %phone_number, is_super_admin = is_admin, "Created new user");
        } else {
            // Existing record, or a concurrent first login got there first.
            self.store.record_login(phone_number, is_admin, now)?;
            tracing::debug!(phone = %phone_number, is_super_admin = is_admin, "Refreshed login");
        }

        let user = self
            .store
            .find_by_phone(phone_number)?
            .ok_or(ApiError::NotFound)?;

        self.gate(&user, is_admin)?;
        Ok(user)
    }

    /// Reject a deactivated caller unless allow-listed. A missing record passes.
    pub fn ensure_active(&self, phone_number: &str) -> ApiResult<Option<UserRecord>> {
        let user = self.store.find_by_phone(phone_number)?;
        if let Some(ref user) = user {
            self.gate(user, self.is_super_admin(phone_number))?;
        }
        Ok(user)
    }

    fn gate(&self, user: &UserRecord, is_admin: bool) -> ApiResult<()> {
        if !user.is_active && !is_admin {
            tracing::info!(phone = %user.phone_number, "Rejected deactivated account");
            return Err(ApiError::AccessDenied);
        }
        Ok(())
    }

    pub fn get_profile(&self, phone_number: &str) -> ApiResult<UserRecord> {
        self.ensure_active(phone_number)?.ok_or(ApiError::NotFound)
    }

    pub fn update_profile(&self, phone_number: &str, name: &str) -> ApiResult<()> {
        self.ensure_active(phone_number)?;
        if !self.store.update_name(phone_number, name, Utc::now())? {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    fn require_super_admin(&self, caller: &str) -> ApiResult<()> {
        if !self.is_super_admin(caller) {
            tracing::info!(phone = %caller, "Non-admin attempted admin operation");
            return Err(ApiError::Forbidden);
        }
        Ok(())
    }

    /// All users except the allow-listed admins.
    pub fn list_users(&self, caller: &str) -> ApiResult<Vec<UserRecord>> {
        self.require_super_admin(caller)?;
        Ok(self.store.list_excluding(&self.admins.to_vec())?)
    }

    /// Users whose phone number contains `query`, except the allow-listed admins.
    pub fn search_users(&self, caller: &str, query: &str) -> ApiResult<Vec<UserRecord>> {
        self.require_super_admin(caller)?;
        Ok(self
            .store
            .search_excluding(query.trim(), &self.admins.to_vec())?)
    }

    #[instrument(skip(self, name))]
    pub fn update_user(
        &self,
        caller: &str,
        target_phone: &str,
        name: &str,
        is_active: bool,
    ) -> ApiResult<()> {
        self.require_super_admin(caller)?;

        if self.is_super_admin(target_phone) {
            return Err(ApiError::InvalidOperation(
                "Cannot edit super admin".to_string(),
            ));
        }

        if !self
            .store
            .update_account(target_phone, name, is_active, Utc::now())?
        {
            return Err(ApiError::NotFound);
        }

        tracing::info!(admin = %caller, target = %target_phone, is_active, "Updated user");
        Ok(())
    }
}
