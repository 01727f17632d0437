//! Administrative operations over user accounts.

use std::sync::Arc;
use tracing::info;

use super::exchange::ExchangeProtocol;
use super::quota::QuotaEnforcer;
use crate::error::{DriveError, Result};
use crate::models::UserUsage;
use crate::storage::Storage;

#[derive(Clone)]
pub struct AdminService {
    storage: Arc<Storage>,
    quota: QuotaEnforcer,
    exchange: Arc<ExchangeProtocol>,
}

impl AdminService {
    pub fn new(storage: Arc<Storage>, quota: QuotaEnforcer, exchange: Arc<ExchangeProtocol>) -> Self {
        Self {
            storage,
            quota,
            exchange,
        }
    }

    /// Every account with its current usage.
    pub fn list_users(&self) -> Result<Vec<UserUsage>> {
        let files = self.storage.files.list()?;
        self.storage
            .users
            .list()?
            .into_iter()
            .map(|user| {
                Ok(UserUsage {
                    usage_gb: self.quota.usage_gb(&user.username)?,
                    file_count: files
                        .iter()
                        .filter(|file| file.entry.is_owned_by(&user.username))
                        .count(),
                    username: user.username,
                    quota_gb: user.quota_gb,
                    is_admin: user.is_admin,
                })
            })
            .collect()
    }

    pub fn set_quota(&self, username: &str, quota_gb: f64) -> Result<()> {
        if !quota_gb.is_finite() || quota_gb < 0.0 {
            return Err(DriveError::InvalidQuota(quota_gb));
        }
        if !self.storage.users.set_quota(username, quota_gb)? {
            return Err(DriveError::UnknownUser(username.to_string()));
        }
        info!(username, quota_gb, "Updated quota");
        Ok(())
    }

    pub fn set_admin(&self, username: &str, is_admin: bool) -> Result<()> {
        if !self.storage.users.set_admin(username, is_admin)? {
            return Err(DriveError::UnknownUser(username.to_string()));
        }
        info!(username, is_admin, "Updated admin flag");
        Ok(())
    }

    /// Flip the admin flag. Returns the new value.
    pub fn toggle_admin(&self, username: &str) -> Result<bool> {
        let user = self
            .storage
            .users
            .find(username)?
            .ok_or_else(|| DriveError::UnknownUser(username.to_string()))?;
        self.set_admin(username, !user.is_admin)?;
        Ok(!user.is_admin)
    }

    /// Delete an account together with every file it owns. Returns the
    /// number of files removed.
    pub async fn delete_user(&self, username: &str) -> Result<usize> {
        if !self.storage.users.exists(username)? {
            return Err(DriveError::UnknownUser(username.to_string()));
        }

        let removed = self.exchange.purge_owned_by(username).await?;
        self.storage.users.remove(username)?;
        info!(username, files = removed, "Deleted user");
        Ok(removed)
    }
}
