//! Per-user storage quota, recomputed from the file registry on every check.

use std::sync::Arc;

use crate::error::{DriveError, Result};
use crate::models::{QuotaSummary, megabytes_to_gb, round_tenth};
use crate::storage::Storage;

#[derive(Clone)]
pub struct QuotaEnforcer {
    storage: Arc<Storage>,
}

impl QuotaEnforcer {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Combined size of the files `username` owns, in GB, one decimal.
    pub fn usage_gb(&self, username: &str) -> Result<f64> {
        let megabytes: f64 = self
            .storage
            .files
            .owned_by(username)?
            .iter()
            .map(|file| file.entry.size_megabytes)
            .sum();
        Ok(round_tenth(megabytes_to_gb(megabytes)))
    }

    /// Quota left for `username`, never below zero.
    pub fn remaining_quota_gb(&self, username: &str) -> Result<f64> {
        let quota_gb = self.quota_gb(username)?;
        let usage_gb = self.usage_gb(username)?;
        Ok(round_tenth(quota_gb - usage_gb).max(0.0))
    }

    pub fn can_accept_upload(&self, username: &str, file_size_gb: f64) -> Result<bool> {
        Ok(file_size_gb <= self.remaining_quota_gb(username)?)
    }

    pub fn summary(&self, username: &str) -> Result<QuotaSummary> {
        let quota_gb = self.quota_gb(username)?;
        let usage_gb = self.usage_gb(username)?;
        Ok(QuotaSummary {
            quota_gb,
            usage_gb,
            remaining_gb: round_tenth(quota_gb - usage_gb).max(0.0),
        })
    }

    fn quota_gb(&self, username: &str) -> Result<f64> {
        self.storage
            .users
            .find(username)?
            .map(|user| user.quota_gb)
            .ok_or_else(|| DriveError::UnknownUser(username.to_string()))
    }
}
