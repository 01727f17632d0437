//! Core configuration for the file exchange.

use anyhow::Result;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;

// Default configuration constants
const DEFAULT_RESTORE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_QUOTA_GB: f64 = 3.0;
const DEFAULT_GUEST_DISPLAY_QUOTA_GB: f64 = 5.0;
const DEFAULT_CODE_MIN: u64 = 100_000;
const DEFAULT_CODE_MAX: u64 = 99_999_999;
const DEFAULT_MAX_CODE_ATTEMPTS: usize = 16;

/// Settings for [`crate::DriveCore`].
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub database_path: PathBuf,
    /// How long a reusable file stays in its serving window before the
    /// coded name is restored.
    pub restore_delay: Duration,
    /// Quota given to newly registered users.
    pub default_quota_gb: f64,
    /// Quota figure shown to anonymous visitors. Not enforced.
    pub guest_display_quota_gb: f64,
    pub code_range: RangeInclusive<u64>,
    pub max_code_attempts: usize,
}

impl DriveConfig {
    /// Defaults rooted at `data_dir`.
    pub fn from_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            upload_dir: paths::uploads_dir_in(&data_dir),
            database_path: paths::database_path_in(&data_dir),
            data_dir,
            restore_delay: DEFAULT_RESTORE_DELAY,
            default_quota_gb: DEFAULT_QUOTA_GB,
            guest_display_quota_gb: DEFAULT_GUEST_DISPLAY_QUOTA_GB,
            code_range: DEFAULT_CODE_MIN..=DEFAULT_CODE_MAX,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
        }
    }

    /// Defaults rooted at the resolved data directory (`ADRIVE_DIR` or
    /// `~/.adrive`).
    pub fn load() -> Result<Self> {
        let config = Self::from_data_dir(paths::resolve_adrive_dir()?);
        config.validate()?;
        Ok(config)
    }

    pub fn with_restore_delay(mut self, delay: Duration) -> Self {
        self.restore_delay = delay;
        self
    }

    pub fn with_code_range(mut self, range: RangeInclusive<u64>) -> Self {
        self.code_range = range;
        self
    }

    pub fn logs_dir(&self) -> PathBuf {
        paths::logs_dir_in(&self.data_dir)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.code_range.is_empty() {
            return Err(anyhow::anyhow!("Code range must not be empty"));
        }

        if self.max_code_attempts == 0 {
            return Err(anyhow::anyhow!("Max code attempts must be at least 1"));
        }

        if !(self.default_quota_gb.is_finite() && self.default_quota_gb >= 0.0) {
            return Err(anyhow::anyhow!(
                "Default quota must be a non-negative number, got {}",
                self.default_quota_gb
            ));
        }

        if !(self.guest_display_quota_gb.is_finite() && self.guest_display_quota_gb >= 0.0) {
            return Err(anyhow::anyhow!(
                "Guest display quota must be a non-negative number, got {}",
                self.guest_display_quota_gb
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_data_dir() {
        let config = DriveConfig::from_data_dir("/srv/adrive");
        assert_eq!(config.upload_dir, PathBuf::from("/srv/adrive/uploads"));
        assert_eq!(config.database_path, PathBuf::from("/srv/adrive/adrive.db"));
        assert_eq!(config.logs_dir(), PathBuf::from("/srv/adrive/logs"));
        assert_eq!(config.restore_delay, Duration::from_secs(1));
        assert_eq!(config.code_range, 100_000..=99_999_999);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        #[allow(clippy::reversed_empty_ranges)]
        let config = DriveConfig::from_data_dir("/tmp").with_code_range(10..=1);
        assert!(config.validate().is_err());

        let mut config = DriveConfig::from_data_dir("/tmp");
        config.max_code_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = DriveConfig::from_data_dir("/tmp");
        config.default_quota_gb = -1.0;
        assert!(config.validate().is_err());
    }
}
