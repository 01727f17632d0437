pub mod config;
pub mod error;
pub mod models;
pub mod naming;
pub mod paths;
pub mod services;
pub mod storage;

pub use config::DriveConfig;
pub use error::{DriveError, Result};
pub use models::*;

use services::{AdminService, ExchangeProtocol, QuotaEnforcer};
use std::sync::Arc;
use storage::Storage;
use tracing::info;

const BOOTSTRAP_ADMIN_QUOTA_GB: f64 = 10.0;

/// Core application state shared by the server and the CLI.
pub struct DriveCore {
    pub config: DriveConfig,
    pub storage: Arc<Storage>,
    pub quota: QuotaEnforcer,
    pub exchange: Arc<ExchangeProtocol>,
    pub admin: AdminService,
}

impl DriveCore {
    /// Open the database and upload directory under `config`, then restore
    /// files a previous process left in their serving window.
    pub async fn open(config: DriveConfig) -> anyhow::Result<Self> {
        config.validate()?;
        tokio::fs::create_dir_all(&config.data_dir).await?;

        let storage = Arc::new(Storage::new(&config.database_path)?);
        let quota = QuotaEnforcer::new(storage.clone());
        let exchange = Arc::new(ExchangeProtocol::new(
            storage.clone(),
            quota.clone(),
            &config,
        ));
        exchange.blobs().ensure().await?;

        let restored = exchange.recover().await?;
        if restored > 0 {
            info!(restored, "Recovered files from interrupted serving windows");
        }

        let admin = AdminService::new(storage.clone(), quota.clone(), exchange.clone());

        info!(
            data_dir = %config.data_dir.display(),
            files = storage.files.len()?,
            users = storage.users.count()?,
            "Initializing adrive"
        );

        Ok(Self {
            config,
            storage,
            quota,
            exchange,
            admin,
        })
    }

    /// Register an account. `quota_gb` defaults to the configured quota.
    pub fn register_user(
        &self,
        username: &str,
        password_hash: &str,
        quota_gb: Option<f64>,
        is_admin: bool,
    ) -> Result<UserEntry> {
        let quota_gb = quota_gb.unwrap_or(self.config.default_quota_gb);
        if !quota_gb.is_finite() || quota_gb < 0.0 {
            return Err(DriveError::InvalidQuota(quota_gb));
        }

        let user = UserEntry::new(username, password_hash, quota_gb).with_admin(is_admin);
        if !self.storage.users.register(&user)? {
            return Err(DriveError::UserExists(username.to_string()));
        }
        info!(username, quota_gb, is_admin, "Registered user");
        Ok(user)
    }

    /// Seed an administrator when no accounts exist. Returns whether one was
    /// created.
    pub fn bootstrap_admin(&self, username: &str, password_hash: &str) -> Result<bool> {
        if self.storage.users.count()? > 0 {
            return Ok(false);
        }
        self.register_user(
            username,
            password_hash,
            Some(BOOTSTRAP_ADMIN_QUOTA_GB),
            true,
        )?;
        Ok(true)
    }

    /// Authentication context for a session username. Unknown users are
    /// anonymous.
    pub fn auth_context(&self, username: Option<&str>) -> Result<AuthContext> {
        match username {
            Some(username) if self.storage.users.exists(username)? => {
                Ok(AuthContext::user(username))
            }
            _ => Ok(AuthContext::Anonymous),
        }
    }

    pub fn is_admin(&self, auth: &AuthContext) -> Result<bool> {
        let Some(username) = auth.username() else {
            return Ok(false);
        };
        Ok(self
            .storage
            .users
            .find(username)?
            .is_some_and(|user| user.is_admin))
    }

    /// Owned files plus quota figures for `username`.
    pub fn dashboard(&self, username: &str) -> Result<Dashboard> {
        let summary = self.quota.summary(username)?;
        let files = self
            .storage
            .files
            .owned_by(username)?
            .into_iter()
            .map(|file| OwnedFile {
                code: file.code().to_string(),
                original_name: file.entry.original_name,
                size_megabytes: file.entry.size_megabytes,
                reusable: file.entry.reusable,
                stored_name: file.stored_name,
            })
            .collect();

        Ok(Dashboard {
            username: username.to_string(),
            files,
            quota_gb: summary.quota_gb,
            quota_usage_gb: summary.usage_gb,
        })
    }

    /// Quota figures for the upload page. Anonymous visitors see the guest
    /// quota and no usage.
    pub fn quota_summary(&self, auth: &AuthContext) -> Result<QuotaSummary> {
        match auth.username() {
            Some(username) => self.quota.summary(username),
            None => Ok(QuotaSummary {
                quota_gb: self.config.guest_display_quota_gb,
                usage_gb: 0.0,
                remaining_gb: self.config.guest_display_quota_gb,
            }),
        }
    }
}
