//! User accounts and the request-scoped authentication context.

use serde::{Deserialize, Serialize};

/// One registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    /// Opaque credential produced by the external password hasher.
    #[serde(alias = "password", default)]
    pub password_hash: String,
    pub quota_gb: f64,
    #[serde(default)]
    pub is_admin: bool,
}

impl UserEntry {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>, quota_gb: f64) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            quota_gb,
            is_admin: false,
        }
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }
}

/// Who is making a request, as established by the session collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthContext {
    #[default]
    Anonymous,
    User(String),
}

impl AuthContext {
    pub fn user(username: impl Into<String>) -> Self {
        AuthContext::User(username.into())
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            AuthContext::Anonymous => None,
            AuthContext::User(name) => Some(name),
        }
    }
}

/// Per-user storage usage, as shown to administrators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserUsage {
    pub username: String,
    pub quota_gb: f64,
    pub usage_gb: f64,
    pub file_count: usize,
    pub is_admin: bool,
}
