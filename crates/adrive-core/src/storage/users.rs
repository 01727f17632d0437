//! Typed user registry over the `users` partition.

use crate::models::UserEntry;
use adrive_storage::{KvStore, ListView, Result, StoreError};
use serde_json::{Value, json};

/// Partition holding the list of registered users.
pub const USERS_KEY: &str = "users";

/// Typed access to the `users` list.
#[derive(Debug, Clone)]
pub struct UserRegistry {
    inner: KvStore,
}

impl UserRegistry {
    pub fn new(inner: KvStore) -> Self {
        Self { inner }
    }

    /// Create the partition if it does not exist yet.
    pub fn ensure(&self) -> Result<()> {
        self.view().map(|_| ())
    }

    /// Append a user unless the username is taken. Returns `false` when it
    /// already existed.
    pub fn register(&self, user: &UserEntry) -> Result<bool> {
        let value = serde_json::to_value(user)?;
        let username = user.username.as_str();
        self.view()?.modify(|users| {
            if users.iter().any(|u| has_username(u, username)) {
                false
            } else {
                users.push(value);
                true
            }
        })
    }

    pub fn find(&self, username: &str) -> Result<Option<UserEntry>> {
        let view = self.view()?;
        match view.iter().find(|u| has_username(u, username)) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub fn exists(&self, username: &str) -> Result<bool> {
        Ok(self.view()?.iter().any(|u| has_username(u, username)))
    }

    pub fn list(&self) -> Result<Vec<UserEntry>> {
        self.view()?.items_as()
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.view()?.len())
    }

    /// Returns `false` when the user does not exist.
    pub fn set_quota(&self, username: &str, quota_gb: f64) -> Result<bool> {
        self.update_field(username, "quota_gb", json!(quota_gb))
    }

    /// Returns `false` when the user does not exist.
    pub fn set_admin(&self, username: &str, is_admin: bool) -> Result<bool> {
        self.update_field(username, "is_admin", json!(is_admin))
    }

    /// Remove a user. Returns `false` when the user does not exist.
    pub fn remove(&self, username: &str) -> Result<bool> {
        Ok(self.view()?.retain(|u| !has_username(u, username))? > 0)
    }

    fn update_field(&self, username: &str, field: &str, value: Value) -> Result<bool> {
        self.view()?.modify(|users| {
            match users.iter_mut().find(|u| has_username(u, username)) {
                Some(Value::Object(user)) => {
                    user.insert(field.to_string(), value);
                    true
                }
                _ => false,
            }
        })
    }

    fn view(&self) -> Result<ListView> {
        self.inner
            .get_or_default(USERS_KEY, json!([]))?
            .into_list()
            .ok_or_else(|| StoreError::TypeMismatch {
                key: USERS_KEY.to_string(),
                expected: "list",
            })
    }
}

fn has_username(user: &Value, username: &str) -> bool {
    user.get("username").and_then(Value::as_str) == Some(username)
}
