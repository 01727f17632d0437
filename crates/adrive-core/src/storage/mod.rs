//! Storage layer with typed wrappers around adrive-storage.
//!
//! Both registries are partitions of the same `keyvalue` table: `files` is a
//! record keyed by stored name, `users` is a list of accounts.

pub mod files;
pub mod users;

use adrive_storage::{Result, Store};
use std::path::Path;

pub use files::{FILES_KEY, FileRegistry};
pub use users::{USERS_KEY, UserRegistry};

/// Central storage manager: one database file, one table, two partitions.
pub struct Storage {
    pub files: FileRegistry,
    pub users: UserRegistry,
}

impl Storage {
    /// Open the database at `path` and make sure both partitions exist.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let store = Store::open(path)?;
        let table = store.default_table()?;

        let files = FileRegistry::new(table.clone());
        let users = UserRegistry::new(table);
        files.ensure()?;
        users.ensure()?;

        Ok(Self { files, users })
    }
}
