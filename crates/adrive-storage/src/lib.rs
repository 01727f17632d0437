//! adrive storage - embedded key-value persistence
//!
//! This crate provides the persistence layer for adrive, using redb as the
//! embedded database. One database file holds any number of named tables;
//! each table maps identifier keys to JSON documents.
//!
//! # Layers
//!
//! - [`SimpleStorage`] - byte-level CRUD over one table
//! - [`KvStore`] - JSON values, dictionary-style API
//! - [`ListView`] / [`RecordView`] - views over list- and record-shaped values
//!   that persist every mutation without an explicit save
//!
//! # Example
//!
//! ```no_run
//! use adrive_storage::Store;
//! use serde_json::json;
//!
//! # fn main() -> adrive_storage::Result<()> {
//! let store = Store::open("adrive.db")?;
//! let table = store.default_table()?;
//! table.set("users", &json!([]))?;
//! table.list("users")?.push(json!({"username": "alice"}))?;
//! assert_eq!(table.list("users")?.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod identifier;
pub mod kv_store;
pub mod paths;
pub mod view;

mod simple_storage;

pub use error::{Result, StoreError};
pub use identifier::validate_identifier;
pub use kv_store::{DEFAULT_TABLE, KvStore, Store};
pub use simple_storage::SimpleStorage;
pub use view::{ListView, RecordView, StoredValue};
