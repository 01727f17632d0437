//! JSON key-value store over a named redb table.
//!
//! `KvStore` is the dictionary-like surface the rest of adrive talks to. Values
//! are any JSON document; list- and record-shaped values come back as
//! [`ListView`] / [`RecordView`] handles that write themselves back on every
//! mutation.

use crate::error::{Result, StoreError};
use crate::identifier::validate_identifier;
use crate::view::{ListView, RecordView, StoredValue};
use crate::SimpleStorage;
use redb::Database;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Table used when callers do not pick a namespace.
pub const DEFAULT_TABLE: &str = "keyvalue";

/// Handle on the database file. Cheap to clone; every table shares one
/// connection, and redb serializes write transactions internally.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
    path: PathBuf,
}

impl Store {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Arc::new(Database::create(&path)?);
        debug!(path = %path.display(), "Opened key-value store");
        Ok(Self { db, path })
    }

    /// Open a table by name, creating it on first use.
    pub fn table(&self, name: &str) -> Result<KvStore> {
        KvStore::new(self.db.clone(), name)
    }

    /// Open the default `keyvalue` table.
    pub fn default_table(&self) -> Result<KvStore> {
        self.table(DEFAULT_TABLE)
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release this handle. The file is closed once the last table handle
    /// derived from it is dropped as well.
    pub fn close(self) {
        debug!(path = %self.path.display(), "Closing key-value store handle");
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store").field("path", &self.path).finish()
    }
}

/// One named table of JSON values.
#[derive(Clone)]
pub struct KvStore {
    db: Arc<Database>,
    table_name: Arc<str>,
}

impl SimpleStorage for KvStore {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

impl KvStore {
    pub fn new(db: Arc<Database>, table_name: &str) -> Result<Self> {
        let table_name = validate_identifier(table_name)?;
        let store = Self {
            db,
            table_name: Arc::from(table_name),
        };
        store.ensure_table()?;
        Ok(store)
    }

    /// Get a value. Lists and records come back as self-persisting views.
    pub fn get(&self, key: &str) -> Result<StoredValue> {
        self.try_get(key)?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    /// Like [`KvStore::get`], with `None` for an absent key.
    pub fn try_get(&self, key: &str) -> Result<Option<StoredValue>> {
        let Some(value) = self.read_value(key)? else {
            return Ok(None);
        };
        Ok(Some(self.wrap(key, value)))
    }

    /// Plain snapshot of a value. Mutating it does not touch the store.
    pub fn get_value(&self, key: &str) -> Result<Value> {
        self.read_value(key)?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    /// Deserialize a value into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        Ok(serde_json::from_value(self.get_value(key)?)?)
    }

    /// Get a value, falling back to `default` when the key is absent.
    ///
    /// Not a pure read: when `default` is a list or record it is written under
    /// `key` first, so the returned view is already backed by the store.
    /// Scalar defaults are returned without being stored.
    pub fn get_or_default(&self, key: &str, default: Value) -> Result<StoredValue> {
        if let Some(existing) = self.try_get(key)? {
            return Ok(existing);
        }

        if default.is_array() || default.is_object() {
            self.set(key, &default)?;
            debug!(table = %self.table_name, key, "Initialized key with default");
            return self.get(key);
        }

        Ok(StoredValue::Scalar(default))
    }

    /// Get a list-shaped value as a [`ListView`].
    pub fn list(&self, key: &str) -> Result<ListView> {
        self.get(key)?.into_list().ok_or_else(|| StoreError::TypeMismatch {
            key: key.to_string(),
            expected: "list",
        })
    }

    /// Get a record-shaped value as a [`RecordView`].
    pub fn record(&self, key: &str) -> Result<RecordView> {
        self.get(key)?
            .into_record()
            .ok_or_else(|| StoreError::TypeMismatch {
                key: key.to_string(),
                expected: "record",
            })
    }

    /// Insert or replace the value under `key`. Committed before returning.
    pub fn set(&self, key: &str, value: &Value) -> Result<()> {
        validate_identifier(key)?;
        let data = serde_json::to_vec(value)?;
        self.put_raw(key, &data)
    }

    /// Serialize `value` and store it under `key`.
    pub fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, &serde_json::to_value(value)?)
    }

    /// Upsert several entries in one transaction.
    pub fn update<I, K>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut encoded = Vec::new();
        for (key, value) in entries {
            let key = key.into();
            validate_identifier(&key)?;
            encoded.push((key, serde_json::to_vec(&value)?));
        }
        self.put_many_raw(&encoded)
    }

    /// Remove `key`. Fails with `NotFound` if it was absent.
    pub fn delete(&self, key: &str) -> Result<()> {
        validate_identifier(key)?;
        if self.delete_raw(key)? {
            Ok(())
        } else {
            Err(StoreError::NotFound(key.to_string()))
        }
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        validate_identifier(key)?;
        self.exists(key)
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        self.list_keys()
    }

    pub fn values(&self) -> Result<Vec<Value>> {
        self.list_raw()?
            .into_iter()
            .map(|(_, data)| Ok(serde_json::from_slice(&data)?))
            .collect()
    }

    pub fn items(&self) -> Result<Vec<(String, Value)>> {
        self.list_raw()?
            .into_iter()
            .map(|(key, data)| Ok((key, serde_json::from_slice(&data)?)))
            .collect()
    }

    /// Remove every key from this table.
    pub fn clear(&self) -> Result<()> {
        self.clear_raw()
    }

    /// Read-modify-write of one value in a single transaction.
    ///
    /// `seed` stands in for the stored value when the key is absent. Returns
    /// the closure's result together with the value as committed.
    pub fn modify<R, F>(&self, key: &str, seed: &Value, f: F) -> Result<(R, Value)>
    where
        F: FnOnce(&mut Value) -> Result<R>,
    {
        validate_identifier(key)?;
        self.update_raw(key, |current| {
            let mut value = match current {
                Some(data) => serde_json::from_slice(&data)?,
                None => seed.clone(),
            };
            let result = f(&mut value)?;
            let data = serde_json::to_vec(&value)?;
            Ok((data, (result, value)))
        })
    }

    fn read_value(&self, key: &str) -> Result<Option<Value>> {
        validate_identifier(key)?;
        match self.get_raw(key)? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn wrap(&self, key: &str, value: Value) -> StoredValue {
        match value {
            Value::Array(items) => StoredValue::List(ListView::new(self.clone(), key, items)),
            Value::Object(fields) => {
                StoredValue::Record(RecordView::new(self.clone(), key, fields))
            }
            scalar => StoredValue::Scalar(scalar),
        }
    }
}

impl fmt::Debug for KvStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvStore")
            .field("table", &self.table_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn setup_test_store() -> (KvStore, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let store = Store::open(temp_dir.path().join("test.db")).unwrap();
        let table = store.default_table().unwrap();
        (table, temp_dir)
    }

    #[test]
    fn test_round_trip_shapes() {
        let (store, _temp_dir) = setup_test_store();

        let cases = [
            ("scalar_int", json!(42)),
            ("scalar_float", json!(2.5)),
            ("scalar_str", json!("hello")),
            ("scalar_bool", json!(true)),
            ("scalar_null", Value::Null),
            ("list", json!([1, "two", 3.0])),
            ("record", json!({"a": 1, "b": "x"})),
            (
                "nested",
                json!({"files": {"a_1": {"tags": ["x", {"deep": [1, 2]}]}}, "n": [[1], [2, [3]]]}),
            ),
        ];

        for (key, value) in &cases {
            store.set(key, value).unwrap();
        }
        for (key, value) in &cases {
            assert_eq!(&store.get(key).unwrap().into_value(), value, "key {key}");
        }
    }

    #[test]
    fn test_set_replaces() {
        let (store, _temp_dir) = setup_test_store();

        store.set("config", &json!({"a": 1, "b": 2})).unwrap();
        store.set("config", &json!({"c": 3})).unwrap();

        assert_eq!(store.get_value("config").unwrap(), json!({"c": 3}));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_missing_key() {
        let (store, _temp_dir) = setup_test_store();

        assert!(store.get("missing").unwrap_err().is_not_found());
        assert!(store.delete("missing").unwrap_err().is_not_found());
        assert!(!store.contains("missing").unwrap());
        assert!(store.try_get("missing").unwrap().is_none());
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let (store, _temp_dir) = setup_test_store();

        let err = store.set("not-valid", &json!(1)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_invalid_keys_rejected_on_read_and_delete() {
        let (store, _temp_dir) = setup_test_store();

        let results = [
            store.get("not-valid").map(|_| ()),
            store.try_get("not-valid").map(|_| ()),
            store.get_value("not-valid").map(|_| ()),
            store.get_or_default("not-valid", json!([])).map(|_| ()),
            store.delete("not-valid"),
            store.contains("not-valid").map(|_| ()),
        ];
        for result in results {
            assert!(matches!(result, Err(StoreError::InvalidIdentifier(_))));
        }
    }

    #[test]
    fn test_invalid_table_name_rejected() {
        let temp_dir = tempdir().unwrap();
        let store = Store::open(temp_dir.path().join("test.db")).unwrap();

        let err = store.table("1table").unwrap_err();
        assert!(matches!(err, StoreError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_tables_are_isolated() {
        let temp_dir = tempdir().unwrap();
        let store = Store::open(temp_dir.path().join("test.db")).unwrap();
        let first = store.table("first").unwrap();
        let second = store.table("second").unwrap();

        first.set("shared", &json!(1)).unwrap();

        assert!(!second.contains("shared").unwrap());
        assert_eq!(first.count().unwrap(), 1);
        assert_eq!(second.count().unwrap(), 0);
    }

    #[test]
    fn test_keys_values_items() {
        let (store, _temp_dir) = setup_test_store();
        store
            .update([("alpha", json!(1)), ("beta", json!([2]))])
            .unwrap();

        let mut keys = store.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["alpha", "beta"]);
        assert_eq!(store.values().unwrap().len(), 2);

        let items = store.items().unwrap();
        assert!(items.contains(&("beta".to_string(), json!([2]))));

        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_get_or_default_persists_containers() {
        let (store, _temp_dir) = setup_test_store();

        let users = store.get_or_default("users", json!([])).unwrap();
        assert!(users.as_list().is_some());
        assert!(store.contains("users").unwrap());

        let scalar = store.get_or_default("counter", json!(0)).unwrap();
        assert_eq!(scalar.into_value(), json!(0));
        assert!(!store.contains("counter").unwrap());
    }

    #[test]
    fn test_get_or_default_keeps_existing() {
        let (store, _temp_dir) = setup_test_store();
        store.set("files", &json!({"a_1": {}})).unwrap();

        let files = store.get_or_default("files", json!({})).unwrap();
        assert_eq!(files.into_value(), json!({"a_1": {}}));
    }

    #[test]
    fn test_typed_access() {
        #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
        struct Settings {
            port: u16,
            name: String,
        }

        let (store, _temp_dir) = setup_test_store();
        let settings = Settings {
            port: 3133,
            name: "adrive".to_string(),
        };
        store.set_as("settings", &settings).unwrap();

        let loaded: Settings = store.get_as("settings").unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_shape_checked_accessors() {
        let (store, _temp_dir) = setup_test_store();
        store.set("users", &json!([])).unwrap();

        let err = store.record("users").unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { expected: "record", .. }));
        assert!(store.list("users").is_ok());
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        {
            let store = Store::open(&db_path).unwrap();
            let table = store.default_table().unwrap();
            table.set("users", &json!([{"username": "alice"}])).unwrap();
            drop(table);
            store.close();
        }

        let store = Store::open(&db_path).unwrap();
        let table = store.default_table().unwrap();
        assert_eq!(
            table.get_value("users").unwrap(),
            json!([{"username": "alice"}])
        );
    }
}
