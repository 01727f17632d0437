//! Typed file registry over the `files` partition.

use crate::models::{FileEntry, StoredFile};
use crate::naming::code_of;
use adrive_storage::{KvStore, RecordView, Result, StoreError};
use serde_json::json;
use tracing::warn;

/// Partition holding one record per stored file.
pub const FILES_KEY: &str = "files";

/// Typed access to the `files` record: stored name -> [`FileEntry`].
#[derive(Debug, Clone)]
pub struct FileRegistry {
    inner: KvStore,
}

impl FileRegistry {
    pub fn new(inner: KvStore) -> Self {
        Self { inner }
    }

    /// Create the partition if it does not exist yet.
    pub fn ensure(&self) -> Result<()> {
        self.view().map(|_| ())
    }

    /// Insert or replace the record for `stored_name`.
    pub fn insert(&self, stored_name: &str, entry: &FileEntry) -> Result<()> {
        self.view()?.insert_as(stored_name, entry)?;
        Ok(())
    }

    pub fn get(&self, stored_name: &str) -> Result<Option<FileEntry>> {
        self.view()?.get_as(stored_name)
    }

    pub fn contains(&self, stored_name: &str) -> Result<bool> {
        Ok(self.view()?.contains_key(stored_name))
    }

    /// Remove a record, returning it if it existed.
    pub fn remove(&self, stored_name: &str) -> Result<Option<FileEntry>> {
        match self.view()?.remove(stored_name)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// All records. Malformed records are skipped with a warning.
    pub fn list(&self) -> Result<Vec<StoredFile>> {
        let view = self.view()?;
        let mut files = Vec::with_capacity(view.len());
        for (stored_name, value) in view.iter() {
            match serde_json::from_value::<FileEntry>(value.clone()) {
                Ok(entry) => files.push(StoredFile {
                    stored_name: stored_name.clone(),
                    entry,
                }),
                Err(error) => {
                    warn!(stored_name = %stored_name, %error, "Skipping malformed file record");
                }
            }
        }
        Ok(files)
    }

    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.view()?.keys().cloned().collect())
    }

    /// Records owned by `username`.
    pub fn owned_by(&self, username: &str) -> Result<Vec<StoredFile>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|file| file.entry.is_owned_by(username))
            .collect())
    }

    /// Stored names whose code suffix equals `code`.
    pub fn find_by_code(&self, code: &str) -> Result<Vec<String>> {
        Ok(self
            .view()?
            .keys()
            .filter(|name| code_of(name) == Some(code))
            .cloned()
            .collect())
    }

    /// Mark or clear the serving window of a record. Returns false when the
    /// record does not exist.
    pub fn set_serving(&self, stored_name: &str, serving: bool) -> Result<bool> {
        let updated = self.view()?.modify_entry(stored_name, |value| {
            if let Some(fields) = value.as_object_mut() {
                if serving {
                    fields.insert("serving".to_string(), json!(true));
                } else {
                    fields.remove("serving");
                }
            }
        })?;
        Ok(updated.is_some())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.view()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn view(&self) -> Result<RecordView> {
        self.inner
            .get_or_default(FILES_KEY, json!({}))?
            .into_record()
            .ok_or_else(|| StoreError::TypeMismatch {
                key: FILES_KEY.to_string(),
                expected: "record",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adrive_storage::Store;
    use tempfile::tempdir;

    fn setup_registry() -> (FileRegistry, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let store = Store::open(temp_dir.path().join("test.db")).unwrap();
        (FileRegistry::new(store.default_table().unwrap()), temp_dir)
    }

    fn entry(owner: Option<&str>, size_megabytes: f64) -> FileEntry {
        FileEntry {
            original_name: "a.txt".to_string(),
            size_megabytes,
            reusable: false,
            owner: owner.map(str::to_string),
            uploaded_at: 0,
            serving: false,
        }
    }

    #[test]
    fn test_insert_get_remove() {
        let (registry, _temp_dir) = setup_registry();

        registry.insert("a.txt_111111", &entry(None, 1.0)).unwrap();
        assert_eq!(registry.get("a.txt_111111").unwrap(), Some(entry(None, 1.0)));
        assert!(registry.contains("a.txt_111111").unwrap());

        let removed = registry.remove("a.txt_111111").unwrap();
        assert_eq!(removed, Some(entry(None, 1.0)));
        assert_eq!(registry.remove("a.txt_111111").unwrap(), None);
        assert!(registry.is_empty().unwrap());
    }

    #[test]
    fn test_owned_by_and_codes() {
        let (registry, _temp_dir) = setup_registry();
        registry.insert("a.txt_111111", &entry(Some("alice"), 1.0)).unwrap();
        registry.insert("b.txt_222222", &entry(Some("bob"), 2.0)).unwrap();
        registry.insert("c_d.txt_111111", &entry(None, 3.0)).unwrap();

        let owned = registry.owned_by("alice").unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].stored_name, "a.txt_111111");

        let mut matches = registry.find_by_code("111111").unwrap();
        matches.sort();
        assert_eq!(matches, vec!["a.txt_111111", "c_d.txt_111111"]);

        assert!(registry.find_by_code("333333").unwrap().is_empty());
    }

    #[test]
    fn test_serving_flag_round_trip() {
        let (registry, _temp_dir) = setup_registry();
        registry.insert("a.txt_111111", &entry(None, 1.0)).unwrap();

        assert!(registry.set_serving("a.txt_111111", true).unwrap());
        assert!(registry.get("a.txt_111111").unwrap().unwrap().serving);

        assert!(registry.set_serving("a.txt_111111", false).unwrap());
        assert_eq!(registry.get("a.txt_111111").unwrap(), Some(entry(None, 1.0)));

        assert!(!registry.set_serving("missing_222222", true).unwrap());
        assert!(!registry.contains("missing_222222").unwrap());
    }

    #[test]
    fn test_malformed_records_skipped() {
        let (registry, _temp_dir) = setup_registry();
        registry.insert("a.txt_111111", &entry(None, 1.0)).unwrap();
        registry
            .inner
            .record(FILES_KEY)
            .unwrap()
            .insert("broken_1", json!("not a record"))
            .unwrap();

        assert_eq!(registry.list().unwrap().len(), 1);
        assert_eq!(registry.len().unwrap(), 2);
    }
}
