use crate::error::Result;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::sync::Arc;

/// Trait for byte-level key-value tables.
///
/// Provides default implementations for common CRUD operations.
/// Implementors only need to name their table and hand out the database.
pub trait SimpleStorage: Send + Sync {
    /// Name of the backing table. Must already be a validated identifier.
    fn table_name(&self) -> &str;

    /// Get reference to the database.
    fn db(&self) -> &Arc<Database>;

    /// Table definition for this storage.
    fn table(&self) -> TableDefinition<'_, &'static str, &'static [u8]> {
        TableDefinition::new(self.table_name())
    }

    /// Create the table if it does not exist yet.
    fn ensure_table(&self) -> Result<()> {
        let write_txn = self.db().begin_write()?;
        write_txn.open_table(self.table())?;
        write_txn.commit()?;
        Ok(())
    }

    /// Store raw bytes by key, replacing any previous value.
    fn put_raw(&self, key: &str, data: &[u8]) -> Result<()> {
        let write_txn = self.db().begin_write()?;
        {
            let mut table = write_txn.open_table(self.table())?;
            table.insert(key, data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Store several entries in one transaction.
    fn put_many_raw(&self, entries: &[(String, Vec<u8>)]) -> Result<()> {
        let write_txn = self.db().begin_write()?;
        {
            let mut table = write_txn.open_table(self.table())?;
            for (key, data) in entries {
                table.insert(key.as_str(), data.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get raw bytes by key.
    fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db().begin_read()?;
        let table = read_txn.open_table(self.table())?;

        if let Some(value) = table.get(key)? {
            Ok(Some(value.value().to_vec()))
        } else {
            Ok(None)
        }
    }

    /// Read, transform and write back one entry inside a single write
    /// transaction. Returning an error from `f` aborts the transaction.
    fn update_raw<R, F>(&self, key: &str, f: F) -> Result<R>
    where
        F: FnOnce(Option<Vec<u8>>) -> Result<(Vec<u8>, R)>,
    {
        let write_txn = self.db().begin_write()?;
        let result = {
            let mut table = write_txn.open_table(self.table())?;
            let current = table.get(key)?.map(|guard| guard.value().to_vec());
            let (data, result) = f(current)?;
            table.insert(key, data.as_slice())?;
            result
        };
        write_txn.commit()?;
        Ok(result)
    }

    /// List all entries as (key, data) pairs.
    fn list_raw(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let read_txn = self.db().begin_read()?;
        let table = read_txn.open_table(self.table())?;

        let mut items = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            items.push((key.value().to_string(), value.value().to_vec()));
        }

        Ok(items)
    }

    /// List all keys.
    fn list_keys(&self) -> Result<Vec<String>> {
        let read_txn = self.db().begin_read()?;
        let table = read_txn.open_table(self.table())?;

        let mut keys = Vec::new();
        for item in table.iter()? {
            let (key, _) = item?;
            keys.push(key.value().to_string());
        }

        Ok(keys)
    }

    /// Delete by key, returns true if existed.
    fn delete_raw(&self, key: &str) -> Result<bool> {
        let write_txn = self.db().begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(self.table())?;
            table.remove(key)?.is_some()
        };
        write_txn.commit()?;
        Ok(existed)
    }

    /// Remove every entry from the table.
    fn clear_raw(&self) -> Result<()> {
        let write_txn = self.db().begin_write()?;
        {
            let mut table = write_txn.open_table(self.table())?;
            table.retain(|_, _| false)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Check if key exists.
    fn exists(&self, key: &str) -> Result<bool> {
        let read_txn = self.db().begin_read()?;
        let table = read_txn.open_table(self.table())?;
        Ok(table.get(key)?.is_some())
    }

    /// Count all entries.
    fn count(&self) -> Result<usize> {
        let read_txn = self.db().begin_read()?;
        let table = read_txn.open_table(self.table())?;
        Ok(table.len()? as usize)
    }
}
