//! Self-persisting views over list- and record-shaped values.
//!
//! A view holds a snapshot of the stored value plus the `(table, key)` it came
//! from. Reads are served from the snapshot. Every mutation runs as one write
//! transaction: the current stored value is re-read, the edit is applied to
//! it, the result is committed, and the snapshot is replaced by what was
//! committed. When a mutation returns `Ok`, the view and the store agree.
//!
//! If the stored value disappeared or changed shape since the view was taken,
//! the view's own snapshot is used as the base for the edit.

use crate::error::{Result, StoreError};
use crate::kv_store::KvStore;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A value read from the store.
#[derive(Debug, Clone)]
pub enum StoredValue {
    Scalar(Value),
    List(ListView),
    Record(RecordView),
}

impl StoredValue {
    pub fn as_list(&self) -> Option<&ListView> {
        match self {
            StoredValue::List(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordView> {
        match self {
            StoredValue::Record(view) => Some(view),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<ListView> {
        match self {
            StoredValue::List(view) => Some(view),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<RecordView> {
        match self {
            StoredValue::Record(view) => Some(view),
            _ => None,
        }
    }

    /// Plain JSON copy of the value.
    pub fn to_value(&self) -> Value {
        match self {
            StoredValue::Scalar(value) => value.clone(),
            StoredValue::List(view) => view.to_value(),
            StoredValue::Record(view) => view.to_value(),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            StoredValue::Scalar(value) => value,
            StoredValue::List(view) => Value::Array(view.into_inner()),
            StoredValue::Record(view) => Value::Object(view.into_inner()),
        }
    }
}

/// List-shaped value that writes itself back on every mutation.
#[derive(Debug, Clone)]
pub struct ListView {
    store: KvStore,
    key: String,
    items: Vec<Value>,
}

impl ListView {
    pub(crate) fn new(store: KvStore, key: &str, items: Vec<Value>) -> Self {
        Self {
            store,
            key: key.to_string(),
            items,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    /// Deserialize every element into `T`.
    pub fn items_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.items
            .iter()
            .map(|item| Ok(serde_json::from_value(item.clone())?))
            .collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.items.clone())
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.items
    }

    pub fn push(&mut self, item: Value) -> Result<()> {
        self.apply(|_, items| {
            items.push(item);
            Ok(())
        })
    }

    /// Serialize `item` and append it.
    pub fn push_as<T: Serialize>(&mut self, item: &T) -> Result<()> {
        self.push(serde_json::to_value(item)?)
    }

    pub fn extend<I: IntoIterator<Item = Value>>(&mut self, new_items: I) -> Result<()> {
        self.apply(|_, items| {
            items.extend(new_items);
            Ok(())
        })
    }

    pub fn insert(&mut self, index: usize, item: Value) -> Result<()> {
        self.apply(|key, items| {
            if index > items.len() {
                return Err(out_of_range(key, index, items.len()));
            }
            items.insert(index, item);
            Ok(())
        })
    }

    /// Replace the element at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, item: Value) -> Result<Value> {
        self.apply(|key, items| match items.get_mut(index) {
            Some(slot) => Ok(std::mem::replace(slot, item)),
            None => Err(out_of_range(key, index, items.len())),
        })
    }

    pub fn remove(&mut self, index: usize) -> Result<Value> {
        self.apply(|key, items| {
            if index >= items.len() {
                return Err(out_of_range(key, index, items.len()));
            }
            Ok(items.remove(index))
        })
    }

    pub fn pop(&mut self) -> Result<Option<Value>> {
        self.apply(|_, items| Ok(items.pop()))
    }

    pub fn clear(&mut self) -> Result<()> {
        self.apply(|_, items| {
            items.clear();
            Ok(())
        })
    }

    /// Keep only the elements matching `keep`. Returns how many were removed.
    pub fn retain<F>(&mut self, mut keep: F) -> Result<usize>
    where
        F: FnMut(&Value) -> bool,
    {
        self.apply(|_, items| {
            let before = items.len();
            items.retain(|item| keep(item));
            Ok(before - items.len())
        })
    }

    pub fn sort_by<F>(&mut self, compare: F) -> Result<()>
    where
        F: FnMut(&Value, &Value) -> Ordering,
    {
        self.apply(|_, items| {
            items.sort_by(compare);
            Ok(())
        })
    }

    pub fn reverse(&mut self) -> Result<()> {
        self.apply(|_, items| {
            items.reverse();
            Ok(())
        })
    }

    /// Arbitrary edit of the whole list, nested values included.
    pub fn modify<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<Value>) -> R,
    {
        self.apply(|_, items| Ok(f(items)))
    }

    /// Edit one element in place.
    pub fn modify_item<R, F>(&mut self, index: usize, f: F) -> Result<R>
    where
        F: FnOnce(&mut Value) -> R,
    {
        self.apply(|key, items| {
            let len = items.len();
            items
                .get_mut(index)
                .map(f)
                .ok_or_else(|| out_of_range(key, index, len))
        })
    }

    fn apply<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&str, &mut Vec<Value>) -> Result<R>,
    {
        let seed = Value::Array(self.items.clone());
        let key = self.key.as_str();
        let (result, committed) = self.store.modify(key, &seed, |value| {
            if !value.is_array() {
                *value = seed.clone();
            }
            let items = value.as_array_mut().ok_or_else(|| StoreError::TypeMismatch {
                key: key.to_string(),
                expected: "list",
            })?;
            f(key, items)
        })?;

        if let Value::Array(items) = committed {
            self.items = items;
        }
        Ok(result)
    }
}

impl<'a> IntoIterator for &'a ListView {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Record-shaped (string-keyed) value that writes itself back on every
/// mutation.
#[derive(Debug, Clone)]
pub struct RecordView {
    store: KvStore,
    key: String,
    fields: Map<String, Value>,
}

impl RecordView {
    pub(crate) fn new(store: KvStore, key: &str, fields: Map<String, Value>) -> Self {
        Self {
            store,
            key: key.to_string(),
            fields,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Deserialize one field into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>> {
        match self.fields.get(field) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.fields.iter()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.fields
    }

    /// Set a field, returning its previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Result<Option<Value>> {
        let field = field.into();
        self.apply(|_, fields| Ok(fields.insert(field, value)))
    }

    /// Serialize `value` and store it under `field`.
    pub fn insert_as<T: Serialize>(
        &mut self,
        field: impl Into<String>,
        value: &T,
    ) -> Result<Option<Value>> {
        self.insert(field, serde_json::to_value(value)?)
    }

    pub fn remove(&mut self, field: &str) -> Result<Option<Value>> {
        self.apply(|_, fields| Ok(fields.remove(field)))
    }

    pub fn clear(&mut self) -> Result<()> {
        self.apply(|_, fields| {
            fields.clear();
            Ok(())
        })
    }

    /// Merge `entries` into the record, overwriting existing fields.
    pub fn extend<I, K>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.apply(|_, fields| {
            for (field, value) in entries {
                fields.insert(field.into(), value);
            }
            Ok(())
        })
    }

    /// Return the field's value, inserting `default` first if it is absent.
    pub fn set_default(&mut self, field: impl Into<String>, default: Value) -> Result<Value> {
        let field = field.into();
        self.apply(|_, fields| Ok(fields.entry(field).or_insert(default).clone()))
    }

    /// Keep only the fields matching `keep`. Returns how many were removed.
    pub fn retain<F>(&mut self, mut keep: F) -> Result<usize>
    where
        F: FnMut(&String, &mut Value) -> bool,
    {
        self.apply(|_, fields| {
            let before = fields.len();
            fields.retain(|field, value| keep(field, value));
            Ok(before - fields.len())
        })
    }

    /// Arbitrary edit of the whole record, nested values included.
    pub fn modify<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Map<String, Value>) -> R,
    {
        self.apply(|_, fields| Ok(f(fields)))
    }

    /// Edit one field in place. Returns `None` when the field is absent.
    pub fn modify_entry<R, F>(&mut self, field: &str, f: F) -> Result<Option<R>>
    where
        F: FnOnce(&mut Value) -> R,
    {
        self.apply(|_, fields| Ok(fields.get_mut(field).map(f)))
    }

    fn apply<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&str, &mut Map<String, Value>) -> Result<R>,
    {
        let seed = Value::Object(self.fields.clone());
        let key = self.key.as_str();
        let (result, committed) = self.store.modify(key, &seed, |value| {
            if !value.is_object() {
                *value = seed.clone();
            }
            let fields = value
                .as_object_mut()
                .ok_or_else(|| StoreError::TypeMismatch {
                    key: key.to_string(),
                    expected: "record",
                })?;
            f(key, fields)
        })?;

        if let Value::Object(fields) = committed {
            self.fields = fields;
        }
        Ok(result)
    }
}

fn out_of_range(key: &str, index: usize, len: usize) -> StoreError {
    StoreError::IndexOutOfRange {
        key: key.to_string(),
        index,
        len,
    }
}
