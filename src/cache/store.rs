//! The key-value store abstraction shared by every component that caches.
//!
//! Stores deal in [`serde_json::Value`] so the trait stays object safe; the
//! typed [`CacheStoreExt::load`] / [`CacheStoreExt::save`] helpers sit on top
//! and are available on `dyn CacheStore` as well.

use crate::cache::error::CacheError;
use crate::cache::key::CacheKey;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

pub trait CacheStore: Send + Sync {
    /// Returns `Ok(None)` when no entry exists for `key`.
    fn load_value(&self, key: &CacheKey) -> Result<Option<Value>, CacheError>;

    /// Creates or overwrites the entry for `key`.
    fn save_value(&self, key: &CacheKey, value: &Value) -> Result<(), CacheError>;

    /// Removes the entry for `key`. Removing a missing entry is not an error.
    fn invalidate(&self, key: &CacheKey) -> Result<(), CacheError>;
}

pub trait CacheStoreExt {
    fn load<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>, CacheError>;

    fn save<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) -> Result<(), CacheError>;
}

impl<S: CacheStore + ?Sized> CacheStoreExt for S {
    fn load<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>, CacheError> {
        self.load_value(key)?
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| CacheError::Decode(key.to_string(), e))
            })
            .transpose()
    }

    fn save<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) -> Result<(), CacheError> {
        let value =
            serde_json::to_value(value).map_err(|e| CacheError::Encode(key.to_string(), e))?;
        self.save_value(key, &value)
    }
}

/// A store that lives only as long as the process. Useful for tests and for
/// embedding without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn load_value(&self, key: &CacheKey) -> Result<Option<Value>, CacheError> {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn save_value(&self, key: &CacheKey, value: &Value) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key.clone(), value.clone());
        Ok(())
    }

    fn invalidate(&self, key: &CacheKey) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.remove(key);
        Ok(())
    }
}
