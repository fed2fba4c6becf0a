//! Name → driver lookup.
//!
//! Replaces the module-loading container of the original engine with a
//! typed map. Keys are flat lowercase strings such as
//! `delta:runner:mdb` or `delta:migration:add-users`; values are shared
//! trait objects. The registry is read-only at request time.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::error::{CoreError, Result};

pub struct Registry<T: ?Sized> {
    entries: RwLock<HashMap<String, Arc<T>>>,
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, value: Arc<T>) {
        self.entries.write().insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Result<Arc<T>> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| CoreError::UnknownDriver(key.to_owned()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}
