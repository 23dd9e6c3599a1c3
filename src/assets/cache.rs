use std::{
    collections::HashMap,
    future::Future,
    sync::{
        Arc,
        Mutex,
    },
};

use tokio::sync::OnceCell;

use crate::core::KikuError;

/// Session-lifetime cache keyed by asset path.
///
/// Every key owns its own `OnceCell`, so concurrent first access to the same
/// key runs the initialiser once while the other callers wait on it. A failed
/// initialiser leaves the slot empty and the next caller tries again. Values
/// never change once set.
pub struct AssetCache<V> {
    slots: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
}

impl<V: Clone> AssetCache<V> {
    pub fn new() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }

    fn slot(&self, key: &str) -> Arc<OnceCell<V>> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(key.to_string()).or_insert_with(|| Arc::new(OnceCell::new())).clone()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.get(key).and_then(|cell| cell.get().cloned())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns `false` without touching the entry if the key is already set.
    pub fn set(&self, key: &str, value: V) -> bool {
        self.slot(key).set(value).is_ok()
    }

    pub async fn get_or_try_init<F, Fut>(&self, key: &str, init: F) -> Result<V, KikuError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, KikuError>>,
    {
        let cell = self.slot(key);
        cell.get_or_try_init(init).await.cloned()
    }
}

impl<V: Clone> Default for AssetCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
