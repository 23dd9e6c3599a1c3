use std::{
    collections::HashMap,
    sync::{
        atomic::{
            AtomicUsize,
            Ordering,
        },
        Mutex,
    },
};

use async_trait::async_trait;

use super::{
    source::slice_bytes,
    AssetSource,
};
use crate::core::KikuError;

/// In-memory asset source. Counts every fetch, per path.
#[derive(Default)]
pub struct MemoryAssets {
    files: Mutex<HashMap<String, Vec<u8>>>,
    fetches: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &str, bytes: Vec<u8>) {
        self.files.lock().unwrap_or_else(|e| e.into_inner()).insert(path.to_string(), bytes);
    }

    pub fn remove(&self, path: &str) {
        self.files.lock().unwrap_or_else(|e| e.into_inner()).remove(path);
    }

    pub fn fetches(&self, path: &str) -> usize {
        self.fetches.lock().unwrap_or_else(|e| e.into_inner()).get(path).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, KikuError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.fetches.lock().unwrap_or_else(|e| e.into_inner()).entry(path.to_string()).or_default() +=
            1;
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
            .ok_or_else(|| KikuError::asset_unavailable(path, "not found"))
    }
}

#[async_trait]
impl AssetSource for MemoryAssets {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, KikuError> {
        self.read(path)
    }

    async fn fetch_range(&self, path: &str, start: u64, end: u64) -> Result<Vec<u8>, KikuError> {
        let bytes = self.read(path)?;
        slice_bytes(path, &bytes, start, end)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
