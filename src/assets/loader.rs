use std::{
    sync::{
        atomic::{
            AtomicUsize,
            Ordering,
        },
        Arc,
    },
    time::Instant,
};

use serde::de::DeserializeOwned;

use super::{
    codec::decode_json,
    AssetCache,
    AssetSource,
};
use crate::{
    core::KikuError,
    debug_time,
};

/// Fetches and decodes JSON assets, gzip or plain.
///
/// The loader itself keeps no values; callers that want a resource kept for
/// the session hand in the [`AssetCache`] it belongs to.
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
    fetches: AtomicUsize,
}

impl AssetLoader {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source, fetches: AtomicUsize::new(0) }
    }

    pub fn source(&self) -> &Arc<dyn AssetSource> {
        &self.source
    }

    /// Number of network/disk fetches issued so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    pub async fn fetch(&self, path: &str) -> Result<Vec<u8>, KikuError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(path, "fetching asset");
        self.source.fetch(path).await
    }

    pub async fn fetch_range(&self, path: &str, start: u64, end: u64) -> Result<Vec<u8>, KikuError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(path, start, end, "fetching asset range");
        self.source.fetch_range(path, start, end).await
    }

    /// Uncached load. Used for note chunks, which are too large to keep.
    pub async fn load<T: DeserializeOwned>(&self, path: &str) -> Result<T, KikuError> {
        let start = Instant::now();
        let bytes = self.fetch(path).await?;
        let value = decode_json(path, &bytes)?;
        debug_time!(start, "asset decoded", path = path, bytes = bytes.len());
        Ok(value)
    }

    pub async fn load_cached<T>(
        &self,
        cache: &AssetCache<Arc<T>>,
        path: &str,
    ) -> Result<Arc<T>, KikuError>
    where
        T: DeserializeOwned + Send + Sync,
    {
        cache.get_or_try_init(path, || async { self.load::<T>(path).await.map(Arc::new) }).await
    }
}
