use std::{
    collections::HashMap,
    sync::Arc,
};

use super::{
    DbBundleManifest,
    KanjiInfo,
    KanjiInfoCompact,
};
use crate::{
    assets::{
        decode_json,
        AssetCache,
        AssetLoader,
    },
    core::{
        AssetFiles,
        KikuError,
    },
};

pub type KanjiTable = HashMap<String, KanjiInfo>;

/// Kanji metadata lookup backed by the compact table, loaded once.
pub struct KanjiLookup {
    loader: Arc<AssetLoader>,
    files: AssetFiles,
    tables: AssetCache<Arc<KanjiTable>>,
    bundle_manifests: AssetCache<Arc<DbBundleManifest>>,
}

impl KanjiLookup {
    pub fn new(loader: Arc<AssetLoader>, files: AssetFiles) -> Self {
        Self { loader, files, tables: AssetCache::new(), bundle_manifests: AssetCache::new() }
    }

    /// `Ok(None)` for kanji the table does not know.
    pub async fn lookup(&self, kanji: &str) -> Result<Option<KanjiInfo>, KikuError> {
        Ok(self.table().await?.get(kanji).cloned())
    }

    pub async fn table(&self) -> Result<Arc<KanjiTable>, KikuError> {
        let key = match &self.files.db_bundle {
            Some(bundle) => format!("{}#{}", bundle.archive, bundle.kanji_entry),
            None => self.files.kanji_lookup.clone(),
        };
        self.tables.get_or_try_init(&key, || async { self.load_table().await.map(Arc::new) }).await
    }

    async fn load_table(&self) -> Result<KanjiTable, KikuError> {
        let compact: HashMap<String, KanjiInfoCompact> = match &self.files.db_bundle {
            Some(bundle) => {
                let manifest =
                    self.loader.load_cached(&self.bundle_manifests, &bundle.manifest).await?;
                let range = manifest.files.get(&bundle.kanji_entry).ok_or_else(|| {
                    KikuError::asset_unavailable(
                        &bundle.kanji_entry,
                        format!("not listed in {}", bundle.manifest),
                    )
                })?;
                let bytes = self.loader.fetch_range(&bundle.archive, range.start, range.end).await?;
                decode_json(&bundle.kanji_entry, &bytes)?
            }
            None => self.loader.load(&self.files.kanji_lookup).await?,
        };

        tracing::debug!(entries = compact.len(), "kanji table loaded");
        Ok(compact.into_iter().map(|(kanji, c)| (kanji, KanjiInfo::from(c))).collect())
    }
}
