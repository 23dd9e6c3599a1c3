use std::sync::Arc;

use futures::future::try_join_all;

use super::{
    SimilarityDb,
    SimilaritySource,
};
use crate::{
    assets::{
        AssetCache,
        AssetLoader,
    },
    core::KikuError,
};

/// Per-query scores of candidate kanji.
///
/// Keys keep the position of their first insertion; overwriting a score does
/// not move a key, removing and re-adding it moves it to the end.
#[derive(Debug, Default)]
pub struct ScoreAccumulator {
    entries: Vec<(String, f64)>,
}

impl ScoreAccumulator {
    pub fn score(&self, kanji: &str) -> Option<f64> {
        self.entries.iter().find(|(k, _)| k == kanji).map(|(_, score)| *score)
    }

    pub fn set(&mut self, kanji: &str, score: f64) {
        match self.entries.iter_mut().find(|(k, _)| k == kanji) {
            Some(entry) => entry.1 = score,
            None => self.entries.push((kanji.to_string(), score)),
        }
    }

    pub fn remove(&mut self, kanji: &str) {
        self.entries.retain(|(k, _)| k != kanji);
    }

    pub fn into_kanji(self) -> Vec<String> {
        self.entries.into_iter().map(|(k, _)| k).collect()
    }
}

/// Merges every source's opinion about `kanji` into one candidate list.
///
/// Sources run in the given order. An entry scoring above `min_score`, or any
/// positive entry for a candidate that already holds a positive score,
/// overwrites the candidate's score. A negative entry removes the candidate
/// no matter what earlier sources said. Anything else is ignored.
pub fn aggregate_similar(
    kanji: &str,
    sources: &[(&SimilaritySource, &SimilarityDb)],
    min_score: f64,
) -> Vec<String> {
    let mut store = ScoreAccumulator::default();

    for (source, db) in sources {
        let Some(entries) = db.get(kanji) else {
            continue;
        };

        for entry in entries {
            let candidate = entry.kanji();
            let score = source.base_score + entry.extra_score();
            let old_score = store.score(candidate).unwrap_or(0.0);

            if score > min_score || (score > 0.0 && old_score > 0.0) {
                store.set(candidate, score);
            } else if score < 0.0 {
                store.remove(candidate);
            }
        }
    }

    store.into_kanji()
}

pub struct SimilarityResolver {
    loader: Arc<AssetLoader>,
    sources: Vec<SimilaritySource>,
    min_score: f64,
    dbs: AssetCache<Arc<SimilarityDb>>,
}

impl SimilarityResolver {
    pub fn new(loader: Arc<AssetLoader>, sources: Vec<SimilaritySource>, min_score: f64) -> Self {
        Self { loader, sources, min_score, dbs: AssetCache::new() }
    }

    pub fn sources(&self) -> &[SimilaritySource] {
        &self.sources
    }

    /// Loads every configured database, each once per session.
    pub async fn databases(&self) -> Result<Vec<Arc<SimilarityDb>>, KikuError> {
        try_join_all(
            self.sources.iter().map(|source| self.loader.load_cached(&self.dbs, &source.file)),
        )
        .await
    }

    pub async fn resolve_similar(&self, kanji: &str) -> Result<Vec<String>, KikuError> {
        let dbs = self.databases().await?;
        let pairs: Vec<(&SimilaritySource, &SimilarityDb)> =
            self.sources.iter().zip(dbs.iter().map(|db| db.as_ref())).collect();

        let similar = aggregate_similar(kanji, &pairs, self.min_score);
        tracing::trace!(kanji, count = similar.len(), "resolved similar kanji");
        Ok(similar)
    }
}
