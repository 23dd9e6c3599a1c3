use std::{
    collections::{
        BTreeSet,
        HashSet,
    },
    sync::Arc,
    time::Instant,
};

use async_trait::async_trait;

use super::{
    CancelToken,
    Note,
    NoteMatches,
    NoteQuery,
    NoteSearch,
    NotesByKey,
    NotesManifest,
};
use crate::{
    assets::{
        AssetCache,
        AssetLoader,
    },
    core::{
        KikuConfig,
        KikuError,
    },
    debug_time,
};

/// Answers note queries by walking the exported, gzip-chunked note corpus.
///
/// Chunks are fetched strictly one after another and dropped once their notes
/// have been matched, so peak memory is one chunk. Only the manifest is cached.
pub struct NoteScanner {
    loader: Arc<AssetLoader>,
    config: Arc<KikuConfig>,
    manifests: AssetCache<Arc<NotesManifest>>,
}

impl NoteScanner {
    pub fn new(loader: Arc<AssetLoader>, config: Arc<KikuConfig>) -> Self {
        Self { loader, config, manifests: AssetCache::new() }
    }

    pub async fn manifest(&self) -> Result<Arc<NotesManifest>, KikuError> {
        self.loader.load_cached(&self.manifests, &self.config.files.notes_manifest).await
    }

    /// Kanji-only scan: kanji -> notes whose expression contains it.
    pub async fn scan(&self, kanji: &[String]) -> Result<NotesByKey, KikuError> {
        let query = NoteQuery::kanji(kanji.to_vec());
        Ok(self.scan_with_cancel(&query, &CancelToken::new()).await?.kanji_list_result)
    }

    pub async fn scan_with_cancel(
        &self,
        query: &NoteQuery,
        cancel: &CancelToken,
    ) -> Result<NoteMatches, KikuError> {
        let start = Instant::now();
        let manifest = self.manifest().await?;

        // Set semantics for the lookup keys; BTreeSet keeps the walk order stable.
        let kanji_set: BTreeSet<&str> = query.kanji_list.iter().map(String::as_str).collect();
        let reading_set: HashSet<&str> = query.reading_list.iter().map(String::as_str).collect();
        let expression_set: HashSet<&str> =
            query.expression_list.iter().map(String::as_str).collect();

        let mut result = NoteMatches::default();

        for chunk in &manifest.chunks {
            if cancel.is_cancelled() {
                tracing::debug!(chunk = %chunk.file, "scan cancelled");
                return Err(KikuError::Cancelled);
            }

            let notes: Vec<Note> = self.loader.load(&chunk.file).await?;
            let mut found = 0usize;

            for note in notes {
                if !self.config.is_supported_model(&note.model_name) {
                    continue;
                }

                let Some(expr) = note.field(&self.config.expression_field) else {
                    tracing::warn!(note_id = note.note_id, "note has no expression field");
                    continue;
                };
                let reading = note.field(&self.config.reading_field).unwrap_or("");

                let kanji_hits: Vec<&str> =
                    kanji_set.iter().copied().filter(|kanji| expr.contains(kanji)).collect();
                let reading_hit = reading_set.contains(reading);
                let expression_hit = expression_set.contains(expr);

                if kanji_hits.is_empty() && !reading_hit && !expression_hit {
                    continue;
                }
                found += 1;

                for kanji in kanji_hits {
                    push(&mut result.kanji_list_result, kanji, &note);
                }
                if reading_hit {
                    push(&mut result.reading_list_result, reading, &note);
                }
                if expression_hit {
                    push(&mut result.expression_list_result, expr, &note);
                }
            }

            tracing::trace!(chunk = %chunk.file, found, "chunk scanned");
        }

        debug_time!(start, "note scan finished", chunks = manifest.chunks.len());
        Ok(result)
    }
}

fn push(map: &mut NotesByKey, key: &str, note: &Note) {
    map.entry(key.to_string()).or_default().push(note.clone());
}

#[async_trait]
impl NoteSearch for NoteScanner {
    async fn search(&self, query: &NoteQuery) -> Result<NoteMatches, KikuError> {
        self.scan_with_cancel(query, &CancelToken::new()).await
    }

    fn name(&self) -> &'static str {
        "notes cache"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        assets::{
            encode_json_gz,
            MemoryAssets,
        },
        notes::{
            NoteField,
            NotesChunk,
        },
    };

    pub(crate) fn note(id: u64, model: &str, expression: &str, reading: &str) -> Note {
        Note {
            note_id: id,
            model_name: model.to_string(),
            profile: "User 1".to_string(),
            tags: Vec::new(),
            fields: HashMap::from([
                ("Expression".to_string(), NoteField { value: expression.to_string(), order: 0 }),
                (
                    "ExpressionReading".to_string(),
                    NoteField { value: reading.to_string(), order: 1 },
                ),
            ]),
            modified: id / 1000,
            cards: vec![id + 1],
        }
    }

    /// Two-chunk corpus served from memory.
    pub(crate) fn corpus() -> Arc<MemoryAssets> {
        let chunk0 = vec![
            note(10, "Kiku", "日本", "にほん"),
            note(12, "Basic", "日曜日", "にちようび"),
            note(14, "Lapis", "本当", "ほんとう"),
        ];
        let chunk1 = vec![
            note(11, "Kiku", "毎日", "まいにち"),
            note(13, "Kiku", "未来", "みらい"),
            note(15, "Lapis", "日本", "にっぽん"),
        ];
        let manifest = NotesManifest {
            profile: "User 1".to_string(),
            total_notes: 6,
            chunk_count: Some(2),
            chunks: vec![
                NotesChunk { file: "_kiku_notes_0.json.gz".into(), count: 3, range: [10, 14] },
                NotesChunk { file: "_kiku_notes_1.json.gz".into(), count: 3, range: [11, 15] },
            ],
            generated_at: 1_700_000_000_000.0,
        };

        let assets = Arc::new(MemoryAssets::new());
        assets.insert("_kiku_notes_manifest.json", serde_json::to_vec(&manifest).unwrap());
        assets.insert("_kiku_notes_0.json.gz", encode_json_gz(&chunk0).unwrap());
        assets.insert("_kiku_notes_1.json.gz", encode_json_gz(&chunk1).unwrap());
        assets
    }

    fn scanner(assets: Arc<MemoryAssets>) -> NoteScanner {
        NoteScanner::new(Arc::new(AssetLoader::new(assets)), Arc::new(KikuConfig::default()))
    }

    fn ids(notes: &[Note]) -> Vec<u64> {
        notes.iter().map(|n| n.note_id).collect()
    }

    #[tokio::test]
    async fn test_scan_matches_substring_and_allowed_models() {
        let scanner = scanner(corpus());
        let result = scanner.scan(&["日".to_string(), "本".to_string(), "火".to_string()]).await.unwrap();

        // Chunk order, then in-chunk order. The Basic note never matches.
        assert_eq!(ids(&result["日"]), vec![10, 11, 15]);
        assert_eq!(ids(&result["本"]), vec![10, 14, 15]);
        assert!(!result.contains_key("火"));
    }

    #[tokio::test]
    async fn test_manifest_cached_chunks_not() {
        let assets = corpus();
        let scanner = scanner(assets.clone());
        scanner.scan(&["日".to_string()]).await.unwrap();
        scanner.scan(&["未".to_string()]).await.unwrap();

        assert_eq!(assets.fetches("_kiku_notes_manifest.json"), 1);
        assert_eq!(assets.fetches("_kiku_notes_0.json.gz"), 2);
        assert_eq!(assets.fetches("_kiku_notes_1.json.gz"), 2);
    }

    #[tokio::test]
    async fn test_reading_and_expression_queries() {
        let scanner = scanner(corpus());
        let query = NoteQuery {
            kanji_list: Vec::new(),
            reading_list: vec!["にほん".to_string(), "みらい".to_string()],
            expression_list: vec!["日本".to_string()],
        };
        let result = scanner.search(&query).await.unwrap();

        assert!(result.kanji_list_result.is_empty());
        assert_eq!(ids(&result.reading_list_result["にほん"]), vec![10]);
        assert_eq!(ids(&result.reading_list_result["みらい"]), vec![13]);
        assert_eq!(ids(&result.expression_list_result["日本"]), vec![10, 15]);
    }

    #[tokio::test]
    async fn test_missing_chunk_fails_scan() {
        let assets = corpus();
        assets.remove("_kiku_notes_1.json.gz");
        let err = scanner(assets).scan(&["日".to_string()]).await.unwrap_err();
        assert!(matches!(err, KikuError::AssetUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_chunk() {
        let assets = corpus();
        let scanner = scanner(assets.clone());
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = scanner.scan_with_cancel(&NoteQuery::kanji(vec!["日".into()]), &cancel).await;
        assert!(matches!(err, Err(KikuError::Cancelled)));
        assert_eq!(assets.fetches("_kiku_notes_0.json.gz"), 0);
    }
}
