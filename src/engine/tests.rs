use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};

use async_trait::async_trait;

use super::*;
use crate::{
    assets::{
        encode_json_gz,
        MemoryAssets,
    },
    core::KikuConfig,
    notes::scanner::tests::{
        corpus,
        note,
    },
    similarity::{
        SimilarityDb,
        SimilarityEntry,
        SimilaritySource,
    },
};

/// Note search stub that counts calls and either answers from a fixed
/// corpus or fails.
struct StubSearch {
    name: &'static str,
    notes: Vec<Note>,
    failure: Option<fn() -> KikuError>,
    calls: AtomicUsize,
    queries: std::sync::Mutex<Vec<NoteQuery>>,
}

impl StubSearch {
    fn answering(name: &'static str, notes: Vec<Note>) -> Arc<Self> {
        Arc::new(Self {
            name,
            notes,
            failure: None,
            calls: AtomicUsize::new(0),
            queries: Default::default(),
        })
    }

    fn failing(name: &'static str) -> Arc<Self> {
        Self::failing_with(name, || {
            KikuError::asset_unavailable("_kiku_notes_0.json.gz", "HTTP 404")
        })
    }

    fn failing_with(name: &'static str, error: fn() -> KikuError) -> Arc<Self> {
        Arc::new(Self {
            name,
            notes: Vec::new(),
            failure: Some(error),
            calls: AtomicUsize::new(0),
            queries: Default::default(),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NoteSearch for StubSearch {
    async fn search(&self, query: &NoteQuery) -> Result<NoteMatches, KikuError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        if let Some(error) = self.failure {
            return Err(error());
        }

        let mut result = NoteMatches::default();
        for note in &self.notes {
            let expr = note.field("Expression").unwrap_or("");
            let reading = note.field("ExpressionReading").unwrap_or("");
            for kanji in &query.kanji_list {
                if expr.contains(kanji.as_str()) {
                    result.kanji_list_result.entry(kanji.clone()).or_default().push(note.clone());
                }
            }
            if query.reading_list.iter().any(|r| r == reading) {
                result.reading_list_result.entry(reading.to_string()).or_default().push(note.clone());
            }
            if query.expression_list.iter().any(|e| e == expr) {
                result.expression_list_result.entry(expr.to_string()).or_default().push(note.clone());
            }
        }
        Ok(result)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

fn similarity_assets(assets: &MemoryAssets) -> Vec<SimilaritySource> {
    let manual: SimilarityDb = SimilarityDb::from([
        ("日".to_string(), vec![SimilarityEntry::Bare("目".into()), SimilarityEntry::Bare("曰".into())]),
        ("未".to_string(), vec![SimilarityEntry::Bare("末".into()), SimilarityEntry::Bare("本".into())]),
    ]);
    assets.insert("manual.json.gz", encode_json_gz(&manual).unwrap());
    vec![SimilaritySource::new("manual.json.gz", 0.9)]
}

fn engine_with(
    assets: Arc<MemoryAssets>,
    config: KikuConfig,
    notes: Arc<dyn NoteSearch>,
    remote: Arc<dyn NoteSearch>,
) -> KanjiEngine {
    KanjiEngine::new(SessionContext::new(config, assets)).with_note_search(notes, remote)
}

fn ids(notes: &[Note]) -> Vec<u64> {
    notes.iter().map(|n| n.note_id).collect()
}

fn kanji(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

#[tokio::test]
async fn test_single_scan_for_many_kanji() {
    let assets = Arc::new(MemoryAssets::new());
    let mut config = KikuConfig::default();
    config.similar_sources = similarity_assets(&assets);

    let notes = StubSearch::answering("stub", vec![note(1, "Kiku", "日本", "にほん")]);
    let remote = StubSearch::failing("remote");
    let engine = engine_with(assets, config, notes.clone(), remote.clone());

    engine.query_shared_and_similar(&kanji(&["日", "未", "日"])).await.unwrap();

    assert_eq!(notes.calls(), 1);
    assert_eq!(remote.calls(), 0);
    let queried = notes.queries.lock().unwrap()[0].kanji_list.clone();
    assert_eq!(queried, kanji(&["日", "目", "曰", "未", "末", "本"]));
}

#[tokio::test]
async fn test_similar_without_notes_is_pruned() {
    let assets = Arc::new(MemoryAssets::new());
    let mut config = KikuConfig::default();
    config.similar_sources = similarity_assets(&assets);

    let notes = StubSearch::answering(
        "stub",
        vec![note(1, "Kiku", "日本", "にほん"), note(2, "Kiku", "注目", "ちゅうもく")],
    );
    let engine = engine_with(assets, config, notes, StubSearch::failing("remote"));

    let result = engine.query_shared_and_similar(&kanji(&["日", "火"])).await.unwrap();

    let sun = &result["日"];
    assert_eq!(ids(&sun.shared), vec![1]);
    assert_eq!(sun.similar.keys().collect::<Vec<_>>(), vec!["目"]);
    assert_eq!(ids(&sun.similar["目"]), vec![2]);
    assert!(!sun.similar.contains_key("曰"));

    let fire = &result["火"];
    assert!(fire.shared.is_empty());
    assert!(fire.similar.is_empty());
}

#[tokio::test]
async fn test_scan_failure_falls_back_to_remote() {
    let assets = Arc::new(MemoryAssets::new());
    let mut config = KikuConfig::default();
    config.similar_sources = similarity_assets(&assets);

    let remote_notes = vec![note(1, "Kiku", "日本", "にほん"), note(2, "Kiku", "目玉", "めだま")];
    let expected = engine_with(
        assets.clone(),
        config.clone(),
        StubSearch::answering("stub", remote_notes.clone()),
        StubSearch::failing("unused"),
    )
    .query_shared_and_similar(&kanji(&["日"]))
    .await
    .unwrap();

    let notes = StubSearch::failing("notes cache");
    let remote = StubSearch::answering("remote", remote_notes);
    let engine = engine_with(assets, config, notes.clone(), remote.clone());
    let result = engine.query_shared_and_similar(&kanji(&["日"])).await.unwrap();

    assert_eq!(notes.calls(), 1);
    assert_eq!(remote.calls(), 1);
    assert_eq!(result, expected);
}

#[tokio::test]
async fn test_both_paths_failing_surfaces_remote_error() {
    let engine = engine_with(
        Arc::new(MemoryAssets::new()),
        KikuConfig::default(),
        StubSearch::failing("notes cache"),
        StubSearch::failing("remote"),
    );
    assert!(engine.query(&kanji(&["日"])).await.is_err());
}

#[tokio::test]
async fn test_prefer_anki_connect_reverses_order() {
    let mut config = KikuConfig::default();
    config.prefer_anki_connect = true;
    let notes = StubSearch::answering("notes cache", vec![note(1, "Kiku", "日本", "にほん")]);
    let remote = StubSearch::failing("remote");
    let engine = engine_with(Arc::new(MemoryAssets::new()), config, notes.clone(), remote.clone());

    let result = engine.query(&kanji(&["日"])).await.unwrap();
    assert_eq!(ids(&result["日"]), vec![1]);
    assert_eq!(remote.calls(), 1);
    assert_eq!(notes.calls(), 1);
}

#[tokio::test]
async fn test_missing_similarity_db_fails_shared_and_similar() {
    let mut config = KikuConfig::default();
    config.similar_sources = vec![SimilaritySource::new("gone.json.gz", 0.9)];
    let notes = StubSearch::answering("stub", vec![note(1, "Kiku", "日本", "にほん")]);
    let engine = engine_with(
        Arc::new(MemoryAssets::new()),
        config,
        notes.clone(),
        StubSearch::failing("remote"),
    );

    let err = engine.query_shared_and_similar(&kanji(&["日"])).await.unwrap_err();
    assert!(matches!(err, KikuError::AssetUnavailable { .. }));
    assert_eq!(notes.calls(), 0);
}

#[tokio::test]
async fn test_any_first_path_error_falls_back() {
    let notes = StubSearch::failing_with("notes cache", || {
        KikuError::AnkiConnect("collection is not available".into())
    });
    let remote = StubSearch::answering("remote", vec![note(1, "Kiku", "日本", "にほん")]);
    let engine = engine_with(
        Arc::new(MemoryAssets::new()),
        KikuConfig::default(),
        notes.clone(),
        remote.clone(),
    );

    let result = engine.query(&kanji(&["日"])).await.unwrap();
    assert_eq!(ids(&result["日"]), vec![1]);
    assert_eq!(notes.calls(), 1);
    assert_eq!(remote.calls(), 1);
}

#[tokio::test]
async fn test_cancelled_does_not_fall_back() {
    let notes = StubSearch::failing_with("notes cache", || KikuError::Cancelled);
    let remote = StubSearch::answering("remote", vec![note(1, "Kiku", "日本", "にほん")]);
    let engine = engine_with(
        Arc::new(MemoryAssets::new()),
        KikuConfig::default(),
        notes,
        remote.clone(),
    );

    assert!(matches!(engine.query(&kanji(&["日"])).await, Err(KikuError::Cancelled)));
    assert_eq!(remote.calls(), 0);
}

#[tokio::test]
async fn test_query_shared_drops_current_note() {
    let mut current = note(1, "Kiku", "日本", "にほん");
    current.fields.insert(
        "Sentence".into(),
        crate::notes::NoteField { value: "日本に行く".into(), order: 2 },
    );
    let other_reading = note(2, "Kiku", "二本", "にほん");
    let same_expression = note(3, "Lapis", "日本", "にほん");
    let engine = engine_with(
        Arc::new(MemoryAssets::new()),
        KikuConfig::default(),
        StubSearch::answering("stub", vec![current, other_reading, same_expression]),
        StubSearch::failing("remote"),
    );

    let request = SharedQuery {
        kanji_list: kanji(&["日", "日"]),
        reading_list: vec!["にほん".into()],
        expression_list: vec!["日本".into()],
        anki_fields: HashMap::from([
            ("Expression".to_string(), "日本".to_string()),
            ("Sentence".to_string(), "日本に行く".to_string()),
        ]),
    };
    let result = engine.query_shared(&request).await.unwrap();

    assert_eq!(result.kanji_result.len(), 1);
    assert_eq!(ids(&result.kanji_result["日"]), vec![3]);
    // Same-expression notes are not "shared readings".
    assert_eq!(ids(&result.reading_result["にほん"]), vec![2]);
    assert_eq!(ids(&result.expression_result["日本"]), vec![3]);
}

#[tokio::test]
async fn test_engine_over_real_chunks() {
    let assets = corpus();
    let mut config = KikuConfig::default();
    config.similar_sources = similarity_assets(&assets);
    let engine = KanjiEngine::new(SessionContext::new(config, assets.clone()));

    let manifest = engine.notes_manifest().await.unwrap();
    assert_eq!(manifest.total_notes, 6);

    let result = engine.query_shared_and_similar(&kanji(&["未"])).await.unwrap();
    assert_eq!(ids(&result["未"].shared), vec![13]);
    assert_eq!(result["未"].similar.keys().collect::<Vec<_>>(), vec!["本"]);
    assert_eq!(ids(&result["未"].similar["本"]), vec![10, 14, 15]);
    assert_eq!(assets.fetches("manual.json.gz"), 1);
}
