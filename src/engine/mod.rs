use std::{
    collections::{
        BTreeMap,
        HashMap,
    },
    iter,
    sync::Arc,
    time::Instant,
};

use futures::future::try_join_all;

use crate::{
    anki::{
        AnkiConnect,
        AnkiConnectSearch,
    },
    assets::AssetLoader,
    core::{
        utils::dedup_preserving_order,
        KikuError,
        SessionContext,
    },
    debug_time,
    kanji::{
        KanjiInfo,
        KanjiLookup,
    },
    notes::{
        Note,
        NoteMatches,
        NoteQuery,
        NoteScanner,
        NoteSearch,
        NotesByKey,
        NotesManifest,
    },
    similarity::SimilarityResolver,
};

pub mod types;

pub use types::{
    SharedAndSimilar,
    SharedQuery,
    SharedResult,
};

/// Fields that together identify the note behind the current card.
const SAME_NOTE_FIELDS: [&str; 3] = ["Sentence", "Hint", "MiscInfo"];

/// Kanji relationship engine: similar kanji, notes sharing kanji, and kanji
/// metadata, over one asset session.
pub struct KanjiEngine {
    ctx: SessionContext,
    loader: Arc<AssetLoader>,
    resolver: SimilarityResolver,
    scanner: Arc<NoteScanner>,
    notes: Arc<dyn NoteSearch>,
    remote: Arc<dyn NoteSearch>,
    lookup: KanjiLookup,
}

impl KanjiEngine {
    pub fn new(ctx: SessionContext) -> Self {
        let config = ctx.config.clone();
        let loader = Arc::new(AssetLoader::new(ctx.assets.clone()));
        let resolver = SimilarityResolver::new(
            loader.clone(),
            config.active_similar_sources(),
            config.similar_kanji_min_score,
        );
        let scanner = Arc::new(NoteScanner::new(loader.clone(), config.clone()));
        let remote = Arc::new(AnkiConnectSearch::new(
            AnkiConnect::new(config.anki_connect_address()),
            &config,
        ));
        let lookup = KanjiLookup::new(loader.clone(), config.files.clone());

        Self { ctx, loader, resolver, notes: scanner.clone(), scanner, remote, lookup }
    }

    /// Replaces both note search paths.
    pub fn with_note_search(
        mut self,
        notes: Arc<dyn NoteSearch>,
        remote: Arc<dyn NoteSearch>,
    ) -> Self {
        self.notes = notes;
        self.remote = remote;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn loader(&self) -> &Arc<AssetLoader> {
        &self.loader
    }

    pub async fn notes_manifest(&self) -> Result<Arc<NotesManifest>, KikuError> {
        self.scanner.manifest().await
    }

    pub async fn get_similar_kanji(&self, kanji: &str) -> Result<Vec<String>, KikuError> {
        self.resolver.resolve_similar(kanji).await
    }

    pub async fn lookup(&self, kanji: &str) -> Result<Option<KanjiInfo>, KikuError> {
        self.lookup.lookup(kanji).await
    }

    /// Runs the query on the preferred path and, if that fails, once on the
    /// other one. Only the second path's error reaches the caller.
    pub async fn query_notes(&self, query: &NoteQuery) -> Result<NoteMatches, KikuError> {
        let (first, second) = if self.ctx.config.prefer_anki_connect {
            (&self.remote, &self.notes)
        } else {
            (&self.notes, &self.remote)
        };

        tracing::info!("Querying with {}", first.name());
        match first.search(query).await {
            Ok(result) => Ok(result),
            Err(KikuError::Cancelled) => Err(KikuError::Cancelled),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "Failed to query with {}, falling back to {}",
                    first.name(),
                    second.name()
                );
                second.search(query).await
            }
        }
    }

    pub async fn query(&self, kanji: &[String]) -> Result<NotesByKey, KikuError> {
        Ok(self.query_notes(&NoteQuery::kanji(kanji.to_vec())).await?.kanji_list_result)
    }

    /// Resolves similar kanji for every input concurrently, then answers all
    /// of them (and their similars) with a single note query. A similarity
    /// database that cannot be loaded fails the whole call.
    pub async fn query_shared_and_similar(
        &self,
        kanji_list: &[String],
    ) -> Result<BTreeMap<String, SharedAndSimilar>, KikuError> {
        let start = Instant::now();
        let similar: HashMap<String, Vec<String>> =
            try_join_all(kanji_list.iter().map(|k| async move {
                Ok::<_, KikuError>((k.clone(), self.resolver.resolve_similar(k).await?))
            }))
            .await?
            .into_iter()
            .collect();

        let all_kanji = dedup_preserving_order(kanji_list.iter().flat_map(|k| {
            iter::once(k.clone()).chain(similar.get(k).into_iter().flatten().cloned())
        }));
        let matches = self.query(&all_kanji).await?;

        let mut result = BTreeMap::new();
        for kanji in kanji_list {
            let similars = similar.get(kanji).map(Vec::as_slice).unwrap_or_default();
            let entry = SharedAndSimilar {
                shared: matches.get(kanji).cloned().unwrap_or_default(),
                similar: similars
                    .iter()
                    .filter_map(|s| {
                        matches.get(s).filter(|notes| !notes.is_empty()).map(|n| (s.clone(), n.clone()))
                    })
                    .collect(),
            };
            result.insert(kanji.clone(), entry);
        }

        debug_time!(start, "shared and similar resolved", kanji = kanji_list.len());
        Ok(result)
    }

    /// Looks up kanji, readings and expressions for the current card in one
    /// pass, leaving the card's own note out of every list.
    pub async fn query_shared(&self, request: &SharedQuery) -> Result<SharedResult, KikuError> {
        let query = NoteQuery {
            kanji_list: dedup_preserving_order(request.kanji_list.iter().cloned()),
            reading_list: dedup_preserving_order(request.reading_list.iter().cloned()),
            expression_list: dedup_preserving_order(request.expression_list.iter().cloned()),
        };
        let matches = self.query_notes(&query).await?;

        let expression_field = self.ctx.config.expression_field.as_str();
        let current_expression = current_field(&request.anki_fields, expression_field);
        let not_current = |note: &&Note| !self.is_current_note(note, &request.anki_fields);

        let mut result = SharedResult::default();
        for kanji in &query.kanji_list {
            let notes = matches.kanji_list_result.get(kanji).into_iter().flatten();
            result.kanji_result.insert(kanji.clone(), notes.filter(not_current).cloned().collect());
        }
        for reading in &query.reading_list {
            let notes = matches.reading_list_result.get(reading).into_iter().flatten();
            let notes = notes
                .filter(not_current)
                .filter(|n| n.field(expression_field).unwrap_or("") != current_expression)
                .cloned()
                .collect();
            result.reading_result.insert(reading.clone(), notes);
        }
        for expression in &query.expression_list {
            let notes = matches.expression_list_result.get(expression).into_iter().flatten();
            result
                .expression_result
                .insert(expression.clone(), notes.filter(not_current).cloned().collect());
        }

        Ok(result)
    }

    fn is_current_note(&self, note: &Note, current: &HashMap<String, String>) -> bool {
        iter::once(self.ctx.config.expression_field.as_str())
            .chain(SAME_NOTE_FIELDS)
            .all(|field| note.field(field).unwrap_or("") == current_field(current, field))
    }
}

fn current_field<'a>(fields: &'a HashMap<String, String>, name: &str) -> &'a str {
    fields.get(name).map(String::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests;
