use std::{
    collections::{
        BTreeMap,
        HashMap,
    },
    fs,
    path::Path,
    time::Instant,
};

use rayon::prelude::*;
use serde::{
    de::DeserializeOwned,
    Deserialize,
};

use crate::{
    assets::{
        decode_json,
        encode_json_gz,
    },
    core::{
        utils::dedup_preserving_order,
        KikuError,
    },
    debug_time,
    kanji::{
        KanjiInfo,
        KanjiInfoCompact,
        KanjiReading,
    },
};

/// Stroke composition, keyed by kanji.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompositionEntry {
    pub composed_of: Vec<String>,
    pub used_in: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WaniKaniEntry {
    pub primary_meaning: String,
    pub visually_similar: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JpdbEntry {
    pub keyword: Option<String>,
    pub readings: Vec<KanjiReading>,
    pub frequency: Option<String>,
    pub kind: Option<String>,
}

/// Scraped inputs of the kanji table. Only kanji present in `composition`
/// are considered; of those, only kanji with a `meanings` entry are kept.
#[derive(Debug, Clone, Default)]
pub struct KanjiDbInputs {
    pub composition: BTreeMap<String, CompositionEntry>,
    pub wanikani: HashMap<String, WaniKaniEntry>,
    pub jpdb: HashMap<String, JpdbEntry>,
    pub meanings: HashMap<String, Vec<String>>,
}

impl KanjiDbInputs {
    /// Reads each input from a JSON file, gzip-compressed or not.
    pub fn load(
        composition: &Path,
        wanikani: &Path,
        jpdb: &Path,
        meanings: &Path,
    ) -> Result<Self, KikuError> {
        Ok(Self {
            composition: read_input(composition)?,
            wanikani: read_input(wanikani)?,
            jpdb: read_input(jpdb)?,
            meanings: read_input(meanings)?,
        })
    }
}

fn read_input<T: DeserializeOwned>(path: &Path) -> Result<T, KikuError> {
    let bytes = fs::read(path)
        .map_err(|e| KikuError::asset_unavailable(&path.display().to_string(), e))?;
    decode_json(&path.display().to_string(), &bytes)
}

pub fn build_kanji_db(inputs: &KanjiDbInputs) -> BTreeMap<String, KanjiInfo> {
    let start = Instant::now();
    let mut entries: Vec<(String, KanjiInfo)> = Vec::new();
    let mut by_meaning: HashMap<&str, Vec<&str>> = HashMap::new();

    for (kanji, composition) in &inputs.composition {
        let Some(meanings) = inputs.meanings.get(kanji) else {
            tracing::debug!(kanji = %kanji, "no meanings, skipped");
            continue;
        };
        let wk = inputs.wanikani.get(kanji).cloned().unwrap_or_default();
        let jpdb = inputs.jpdb.get(kanji).cloned().unwrap_or_default();

        for meaning in meanings {
            by_meaning.entry(meaning.as_str()).or_default().push(kanji.as_str());
        }
        entries.push((
            kanji.clone(),
            KanjiInfo {
                composed_of: composition.composed_of.clone(),
                used_in: composition.used_in.clone(),
                wk_meaning: wk.primary_meaning,
                meanings: meanings.clone(),
                keyword: jpdb.keyword.unwrap_or_else(|| "???".to_string()),
                readings: jpdb.readings,
                frequency: jpdb.frequency.unwrap_or_else(|| "Unknown".to_string()),
                kind: jpdb.kind.unwrap_or_else(|| "Unknown".to_string()),
                visually_similar: wk.visually_similar,
                related: Vec::new(),
            },
        ));
    }

    let db: BTreeMap<String, KanjiInfo> = entries
        .into_par_iter()
        .map(|(kanji, mut info)| {
            info.related = dedup_preserving_order(
                info.meanings
                    .iter()
                    .flat_map(|m| by_meaning.get(m.as_str()).into_iter().flatten())
                    .filter(|other| **other != kanji)
                    .map(|other| other.to_string()),
            );
            (kanji, info)
        })
        .collect();

    debug_time!(start, "kanji db built", entries = db.len());
    db
}

pub fn write_kanji_db(db: &BTreeMap<String, KanjiInfo>, path: &Path) -> Result<(), KikuError> {
    let compact: BTreeMap<&str, KanjiInfoCompact> =
        db.iter().map(|(kanji, info)| (kanji.as_str(), info.clone().into())).collect();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, encode_json_gz(&compact)?)?;
    tracing::info!(path = %path.display(), entries = compact.len(), "kanji db written");
    Ok(())
}
