use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanjiReading {
    pub reading: String,
    pub percentage: String,
}

/// Metadata about one kanji, built offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanjiInfo {
    pub composed_of: Vec<String>,
    pub used_in: Vec<String>,
    pub wk_meaning: String,
    pub meanings: Vec<String>,
    pub keyword: String,
    pub readings: Vec<KanjiReading>,
    pub frequency: String,
    pub kind: String,
    pub visually_similar: Vec<String>,
    /// Kanji sharing at least one meaning with this one.
    pub related: Vec<String>,
}

/// Positional on-disk form of [`KanjiInfo`]. Field order is part of the
/// asset format and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanjiInfoCompact(
    pub Vec<String>,
    pub Vec<String>,
    pub String,
    pub Vec<String>,
    pub String,
    pub Vec<KanjiReading>,
    pub String,
    pub String,
    pub Vec<String>,
    pub Vec<String>,
);

impl From<KanjiInfoCompact> for KanjiInfo {
    fn from(c: KanjiInfoCompact) -> Self {
        KanjiInfo {
            composed_of: c.0,
            used_in: c.1,
            wk_meaning: c.2,
            meanings: c.3,
            keyword: c.4,
            readings: c.5,
            frequency: c.6,
            kind: c.7,
            visually_similar: c.8,
            related: c.9,
        }
    }
}

impl From<KanjiInfo> for KanjiInfoCompact {
    fn from(info: KanjiInfo) -> Self {
        KanjiInfoCompact(
            info.composed_of,
            info.used_in,
            info.wk_meaning,
            info.meanings,
            info.keyword,
            info.readings,
            info.frequency,
            info.kind,
            info.visually_similar,
            info.related,
        )
    }
}

/// Byte span of one file inside the packed DB bundle. `end` is inclusive:
/// `end == start + size - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRange {
    pub start: u64,
    pub end: u64,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DbBundleManifest {
    pub files: BTreeMap<String, FileRange>,
}
