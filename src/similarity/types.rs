use std::collections::HashMap;

use serde::{
    Deserialize,
    Serialize,
};

/// One weighted provider of kanji-to-kanji similarity hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilaritySource {
    /// Asset path of the source database. Also its cache key.
    pub file: String,
    pub base_score: f64,
}

impl SimilaritySource {
    pub fn new(file: &str, base_score: f64) -> Self {
        Self { file: file.to_string(), base_score }
    }
}

/// A single candidate listed under a kanji in a similarity database.
///
/// On disk an entry is either a bare kanji string or `{kan, score}`; it is
/// converted into this enum at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEntry", into = "RawEntry")]
pub enum SimilarityEntry {
    Bare(String),
    Scored { kanji: String, score: f64 },
}

impl SimilarityEntry {
    pub fn kanji(&self) -> &str {
        match self {
            SimilarityEntry::Bare(kanji) => kanji,
            SimilarityEntry::Scored { kanji, .. } => kanji,
        }
    }

    /// Score added on top of the source's base score.
    pub fn extra_score(&self) -> f64 {
        match self {
            SimilarityEntry::Bare(_) => 0.0,
            SimilarityEntry::Scored { score, .. } => *score,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Bare(String),
    Scored {
        kan: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<f64>,
    },
}

impl From<RawEntry> for SimilarityEntry {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Bare(kanji) => SimilarityEntry::Bare(kanji),
            RawEntry::Scored { kan, score } => {
                SimilarityEntry::Scored { kanji: kan, score: score.unwrap_or(0.0) }
            }
        }
    }
}

impl From<SimilarityEntry> for RawEntry {
    fn from(entry: SimilarityEntry) -> Self {
        match entry {
            SimilarityEntry::Bare(kanji) => RawEntry::Bare(kanji),
            SimilarityEntry::Scored { kanji, score } => RawEntry::Scored { kan: kanji, score: Some(score) },
        }
    }
}

/// Contents of one source database: kanji -> ordered candidate list.
pub type SimilarityDb = HashMap<String, Vec<SimilarityEntry>>;
