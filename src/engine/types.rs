use std::collections::HashMap;

use serde::{
    Deserialize,
    Serialize,
};

use crate::notes::{
    Note,
    NotesByKey,
};

/// Notes sharing a kanji, plus notes for each of its similar kanji that
/// actually occur in the corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedAndSimilar {
    pub shared: Vec<Note>,
    pub similar: NotesByKey,
}

/// Lookup on behalf of the card being studied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SharedQuery {
    pub kanji_list: Vec<String>,
    pub reading_list: Vec<String>,
    pub expression_list: Vec<String>,
    /// Field values of the current card, used to leave its own note out.
    pub anki_fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedResult {
    pub kanji_result: NotesByKey,
    pub reading_result: NotesByKey,
    pub expression_result: NotesByKey,
}
