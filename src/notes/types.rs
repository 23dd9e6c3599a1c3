use std::collections::{
    BTreeMap,
    HashMap,
};

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteField {
    pub value: String,
    pub order: u32,
}

/// A previously created flashcard, as exported from Anki or returned by
/// AnkiConnect's `notesInfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub note_id: u64,
    pub model_name: String,
    #[serde(default)]
    pub profile: String,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    pub fields: HashMap<String, NoteField>,
    #[serde(rename = "mod", default)]
    pub modified: u64,
    #[serde(default)]
    pub cards: Vec<u64>,
}

impl Note {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|f| f.value.as_str())
    }
}

/// Tags arrive either as Anki's space-delimited string or as a list.
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Tags::deserialize(deserializer)? {
        Tags::Joined(joined) => joined.split_whitespace().map(str::to_string).collect(),
        Tags::List(list) => list,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotesChunk {
    pub file: String,
    pub count: usize,
    /// `[minNoteId, maxNoteId]` of the notes packed into this chunk.
    pub range: [u64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesManifest {
    pub profile: String,
    pub total_notes: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<usize>,
    pub chunks: Vec<NotesChunk>,
    /// Milliseconds since the Unix epoch.
    pub generated_at: f64,
}

/// What to look up in the note corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteQuery {
    /// Matched as substrings of the expression field.
    pub kanji_list: Vec<String>,
    /// Matched exactly against the reading field.
    pub reading_list: Vec<String>,
    /// Matched exactly against the expression field.
    pub expression_list: Vec<String>,
}

impl NoteQuery {
    pub fn kanji(kanji: Vec<String>) -> Self {
        Self { kanji_list: kanji, ..Default::default() }
    }
}

pub type NotesByKey = BTreeMap<String, Vec<Note>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMatches {
    pub kanji_list_result: NotesByKey,
    pub reading_list_result: NotesByKey,
    pub expression_list_result: NotesByKey,
}
