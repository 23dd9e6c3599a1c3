pub mod scanner;
pub mod search;
pub mod types;

pub use scanner::NoteScanner;
pub use search::{
    CancelToken,
    NoteSearch,
};
pub use types::{
    Note,
    NoteField,
    NoteMatches,
    NoteQuery,
    NotesByKey,
    NotesChunk,
    NotesManifest,
};
