pub mod bundle;
pub mod kanji_db;
pub mod notes;

pub use bundle::{
    pack_bundle,
    read_ranges,
};
pub use kanji_db::{
    build_kanji_db,
    write_kanji_db,
    KanjiDbInputs,
};
pub use notes::{
    export_notes,
    partition_notes,
    write_export,
    NotesExport,
};
