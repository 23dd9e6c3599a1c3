pub mod lookup;
pub mod types;

pub use lookup::{
    KanjiLookup,
    KanjiTable,
};
pub use types::{
    DbBundleManifest,
    FileRange,
    KanjiInfo,
    KanjiInfoCompact,
    KanjiReading,
};
