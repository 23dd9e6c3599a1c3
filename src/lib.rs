pub mod anki;
pub mod assets;
pub mod builder;
pub mod core;
pub mod engine;
pub mod kanji;
pub mod logging;
pub mod notes;
pub mod persistence;
pub mod similarity;
pub mod worker;

pub use crate::{
    core::{
        KikuConfig,
        KikuError,
        SessionContext,
    },
    engine::KanjiEngine,
};
