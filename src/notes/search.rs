use std::sync::{
    atomic::{
        AtomicBool,
        Ordering,
    },
    Arc,
};

use async_trait::async_trait;

use super::{
    NoteMatches,
    NoteQuery,
};
use crate::core::KikuError;

/// A way of answering a [`NoteQuery`] against the user's notes.
///
/// Both the chunk scanner and the AnkiConnect client implement this, so the
/// engine can swap one for the other without the caller noticing.
#[async_trait]
pub trait NoteSearch: Send + Sync {
    async fn search(&self, query: &NoteQuery) -> Result<NoteMatches, KikuError>;

    fn name(&self) -> &'static str;
}

/// Cooperative cancellation flag, checked between chunks.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
