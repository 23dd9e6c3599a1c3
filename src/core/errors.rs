use thiserror::Error;
use tokio::sync::mpsc::error::SendError;

#[derive(Error, Debug)]
pub enum KikuError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("Asset unavailable: {path}: {reason}")]
    AssetUnavailable { path: String, reason: String },

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("AnkiConnect error: {0}")]
    AnkiConnect(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("Scan cancelled")]
    Cancelled,

    #[error("KikuError: {0}")]
    Custom(String),
}

impl KikuError {
    pub fn asset_unavailable(path: &str, reason: impl ToString) -> Self {
        KikuError::AssetUnavailable { path: path.to_string(), reason: reason.to_string() }
    }

    pub fn decode(path: &str, reason: impl ToString) -> Self {
        KikuError::Decode { path: path.to_string(), reason: reason.to_string() }
    }
}

impl<T> From<SendError<T>> for KikuError {
    fn from(error: SendError<T>) -> Self {
        KikuError::Worker(error.to_string())
    }
}

impl From<std::io::Error> for KikuError {
    fn from(error: std::io::Error) -> Self {
        KikuError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for KikuError {
    fn from(error: reqwest::Error) -> Self {
        KikuError::Reqwest(Box::new(error))
    }
}
