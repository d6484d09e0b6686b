//! Error types for intent storage.

/// Errors returned by intent backends and document stores.
#[derive(Debug, thiserror::Error)]
pub enum IntentStoreError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Storage key contains characters unsafe for file names or document ids.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    /// Remote store could not be reached or answered with an error status.
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    /// A conditional write lost against a concurrent update.
    #[error("document changed concurrently: {0}")]
    Conflict(String),
}

impl From<reqwest::Error> for IntentStoreError {
    fn from(err: reqwest::Error) -> Self {
        IntentStoreError::Unavailable(err.to_string())
    }
}
