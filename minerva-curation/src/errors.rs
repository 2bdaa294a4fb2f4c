use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurationError {
    #[error("journal {0} not found")]
    JournalNotFound(uuid::Uuid),

    #[error("curation item {0} not found")]
    ItemNotFound(uuid::Uuid),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl CurationError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CurationError::Sqlite(_))
    }
}
