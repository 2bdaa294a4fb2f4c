use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("entity {0} not found")]
    NotFound(uuid::Uuid),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("invalid entity data: {0}")]
    InvalidData(String),
}

impl GraphError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GraphError::Backend(_))
    }
}
