use minerva_curation::CurationError;
use minerva_extraction::ExtractionError;
use minerva_graph::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("curation store error: {0}")]
    Curation(#[from] CurationError),

    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("graph store error: {0}")]
    Graph(#[from] GraphError),

    #[error("sqlite error: {0}")]
    Sqlite(String),

    #[error("stage {0:?} exhausted its retry policy: {1}")]
    RetriesExhausted(crate::state::PipelineStage, String),

    #[error("schedule-to-close deadline exceeded waiting on stage {0:?}")]
    DeadlineExceeded(crate::state::PipelineStage),

    #[error("journal {0} was cancelled")]
    Cancelled(uuid::Uuid),
}

impl OrchestratorError {
    pub fn from_sqlite(e: rusqlite::Error) -> Self {
        OrchestratorError::Sqlite(e.to_string())
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            OrchestratorError::Curation(e) => e.is_retryable(),
            OrchestratorError::Extraction(e) => e.is_retryable(),
            OrchestratorError::Graph(e) => e.is_retryable(),
            OrchestratorError::Sqlite(_) => true,
            OrchestratorError::RetriesExhausted(..) | OrchestratorError::DeadlineExceeded(_) | OrchestratorError::Cancelled(_) => false,
        }
    }
}
