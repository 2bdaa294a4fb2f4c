//! Error taxonomy shared across the workspace.
//!
//! Each subsystem crate defines its own `thiserror`-derived error enum for
//! its own failure modes; `MinervaError` wraps each of them so orchestrator
//! code can propagate any subsystem failure with plain `?`.

use thiserror::Error;

/// Top-level error type. Subsystem crates implement `From<TheirError> for
/// MinervaError` at their own boundary rather than this crate depending on
/// every subsystem crate.
#[derive(Debug, Error)]
pub enum MinervaError {
    #[error("curation store error: {0}")]
    Curation(String),

    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("graph store error: {0}")]
    Graph(String),

    #[error("llm connector error: {0}")]
    Llm(String),

    #[error("orchestrator error: {0}")]
    Orchestrator(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MinervaError {
    /// Whether the orchestrator's retry policy should retry the activity
    /// that produced this error, as opposed to treating it as terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            MinervaError::Curation(_) => false,
            MinervaError::Extraction(_) => true,
            MinervaError::Graph(_) => true,
            MinervaError::Llm(_) => true,
            MinervaError::Orchestrator(_) => false,
            MinervaError::InvalidInput(_) => false,
            MinervaError::Io(_) => true,
        }
    }
}
