use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("llm call failed: {0}")]
    Llm(#[from] minerva_llm::LlmError),

    #[error("llm response could not be interpreted: {0}")]
    InvalidLlmResponse(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ExtractionError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ExtractionError::Llm(e) => e.is_retryable(),
            ExtractionError::InvalidLlmResponse(_) => true,
            ExtractionError::InvalidInput(_) => false,
        }
    }
}
