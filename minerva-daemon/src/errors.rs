use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("unknown graph backend {0:?}, expected \"neo4j\" or \"memory\"")]
    UnknownGraphBackend(String),

    #[error("graph backend {0:?} was selected but the crate was built without its feature flag")]
    GraphBackendNotCompiled(String),

    #[error("unknown llm backend {0:?}, expected \"openai\", \"anthropic\" or \"gemini\"")]
    UnknownLlmBackend(String),

    #[error("llm backend {0:?} was selected but the crate was built without its feature flag")]
    LlmBackendNotCompiled(String),

    #[error(transparent)]
    Graph(#[from] minerva_graph::GraphError),

    #[error(transparent)]
    Llm(#[from] minerva_llm::LlmError),

    #[error(transparent)]
    Curation(#[from] minerva_curation::CurationError),

    #[error(transparent)]
    Orchestrator(#[from] minerva_orchestrator::OrchestratorError),

    #[error("journal text could not be parsed: {0}")]
    JournalParse(#[from] minerva_core::types::ParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
