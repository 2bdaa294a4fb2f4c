//! Process wiring: turns a `DaemonConfig` into the four subsystems
//! (curation store, extraction engine, graph store, orchestrator engine)
//! and submits journal entries to them. No HTTP/gRPC/CLI surface; callers
//! drive this from `main.rs` or from integration tests.

pub mod config;
pub mod errors;

pub use config::DaemonConfig;
pub use errors::DaemonError;

use minerva_curation::CurationStore;
use minerva_extraction::ExtractionEngine;
use minerva_graph::GraphStore;
use minerva_llm::LlmClient;
use minerva_orchestrator::{log::PipelineLog, PipelineEngine};
use std::sync::Arc;

/// Builds the orchestrator engine described by `config`, opening the
/// curation store and pipeline log at their configured paths.
pub async fn build_engine(config: &DaemonConfig) -> Result<PipelineEngine, DaemonError> {
    let curation = CurationStore::open(&config.curation_db_path).await?;
    let log = PipelineLog::open(&config.pipeline_log_db_path).await?;
    let graph = build_graph_store(config).await?;
    let llm = build_llm_client(config)?;
    let extraction = Arc::new(ExtractionEngine::new(llm));
    Ok(PipelineEngine::new(curation, extraction, graph, log))
}

async fn build_graph_store(config: &DaemonConfig) -> Result<Arc<dyn GraphStore>, DaemonError> {
    match config.graph_backend.as_str() {
        "neo4j" => neo4j_store(config).await,
        "memory" => memory_store(config),
        other => Err(DaemonError::UnknownGraphBackend(other.to_string())),
    }
}

fn build_llm_client(config: &DaemonConfig) -> Result<Arc<dyn LlmClient>, DaemonError> {
    match config.llm_backend.as_str() {
        "openai" => openai_client(config),
        "anthropic" => anthropic_client(config),
        "gemini" => gemini_client(config),
        other => Err(DaemonError::UnknownLlmBackend(other.to_string())),
    }
}

#[cfg(feature = "graph-neo4j")]
async fn neo4j_store(config: &DaemonConfig) -> Result<Arc<dyn GraphStore>, DaemonError> {
    let neo4j_config = config
        .neo4j
        .clone()
        .ok_or_else(|| DaemonError::Config(crate::config::ConfigError::Missing("neo4j".to_string())))?;
    let store = minerva_graph_neo4j::Neo4jGraphStore::connect(neo4j_config).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "graph-neo4j"))]
async fn neo4j_store(_config: &DaemonConfig) -> Result<Arc<dyn GraphStore>, DaemonError> {
    Err(DaemonError::GraphBackendNotCompiled("neo4j".to_string()))
}

#[cfg(feature = "graph-memory")]
fn memory_store(_config: &DaemonConfig) -> Result<Arc<dyn GraphStore>, DaemonError> {
    Ok(Arc::new(minerva_graph_memory::InMemoryGraphStore::new()))
}

#[cfg(not(feature = "graph-memory"))]
fn memory_store(_config: &DaemonConfig) -> Result<Arc<dyn GraphStore>, DaemonError> {
    Err(DaemonError::GraphBackendNotCompiled("memory".to_string()))
}

#[cfg(feature = "llm-openai")]
fn openai_client(config: &DaemonConfig) -> Result<Arc<dyn LlmClient>, DaemonError> {
    let openai_config = config
        .openai
        .clone()
        .ok_or_else(|| DaemonError::Config(crate::config::ConfigError::Missing("openai".to_string())))?;
    Ok(Arc::new(minerva_llm_openai::OpenAiClient::new(openai_config)?))
}

#[cfg(not(feature = "llm-openai"))]
fn openai_client(_config: &DaemonConfig) -> Result<Arc<dyn LlmClient>, DaemonError> {
    Err(DaemonError::LlmBackendNotCompiled("openai".to_string()))
}

#[cfg(feature = "llm-anthropic")]
fn anthropic_client(config: &DaemonConfig) -> Result<Arc<dyn LlmClient>, DaemonError> {
    let anthropic_config = config
        .anthropic
        .clone()
        .ok_or_else(|| DaemonError::Config(crate::config::ConfigError::Missing("anthropic".to_string())))?;
    Ok(Arc::new(minerva_llm_anthropic::AnthropicClient::new(anthropic_config)?))
}

#[cfg(not(feature = "llm-anthropic"))]
fn anthropic_client(_config: &DaemonConfig) -> Result<Arc<dyn LlmClient>, DaemonError> {
    Err(DaemonError::LlmBackendNotCompiled("anthropic".to_string()))
}

#[cfg(feature = "llm-gemini")]
fn gemini_client(config: &DaemonConfig) -> Result<Arc<dyn LlmClient>, DaemonError> {
    let gemini_config = config
        .gemini
        .clone()
        .ok_or_else(|| DaemonError::Config(crate::config::ConfigError::Missing("gemini".to_string())))?;
    Ok(Arc::new(minerva_llm_gemini::GeminiClient::new(gemini_config)?))
}

#[cfg(not(feature = "llm-gemini"))]
fn gemini_client(_config: &DaemonConfig) -> Result<Arc<dyn LlmClient>, DaemonError> {
    Err(DaemonError::LlmBackendNotCompiled("gemini".to_string()))
}
