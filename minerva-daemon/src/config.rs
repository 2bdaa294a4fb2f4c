//! Daemon configuration: which graph/LLM backend to wire up and where the
//! curation and pipeline-log SQLite files live. Grounded on
//! `kgctl/src/config.rs`'s figment layering (file, then environment
//! overrides) and the connector/adapter crates' builder-style config
//! structs.

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(String),
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("selected backend {0:?} requires a matching config block that wasn't provided")]
    Missing(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Which `GraphStore` implementation to construct: "neo4j" or "memory".
    pub graph_backend: String,
    /// Which `LlmClient` implementation to construct: "openai", "anthropic"
    /// or "gemini".
    pub llm_backend: String,
    pub curation_db_path: PathBuf,
    pub pipeline_log_db_path: PathBuf,

    #[cfg(feature = "graph-neo4j")]
    pub neo4j: Option<minerva_graph_neo4j::Neo4jConfig>,
    #[cfg(feature = "llm-openai")]
    pub openai: Option<minerva_llm_openai::OpenAiConfig>,
    #[cfg(feature = "llm-anthropic")]
    pub anthropic: Option<minerva_llm_anthropic::AnthropicConfig>,
    #[cfg(feature = "llm-gemini")]
    pub gemini: Option<minerva_llm_gemini::GeminiConfig>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            graph_backend: "memory".to_string(),
            llm_backend: "openai".to_string(),
            curation_db_path: PathBuf::from("minerva_curation.sqlite"),
            pipeline_log_db_path: PathBuf::from("minerva_pipeline_log.sqlite"),
            #[cfg(feature = "graph-neo4j")]
            neo4j: None,
            #[cfg(feature = "llm-openai")]
            openai: None,
            #[cfg(feature = "llm-anthropic")]
            anthropic: None,
            #[cfg(feature = "llm-gemini")]
            gemini: None,
        }
    }
}

impl DaemonConfig {
    /// Loads configuration from `minerva.yaml` (if present), an optional
    /// explicit config file, and environment variables prefixed
    /// `MINERVA_`, in that order of increasing precedence.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(figment::providers::Serialized::defaults(DaemonConfig::default()));

        if Path::new("minerva.yaml").exists() {
            figment = figment.merge(Yaml::file("minerva.yaml"));
        }
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed("MINERVA_").split("__"));

        figment.extract().map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_in_memory_graph_and_openai() {
        let config = DaemonConfig::default();
        assert_eq!(config.graph_backend, "memory");
        assert_eq!(config.llm_backend, "openai");
    }

    #[test]
    fn loads_overrides_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minerva.yaml");
        std::fs::write(&path, "graph_backend: neo4j\nllm_backend: anthropic\n").unwrap();

        let config = DaemonConfig::load(Some(&path)).unwrap();
        assert_eq!(config.graph_backend, "neo4j");
        assert_eq!(config.llm_backend, "anthropic");
    }
}
