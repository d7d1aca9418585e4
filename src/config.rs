use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root holding one subfolder per document id with the raw copy.
    pub documents_root: PathBuf,
    /// Root holding one subfolder per document id with the vector index.
    pub index_root: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default)]
    #[allow(dead_code)]
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            overlap_chars: 0,
        }
    }
}

fn default_max_chars() -> usize {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            url: None,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_generation_url")]
    pub url: String,
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
            url: default_generation_url(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

fn default_generation_model() -> String {
    "mistral".to_string()
}
fn default_generation_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_generation_timeout() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Upper bound on a single process/query collaborator call.
    #[serde(default = "default_op_timeout")]
    pub op_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            op_timeout_secs: default_op_timeout(),
        }
    }
}

fn default_op_timeout() -> u64 {
    300
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.chunking.max_chars == 0 {
        anyhow::bail!("chunking.max_chars must be > 0");
    }

    if config.embedding.is_enabled() && config.embedding.model.is_none() {
        anyhow::bail!(
            "embedding.model must be specified when provider is '{}'",
            config.embedding.provider
        );
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }

    if config.storage.documents_root == config.storage.index_root {
        anyhow::bail!("storage.documents_root and storage.index_root must differ");
    }

    Ok(config)
}

/// Default config written by `docvault init` when no config file exists.
/// All paths are relative to the working directory.
pub fn default_config_toml() -> &'static str {
    r#"[catalog]
path = "data/catalog.json"

[storage]
documents_root = "data/documents"
index_root = "data/index"

[chunking]
max_chars = 500
overlap_chars = 80

[embedding]
# "disabled", "ollama", or "openai"
provider = "disabled"
# model = "nomic-embed-text"
# url = "http://localhost:11434"

[generation]
model = "mistral"
url = "http://localhost:11434"

[pipeline]
op_timeout_secs = 300
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config: Config = toml::from_str(default_config_toml()).unwrap();
        assert_eq!(config.catalog.path, PathBuf::from("data/catalog.json"));
        assert_eq!(config.chunking.max_chars, 500);
        assert!(!config.embedding.is_enabled());
        assert_eq!(config.generation.model, "mistral");
        assert_eq!(config.pipeline.op_timeout_secs, 300);
    }

    #[test]
    fn test_enabled_embedding_requires_model() {
        let toml_str = r#"
[catalog]
path = "c.json"
[storage]
documents_root = "docs"
index_root = "index"
[embedding]
provider = "ollama"
"#;
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), toml_str).unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("embedding.model"));
    }

    #[test]
    fn test_storage_roots_must_differ() {
        let toml_str = r#"
[catalog]
path = "c.json"
[storage]
documents_root = "data"
index_root = "data"
"#;
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), toml_str).unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }
}
