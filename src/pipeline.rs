//! Ingestion pipeline seam and the local vector-index implementation.
//!
//! The registry treats ingestion as an atomic collaborator call: extract,
//! chunk, embed, persist the index — succeed as a whole or fail as a
//! whole. The index layout under `index_root/<id>/` is opaque to the
//! registry; only this module and [`crate::retrieval`] know its shape.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::chunk::chunk_text;
use crate::config::{ChunkingConfig, EmbeddingConfig};
use crate::embedding::embed_texts;
use crate::extract::extract_text;
use crate::models::DocumentFormat;

/// Name of the single index file inside a document's index folder.
pub const INDEX_FILE_NAME: &str = "index.json";

/// Persisted vector index for one document.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexFile {
    /// Fingerprint of the document this index belongs to.
    pub storage_key: String,
    /// Embedding model that produced the vectors.
    pub model: String,
    /// Vector dimensionality.
    pub dims: usize,
    pub chunks: Vec<IndexedChunk>,
}

/// One embedded passage.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub index: i64,
    /// Provenance label, `<basename>#<index>`.
    pub source: String,
    pub text: String,
    /// SHA-256 of the chunk text, for staleness checks against a
    /// re-extracted document.
    pub hash: String,
    pub embedding: Vec<f32>,
}

/// External collaborator that turns a stored document into a vector index.
///
/// Implementations must be atomic from the registry's point of view: on
/// error, no usable index may be left behind at `index_dir`.
#[async_trait]
pub trait IngestionPipeline: Send + Sync {
    async fn process(
        &self,
        source: &Path,
        storage_key: &str,
        format: DocumentFormat,
        index_dir: &Path,
    ) -> Result<()>;
}

/// Pipeline used when no embedding provider is configured; always fails.
pub struct DisabledPipeline;

#[async_trait]
impl IngestionPipeline for DisabledPipeline {
    async fn process(
        &self,
        _source: &Path,
        _storage_key: &str,
        _format: DocumentFormat,
        _index_dir: &Path,
    ) -> Result<()> {
        anyhow::bail!("Embedding provider is disabled; cannot process documents")
    }
}

/// Extract → chunk → embed → persist a JSON index on local disk.
pub struct LocalIndexPipeline {
    chunking: ChunkingConfig,
    embedding: EmbeddingConfig,
}

impl LocalIndexPipeline {
    pub fn new(chunking: ChunkingConfig, embedding: EmbeddingConfig) -> Self {
        Self {
            chunking,
            embedding,
        }
    }
}

#[async_trait]
impl IngestionPipeline for LocalIndexPipeline {
    async fn process(
        &self,
        source: &Path,
        storage_key: &str,
        format: DocumentFormat,
        index_dir: &Path,
    ) -> Result<()> {
        let text = extract_text(source, format)
            .with_context(|| format!("extracting {}", source.display()))?;
        let chunks = chunk_text(&text, self.chunking.max_chars);
        debug!(chunks = chunks.len(), "document chunked");

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_texts(&self.embedding, &texts).await?;
        if vectors.len() != chunks.len() {
            anyhow::bail!(
                "embedding backend returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            );
        }

        let basename = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dims = vectors.first().map(|v| v.len()).unwrap_or(0);
        let index = IndexFile {
            storage_key: storage_key.to_string(),
            model: self.embedding.model.clone().unwrap_or_default(),
            dims,
            chunks: chunks
                .iter()
                .zip(vectors)
                .map(|(chunk, embedding)| IndexedChunk {
                    index: chunk.index,
                    source: format!("{}#{}", basename, chunk.index),
                    text: chunk.text.clone(),
                    hash: chunk.hash.clone(),
                    embedding,
                })
                .collect(),
        };

        // Written as temp-then-rename so a failed run leaves no usable index.
        std::fs::create_dir_all(index_dir)
            .with_context(|| format!("creating {}", index_dir.display()))?;
        let target = index_dir.join(INDEX_FILE_NAME);
        let tmp = index_dir.join("index.json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&index)?)?;
        std::fs::rename(&tmp, &target)?;

        info!(
            chunks = index.chunks.len(),
            index = %target.display(),
            "document indexed"
        );
        Ok(())
    }
}

/// Load a persisted index from a document's index folder.
pub fn load_index(index_dir: &Path) -> Result<IndexFile> {
    let path = index_dir.join(INDEX_FILE_NAME);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading index {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing index {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_disabled_pipeline_fails_without_side_effects() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.txt");
        std::fs::write(&source, "hello").unwrap();
        let index_dir = tmp.path().join("index").join("ab12");

        let err = DisabledPipeline
            .process(&source, "fingerprint", DocumentFormat::Text, &index_dir)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disabled"));
        assert!(!index_dir.join(INDEX_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_local_pipeline_fails_when_provider_disabled() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.txt");
        std::fs::write(&source, "hello world").unwrap();
        let index_dir = tmp.path().join("index").join("ab12");

        let pipeline =
            LocalIndexPipeline::new(ChunkingConfig::default(), EmbeddingConfig::default());
        let result = pipeline
            .process(&source, "fingerprint", DocumentFormat::Text, &index_dir)
            .await;
        assert!(result.is_err());
        assert!(!index_dir.join(INDEX_FILE_NAME).exists());
    }

    #[test]
    fn test_index_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let index = IndexFile {
            storage_key: "fp".to_string(),
            model: "test-model".to_string(),
            dims: 2,
            chunks: vec![IndexedChunk {
                index: 0,
                source: "a.txt#0".to_string(),
                text: "hello".to_string(),
                hash: chunk_text("hello", 500)[0].hash.clone(),
                embedding: vec![0.1, 0.2],
            }],
        };
        std::fs::write(
            tmp.path().join(INDEX_FILE_NAME),
            serde_json::to_vec(&index).unwrap(),
        )
        .unwrap();

        let loaded = load_index(tmp.path()).unwrap();
        assert_eq!(loaded.storage_key, "fp");
        assert_eq!(loaded.chunks.len(), 1);
        assert_eq!(loaded.chunks[0].source, "a.txt#0");
        // The chunk hash survives persistence, so a later run can tell
        // whether the stored text still matches a re-extracted document.
        assert_eq!(loaded.chunks[0].hash, chunk_text("hello", 500)[0].hash);
    }

    #[test]
    fn test_load_index_missing_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load_index(tmp.path()).is_err());
    }
}
