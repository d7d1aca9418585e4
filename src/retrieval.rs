//! Retrieval engine seam: similarity search plus answer synthesis.
//!
//! The local implementation embeds the question, ranks the document's
//! stored passages by cosine similarity, and asks an Ollama-served model
//! to answer from the top passages only. Provenance labels of the
//! passages used are returned verbatim alongside the answer.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::config::{EmbeddingConfig, GenerationConfig};
use crate::embedding::{cosine_similarity, embed_query};
use crate::pipeline::load_index;

/// Number of passages handed to the generation model.
const TOP_K: usize = 5;

const PROMPT_TEMPLATE: &str = "Answer the question based only on the following context:
{context}

Question: {question}
";

/// Synthesized answer plus the provenance of the passages used.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

/// External collaborator that answers a question over one document's index.
#[async_trait]
pub trait RetrievalEngine: Send + Sync {
    async fn query(&self, index_dir: &Path, question: &str) -> Result<Answer>;
}

/// Engine used when no embedding provider is configured; always fails.
pub struct DisabledRetrieval;

#[async_trait]
impl RetrievalEngine for DisabledRetrieval {
    async fn query(&self, _index_dir: &Path, _question: &str) -> Result<Answer> {
        bail!("Embedding provider is disabled; cannot query documents")
    }
}

/// Cosine top-k over the local index, answer synthesis via Ollama.
pub struct LocalIndexRetrieval {
    embedding: EmbeddingConfig,
    generation: GenerationConfig,
}

impl LocalIndexRetrieval {
    pub fn new(embedding: EmbeddingConfig, generation: GenerationConfig) -> Self {
        Self {
            embedding,
            generation,
        }
    }

    /// Rank the index's passages against the question vector and keep the
    /// top [`TOP_K`].
    fn top_passages<'a>(
        index: &'a crate::pipeline::IndexFile,
        question_vec: &[f32],
    ) -> Vec<&'a crate::pipeline::IndexedChunk> {
        let mut scored: Vec<(f32, &crate::pipeline::IndexedChunk)> = index
            .chunks
            .iter()
            .map(|chunk| (cosine_similarity(question_vec, &chunk.embedding), chunk))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().take(TOP_K).map(|(_, c)| c).collect()
    }
}

#[async_trait]
impl RetrievalEngine for LocalIndexRetrieval {
    async fn query(&self, index_dir: &Path, question: &str) -> Result<Answer> {
        let index = load_index(index_dir)?;
        if index.chunks.is_empty() {
            bail!("index at {} contains no passages", index_dir.display());
        }

        let question_vec = embed_query(&self.embedding, question).await?;
        let passages = Self::top_passages(&index, &question_vec);
        debug!(passages = passages.len(), "similarity search complete");

        let context = passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");
        let prompt = PROMPT_TEMPLATE
            .replace("{context}", &context)
            .replace("{question}", question);

        let text = generate_ollama(&self.generation, &prompt).await?;
        let sources = passages.iter().map(|p| p.source.clone()).collect();

        Ok(Answer { text, sources })
    }
}

/// Ask the Ollama `/api/generate` endpoint for a non-streamed completion.
async fn generate_ollama(config: &GenerationConfig, prompt: &str) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = serde_json::json!({
        "model": config.model,
        "prompt": prompt,
        "stream": false,
    });

    let response = client
        .post(format!("{}/api/generate", config.url))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .with_context(|| format!("is Ollama running at {}?", config.url))?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("Ollama API error {}: {}", status, body_text);
    }

    let json: serde_json::Value = response.json().await?;
    json.get("response")
        .and_then(|r| r.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing response field"))
}
