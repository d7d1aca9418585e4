//! Stable error taxonomy for registry operations.
//!
//! Every failure a caller can observe maps to exactly one of these kinds
//! with a human-readable message; no raw I/O or serde error text crosses
//! the registry boundary unwrapped.

use std::path::PathBuf;
use thiserror::Error;

/// Call-level failures of the document registry.
///
/// Per-document rejections inside a batch `add` are *not* errors; they are
/// captured as [`crate::models::AddOutcome`]s and the batch continues.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no document with id '{0}'")]
    IdNotFound(String),

    #[error("document '{0}' is already embedded")]
    AlreadyEmbedded(String),

    #[error("document '{0}' has not been embedded yet")]
    NotEmbedded(String),

    #[error("no documents in the catalog")]
    NoDocuments,

    #[error("bulk delete was not confirmed")]
    NotConfirmed,

    #[error("failed to read catalog: {0}")]
    ReadFailure(String),

    #[error("failed to write catalog: {0}")]
    WriteFailure(String),

    #[error("failed to stage document '{path}': {message}")]
    Storage { path: PathBuf, message: String },

    #[error("ingestion pipeline failed: {0}")]
    Pipeline(String),

    #[error("retrieval failed: {0}")]
    Retrieval(String),

    #[error("cleanup incomplete: {0}")]
    Cleanup(String),
}

impl RegistryError {
    /// Stable kind tag, used by the CLI for terse status lines.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::IdNotFound(_) => "not-found",
            RegistryError::AlreadyEmbedded(_) => "already-embedded",
            RegistryError::NotEmbedded(_) => "not-embedded",
            RegistryError::NoDocuments => "no-documents",
            RegistryError::NotConfirmed => "not-confirmed",
            RegistryError::ReadFailure(_) => "read-failure",
            RegistryError::WriteFailure(_) => "write-failure",
            RegistryError::Storage { .. } => "storage-failure",
            RegistryError::Pipeline(_) => "pipeline-failure",
            RegistryError::Retrieval(_) => "retrieval-failure",
            RegistryError::Cleanup(_) => "cleanup-failure",
        }
    }
}
