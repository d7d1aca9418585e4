//! The document registry: catalog invariants and operation sequencing.
//!
//! The registry exclusively owns catalog mutation. Every mutating
//! operation is a full read-modify-write cycle against the injected
//! [`CatalogStore`]; side effects (folder creation, file copy, pipeline
//! dispatch) are sequenced around the catalog write so a committed record
//! always has its stored copy on disk.
//!
//! Lifecycle per document:
//!
//! ```text
//! nonexistent → registered(embedded=false) → registered(embedded=true)
//! ```
//!
//! Deletion removes the record entirely; the embedded flag is never
//! reversed.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::catalog::{CatalogStore, JsonCatalog};
use crate::config::Config;
use crate::error::RegistryError;
use crate::models::{human_size, AddOutcome, AddRejection, AddStatus, DocumentRecord};
use crate::pipeline::{DisabledPipeline, IngestionPipeline, LocalIndexPipeline};
use crate::retrieval::{Answer, DisabledRetrieval, LocalIndexRetrieval, RetrievalEngine};
use crate::validate;

/// Housekeeping entries inside the storage roots that bulk delete must
/// leave alone.
const RESERVED_ENTRIES: [&str; 1] = [".keep"];

/// SHA-256 over the source path string exactly as supplied by the caller.
///
/// Fingerprinting is deliberately path-based, not content-based: re-adding
/// the same path after an edit is a duplicate, while identical content
/// under two paths registers twice.
pub fn fingerprint_path(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hex::encode(hasher.finalize())
}

/// Short document id: trailing 4 hex chars of the fingerprint.
pub fn short_id(fingerprint: &str) -> String {
    fingerprint[fingerprint.len().saturating_sub(4)..].to_string()
}

pub struct DocumentRegistry {
    catalog: Box<dyn CatalogStore>,
    documents_root: PathBuf,
    index_root: PathBuf,
    pipeline: Box<dyn IngestionPipeline>,
    retrieval: Box<dyn RetrievalEngine>,
    op_timeout: Duration,
}

impl DocumentRegistry {
    pub fn new(
        catalog: Box<dyn CatalogStore>,
        documents_root: PathBuf,
        index_root: PathBuf,
        pipeline: Box<dyn IngestionPipeline>,
        retrieval: Box<dyn RetrievalEngine>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            documents_root,
            index_root,
            pipeline,
            retrieval,
            op_timeout,
        }
    }

    /// Wire up a registry from configuration: JSON catalog on disk, local
    /// index pipeline and retrieval when an embedding provider is
    /// configured, disabled collaborators otherwise.
    pub fn from_config(config: &Config) -> Self {
        let catalog = Box::new(JsonCatalog::new(config.catalog.path.clone()));
        let (pipeline, retrieval): (Box<dyn IngestionPipeline>, Box<dyn RetrievalEngine>) =
            if config.embedding.is_enabled() {
                (
                    Box::new(LocalIndexPipeline::new(
                        config.chunking.clone(),
                        config.embedding.clone(),
                    )),
                    Box::new(LocalIndexRetrieval::new(
                        config.embedding.clone(),
                        config.generation.clone(),
                    )),
                )
            } else {
                (Box::new(DisabledPipeline), Box::new(DisabledRetrieval))
            };
        Self::new(
            catalog,
            config.storage.documents_root.clone(),
            config.storage.index_root.clone(),
            pipeline,
            retrieval,
            Duration::from_secs(config.pipeline.op_timeout_secs),
        )
    }

    /// Create both storage roots with their reserved housekeeping entry.
    pub fn initialize_storage(&self) -> Result<(), RegistryError> {
        for root in [&self.documents_root, &self.index_root] {
            std::fs::create_dir_all(root).map_err(|e| RegistryError::Storage {
                path: root.clone(),
                message: e.to_string(),
            })?;
            std::fs::write(root.join(".keep"), "").map_err(|e| RegistryError::Storage {
                path: root.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Register a batch of source paths, one outcome per path.
    ///
    /// Validation rejections (missing path, unknown format, duplicate
    /// fingerprint, id collision) are per-path outcomes and the batch
    /// continues past them. Catalog I/O failure aborts the whole call;
    /// later paths are not attempted.
    pub fn add(&self, paths: &[PathBuf]) -> Result<Vec<AddOutcome>, RegistryError> {
        let mut records = self.read_catalog()?;
        let mut outcomes = Vec::with_capacity(paths.len());

        for path in paths {
            if !path.exists() {
                outcomes.push(rejected(path, AddRejection::NotFound));
                continue;
            }

            let Some(format) = validate::classify(path) else {
                outcomes.push(rejected(path, AddRejection::InvalidFormat));
                continue;
            };

            let fingerprint = fingerprint_path(path);
            if records.iter().any(|r| r.fingerprint == fingerprint) {
                outcomes.push(rejected(path, AddRejection::Duplicate));
                continue;
            }

            // Distinct fingerprints can share a 4-hex id; refuse rather
            // than silently reuse the storage folder.
            let id = short_id(&fingerprint);
            if records.iter().any(|r| r.id == id) {
                outcomes.push(rejected(path, AddRejection::IdCollision));
                continue;
            }

            let record = self.stage_document(path, &id, &fingerprint, format)?;
            records.push(record);
            self.catalog
                .write(&records)
                .map_err(|e| RegistryError::WriteFailure(e.to_string()))?;

            info!(id = %id, document = %path.display(), "document registered");
            outcomes.push(AddOutcome {
                document: path.clone(),
                status: AddStatus::Added { id },
            });
        }

        Ok(outcomes)
    }

    /// Copy the source file into its dedicated storage folder and build
    /// the catalog record. Runs before the catalog write so a committed
    /// record always has its copy on disk.
    fn stage_document(
        &self,
        path: &Path,
        id: &str,
        fingerprint: &str,
        format: crate::models::DocumentFormat,
    ) -> Result<DocumentRecord, RegistryError> {
        let storage_err = |e: std::io::Error| RegistryError::Storage {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let doc_dir = self.documents_root.join(id);
        std::fs::create_dir_all(&doc_dir).map_err(storage_err)?;

        let size = human_size(std::fs::metadata(path).map_err(storage_err)?.len());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stored_path = doc_dir.join(&name);
        std::fs::copy(path, &stored_path).map_err(storage_err)?;

        Ok(DocumentRecord {
            id: id.to_string(),
            fingerprint: fingerprint.to_string(),
            size,
            name,
            path: stored_path,
            embedded: false,
            format,
        })
    }

    /// All catalog records in insertion order.
    pub fn list(&self) -> Result<Vec<DocumentRecord>, RegistryError> {
        self.read_catalog()
    }

    /// Remove one document: catalog first, then both storage folders.
    ///
    /// Folder removal is tolerant cleanup — a missing folder is not an
    /// error, and a removal failure does not revert the already-committed
    /// catalog write (it surfaces as a cleanup failure instead).
    pub fn delete(&self, id: &str) -> Result<(), RegistryError> {
        let mut records = self.read_catalog()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(RegistryError::IdNotFound(id.to_string()));
        }
        self.catalog
            .write(&records)
            .map_err(|e| RegistryError::WriteFailure(e.to_string()))?;

        let mut failures = Vec::new();
        for root in [&self.documents_root, &self.index_root] {
            let dir = root.join(id);
            if dir.exists() {
                if let Err(e) = std::fs::remove_dir_all(&dir) {
                    warn!(dir = %dir.display(), error = %e, "failed to remove storage folder");
                    failures.push(format!("{}: {}", dir.display(), e));
                }
            }
        }
        if failures.is_empty() {
            info!(id = %id, "document deleted");
            Ok(())
        } else {
            Err(RegistryError::Cleanup(failures.join("; ")))
        }
    }

    /// Clear the whole catalog and sweep both storage roots.
    ///
    /// Refuses on an empty catalog. The catalog truncation commits first;
    /// per-folder removal is best-effort and failures never roll the
    /// truncation back — the two storage roots are not transactional.
    /// Returns the number of records removed.
    pub fn delete_all(&self, confirmed: bool) -> Result<usize, RegistryError> {
        if !confirmed {
            return Err(RegistryError::NotConfirmed);
        }
        let records = self.read_catalog()?;
        if records.is_empty() {
            return Err(RegistryError::NoDocuments);
        }
        let removed = records.len();
        self.catalog
            .write(&[])
            .map_err(|e| RegistryError::WriteFailure(e.to_string()))?;

        let mut failures = Vec::new();
        for root in [&self.documents_root, &self.index_root] {
            let entries = match std::fs::read_dir(root) {
                Ok(entries) => entries,
                Err(e) => {
                    failures.push(format!("{}: {}", root.display(), e));
                    continue;
                }
            };
            for entry in entries.flatten() {
                let file_name = entry.file_name();
                if RESERVED_ENTRIES.contains(&file_name.to_string_lossy().as_ref()) {
                    continue;
                }
                if let Err(e) = remove_entry(&entry.path()) {
                    warn!(entry = %entry.path().display(), error = %e, "failed to remove storage entry");
                    failures.push(format!("{}: {}", entry.path().display(), e));
                }
            }
        }

        if failures.is_empty() {
            info!(removed, "catalog cleared");
            Ok(removed)
        } else {
            Err(RegistryError::Cleanup(failures.join("; ")))
        }
    }

    /// Run the ingestion pipeline for one document and flip its lifecycle
    /// flag on success.
    ///
    /// The flag only ever transitions false→true, and only here. A
    /// pipeline failure (or timeout) leaves the record unmodified; no
    /// retry is attempted.
    pub async fn process(&self, id: &str) -> Result<(), RegistryError> {
        let mut records = self.read_catalog()?;
        let pos = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RegistryError::IdNotFound(id.to_string()))?;
        if records[pos].embedded {
            return Err(RegistryError::AlreadyEmbedded(id.to_string()));
        }

        let record = records[pos].clone();
        let index_dir = self.index_root.join(&record.id);
        info!(id = %id, format = %record.format, "processing document");

        let run = self
            .pipeline
            .process(&record.path, &record.fingerprint, record.format, &index_dir);
        match tokio::time::timeout(self.op_timeout, run).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(RegistryError::Pipeline(e.to_string())),
            Err(_) => {
                return Err(RegistryError::Pipeline(format!(
                    "timed out after {}s",
                    self.op_timeout.as_secs()
                )))
            }
        }

        records[pos].embedded = true;
        self.catalog
            .write(&records)
            .map_err(|e| RegistryError::WriteFailure(e.to_string()))?;
        Ok(())
    }

    /// Answer a question over one embedded document's vector index.
    ///
    /// An unembedded record is refused before the retrieval engine is ever
    /// reached.
    pub async fn query(&self, id: &str, question: &str) -> Result<Answer, RegistryError> {
        let records = self.read_catalog()?;
        let record = records
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| RegistryError::IdNotFound(id.to_string()))?;
        if !record.embedded {
            return Err(RegistryError::NotEmbedded(id.to_string()));
        }

        let index_dir = self.index_root.join(&record.id);
        let run = self.retrieval.query(&index_dir, question);
        match tokio::time::timeout(self.op_timeout, run).await {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err(e)) => Err(RegistryError::Retrieval(e.to_string())),
            Err(_) => Err(RegistryError::Retrieval(format!(
                "timed out after {}s",
                self.op_timeout.as_secs()
            ))),
        }
    }

    fn read_catalog(&self) -> Result<Vec<DocumentRecord>, RegistryError> {
        self.catalog
            .read()
            .map_err(|e| RegistryError::ReadFailure(e.to_string()))
    }
}

fn rejected(path: &Path, rejection: AddRejection) -> AddOutcome {
    AddOutcome {
        document: path.to_path_buf(),
        status: AddStatus::Rejected(rejection),
    }
}

fn remove_entry(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}
