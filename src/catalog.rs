//! Catalog persistence.
//!
//! The catalog is a flat, ordered list of [`DocumentRecord`]s persisted as
//! a single JSON file. It is fully read and fully rewritten on every
//! mutating registry operation; there is no partial update path. The store
//! itself carries no business logic and performs no validation.

use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

use crate::models::DocumentRecord;

/// I/O faults of the catalog store. The registry maps these onto its own
/// read-failure / write-failure kinds.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Read(String),
    #[error("{0}")]
    Write(String),
}

/// Persistence seam for the document catalog.
///
/// `read` never panics and never surfaces partial data: a missing or
/// corrupt backing file is a read fault. `write` replaces the entire
/// persisted collection.
pub trait CatalogStore: Send + Sync {
    fn read(&self) -> Result<Vec<DocumentRecord>, CatalogError>;
    fn write(&self, records: &[DocumentRecord]) -> Result<(), CatalogError>;
}

/// JSON-file catalog store.
///
/// Writes go to a temp file in the same directory and are renamed over the
/// catalog path, so a reader never observes a half-written catalog.
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Create the backing file with an empty collection if it is missing.
    pub fn initialize(&self) -> Result<(), CatalogError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::Write(e.to_string()))?;
        }
        self.write(&[])
    }
}

impl CatalogStore for JsonCatalog {
    fn read(&self) -> Result<Vec<DocumentRecord>, CatalogError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| CatalogError::Read(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| CatalogError::Read(e.to_string()))
    }

    fn write(&self, records: &[DocumentRecord]) -> Result<(), CatalogError> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| CatalogError::Write(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| CatalogError::Write(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| CatalogError::Write(e.to_string()))
    }
}

/// In-memory catalog store.
///
/// Used in tests and anywhere a registry is exercised without touching
/// disk; mirrors the JSON store's full-replace contract.
#[derive(Default)]
pub struct MemoryCatalog {
    records: Mutex<Vec<DocumentRecord>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for MemoryCatalog {
    fn read(&self) -> Result<Vec<DocumentRecord>, CatalogError> {
        Ok(self.records.lock().expect("catalog lock poisoned").clone())
    }

    fn write(&self, records: &[DocumentRecord]) -> Result<(), CatalogError> {
        *self.records.lock().expect("catalog lock poisoned") = records.to_vec();
        Ok(())
    }
}
