//! Core data models for the document catalog.
//!
//! These types represent the records that flow between the registry, the
//! persisted catalog, and the ingestion/retrieval collaborators.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Supported document formats, in classification order.
///
/// The validator probes a candidate file against these in declaration
/// order; the first structural match wins (see [`crate::validate`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    #[serde(rename = "DOCX")]
    Docx,
    #[serde(rename = "PDF")]
    Pdf,
    #[serde(rename = "TEXT")]
    Text,
    #[serde(rename = "HTML")]
    Html,
    #[serde(rename = "XLS")]
    Xls,
    #[serde(rename = "XLSX")]
    Xlsx,
    #[serde(rename = "CSV")]
    Csv,
}

impl DocumentFormat {
    /// All formats in classification order.
    pub const ALL: [DocumentFormat; 7] = [
        DocumentFormat::Docx,
        DocumentFormat::Pdf,
        DocumentFormat::Text,
        DocumentFormat::Html,
        DocumentFormat::Xls,
        DocumentFormat::Xlsx,
        DocumentFormat::Csv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Text => "TEXT",
            DocumentFormat::Html => "HTML",
            DocumentFormat::Xls => "XLS",
            DocumentFormat::Xlsx => "XLSX",
            DocumentFormat::Csv => "CSV",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registered document in the catalog.
///
/// The `embedded` lifecycle flag is persisted textually (`"False"` /
/// `"True"`) to keep the on-disk catalog shape stable; in memory it is a
/// plain `bool`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Short stable identifier: trailing 4 hex chars of the fingerprint.
    pub id: String,
    /// SHA-256 over the source path string, used for deduplication.
    pub fingerprint: String,
    /// Human-readable size, computed once at ingestion.
    pub size: String,
    /// Original file basename.
    pub name: String,
    /// Location of the copy under the document storage root.
    pub path: PathBuf,
    /// Lifecycle flag: false on ingestion, flipped to true by a
    /// successful processing run. Never reversed.
    #[serde(with = "text_bool")]
    pub embedded: bool,
    /// Format tag fixed at ingestion.
    pub format: DocumentFormat,
}

/// Serde adapter persisting a `bool` as `"False"` / `"True"`.
mod text_bool {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(if *value { "True" } else { "False" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
        let s = String::deserialize(de)?;
        match s.as_str() {
            "True" => Ok(true),
            "False" => Ok(false),
            other => Err(de::Error::custom(format!(
                "expected \"True\" or \"False\", got \"{}\"",
                other
            ))),
        }
    }
}

/// Why a single path inside a batch `add` was rejected.
///
/// These are per-document outcomes, not call-level failures: the batch
/// continues past them (only catalog I/O aborts the call).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AddRejection {
    /// The source path does not exist on disk.
    NotFound,
    /// No format probe matched the file.
    InvalidFormat,
    /// A catalog record already carries this fingerprint.
    Duplicate,
    /// A different fingerprint already claimed this 4-hex id.
    IdCollision,
}

impl AddRejection {
    pub fn message(&self) -> &'static str {
        match self {
            AddRejection::NotFound => "document path does not exist",
            AddRejection::InvalidFormat => "invalid document format",
            AddRejection::Duplicate => "document already exists",
            AddRejection::IdCollision => "document id collides with an existing document",
        }
    }
}

/// Outcome of one path inside a batch `add`.
#[derive(Debug, Clone, Serialize)]
pub struct AddOutcome {
    pub document: PathBuf,
    pub status: AddStatus,
}

#[derive(Debug, Clone, Serialize)]
pub enum AddStatus {
    /// Registered successfully under the given id.
    Added { id: String },
    Rejected(AddRejection),
}

impl AddOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self.status, AddStatus::Added { .. })
    }
}

/// Render a byte count the way the catalog stores sizes:
/// plain bytes below 1 KB, two decimals above.
pub fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;
    if bytes < KB {
        format!("{} bytes", bytes)
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes < TB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    }
}
