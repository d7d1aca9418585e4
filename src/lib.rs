//! # docvault
//!
//! A local-first document registry and lifecycle orchestrator for
//! retrieval-augmented querying.
//!
//! docvault owns a flat catalog of registered documents, deduplicates
//! them by fingerprint, tracks each document's lifecycle
//! (added → embedded), and sequences the side effects around every
//! catalog mutation: content-addressed storage folders, dispatch to the
//! ingestion pipeline, and retrieval over the resulting vector indices.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────────┐   ┌──────────────┐
//! │   CLI    │──▶│ DocumentRegistry  │──▶│ JSON catalog │
//! │(docvault)│   │  add/list/delete  │   │ (full-file   │
//! └──────────┘   │  process/query    │   │   replace)   │
//!                └───┬───────────┬───┘   └──────────────┘
//!                    ▼           ▼
//!          ┌──────────────┐ ┌──────────────┐
//!          │  Ingestion   │ │  Retrieval   │
//!          │  Pipeline    │ │   Engine     │
//!          │ chunk+embed  │ │ top-k + LLM  │
//!          └──────────────┘ └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docvault init                       # write config, catalog, storage roots
//! docvault add report.pdf notes.txt   # register documents
//! docvault list                       # show the catalog
//! docvault process --id ab12          # embed into the vector index
//! docvault query --id ab12 -q "What is the summary?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Catalog record and outcome types |
//! | [`error`] | Stable registry error taxonomy |
//! | [`catalog`] | Catalog persistence (JSON full-file replace) |
//! | [`validate`] | Structural format classification |
//! | [`registry`] | The orchestrator: catalog invariants and sequencing |
//! | [`chunk`] | Paragraph-boundary text chunking |
//! | [`extract`] | Per-format plain-text extraction |
//! | [`embedding`] | HTTP embedding client and vector utilities |
//! | [`pipeline`] | Ingestion pipeline seam and local index writer |
//! | [`retrieval`] | Similarity search and answer synthesis |

pub mod catalog;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod retrieval;
pub mod validate;
