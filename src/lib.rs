//! # Metacurate - bulk metadata curation for remote repositories
//!
//! Metacurate bulk-edits structured metadata on datasets and collections in
//! a remote repository, driven by plain CSV files written by operators.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Ingest    │────▶│ Merge Engine│────▶│  Remote API │
//! │  (auto-enc) │     │ (mode+rows) │     │ (read+merge)│     │ (full PUT)  │
//! └─────────────┘     └──────┬──────┘     └──────▲──────┘     └─────────────┘
//!                            │      ┌────────────┴───┐
//!                            └─────▶│   Validator    │
//!                                   │ (dual-mode)    │
//!                                   └────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use metacurate::{ingest_file, run_batch, BatchOptions, HttpResourceClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = HttpResourceClient::from_env().unwrap();
//!     let ingest = ingest_file("changes.csv").unwrap();
//!     let result = run_batch(&client, ingest, &BatchOptions::default()).await.unwrap();
//!     println!("{}", result.summary());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (MetadataEntry, ResourceSnapshot, ChangeRecord)
//! - [`registry`] - Static CSV column to property mapping table
//! - [`ingest`] - CSV reading and mode detection
//! - [`parsers`] - Multilingual, list and rights value parsers
//! - [`merge`] - Pure read-merge engine
//! - [`validate`] - Dual-mode validation with advisory vocabulary checks
//! - [`client`] - Remote repository API client
//! - [`batch`] - Batch orchestrator
//! - [`logs`] - Leveled operator logs

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Mapping and ingestion
pub mod ingest;
pub mod registry;

// Value parsing and merging
pub mod merge;
pub mod parsers;

// Validation
pub mod validate;

// Remote API
pub mod client;

// Orchestration
pub mod batch;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{BatchError, ClientError, CsvError, ValidationFailure};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ChangeMode, ChangeRecord, MetaValue, MetadataEntry, Person, Resolved, ResourceKind,
    ResourceSnapshot, SkippedRow,
};

// =============================================================================
// Re-exports - Registry
// =============================================================================

pub use registry::{FieldMapping, FieldRegistry, ValueFormat, FIELD_REGISTRY};

// =============================================================================
// Re-exports - Ingestion
// =============================================================================

pub use ingest::{
    detect_delimiter, detect_encoding, detect_mode, ingest_bytes, ingest_file, ingest_str,
    IngestResult,
};

// =============================================================================
// Re-exports - Parsing and merging
// =============================================================================

pub use merge::{merge, MergeOutcome};
pub use parsers::{parse_value, ParseOutcome};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validate::{validate_change, ValidationMode, ValidationReport, VocabularyAdvisor};

// =============================================================================
// Re-exports - Client
// =============================================================================

pub use client::{HttpResourceClient, ResourceClient};

// =============================================================================
// Re-exports - Batch orchestration
// =============================================================================

pub use batch::{
    run_batch, BatchModificationResult, BatchOptions, ItemFailure, ItemState, ItemSuccess,
};
