//! Error types for the metadata curation engine.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - CSV ingestion errors (fatal configuration class)
//! - [`ClientError`] - Remote repository API errors
//! - [`ValidationFailure`] - Blocking validation errors for one item
//! - [`BatchError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Per-item errors (resolution failures, remote write failures, validation
//! failures) never propagate out of a batch run; they become failure records
//! in the batch result. Only configuration-class errors abort a run.

use thiserror::Error;

// =============================================================================
// CSV Ingestion Errors
// =============================================================================

/// Errors while reading and interpreting a CSV file.
///
/// These are configuration-class errors: they abort the run before any
/// change record is processed.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode the file content.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Malformed CSV.
    #[error("Invalid CSV format: {0}")]
    ParseError(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl From<csv::Error> for CsvError {
    fn from(e: csv::Error) -> Self {
        CsvError::ParseError(e.to_string())
    }
}

// =============================================================================
// Remote Repository Client Errors
// =============================================================================

/// Errors from the remote repository API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing API configuration.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// Neither the dataset nor the collection endpoint knows this id.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Transport-level failure.
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// The API answered with a non-success status. The raw body is kept
    /// verbatim for operator diagnosis.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Response body could not be decoded.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

// =============================================================================
// Validation Failure
// =============================================================================

/// Blocking validation errors for a single change record.
#[derive(Debug, Error)]
#[error("Validation failed: {}", errors.join("; "))]
pub struct ValidationFailure {
    pub errors: Vec<String>,
}

// =============================================================================
// Batch Errors (top-level)
// =============================================================================

/// Top-level orchestration errors.
///
/// This is the main error type returned by [`crate::batch::run_batch`].
/// Per-item failures are recorded in the batch result instead; only errors
/// that prevent the run from starting surface here.
#[derive(Debug, Error)]
pub enum BatchError {
    /// CSV ingestion error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Client configuration error (missing URL/key).
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// No change records to process.
    #[error("No change records in input")]
    EmptyInput,

    /// JSON serialization error while writing the run artifact.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV ingestion.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for remote client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type for batch runs.
pub type BatchResult<T> = Result<T, BatchError>;
