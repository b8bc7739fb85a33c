//! Error types for seqpicker operations.
//!
//! Defines the error types for each subsystem:
//! - Identity table parsing
//! - Objective composition and representative selection
//! - Exporting selections and run reports

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading a pairwise identity table.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Identity file is empty: {0}")]
    InputEmpty(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while composing objectives or selecting representatives.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("State for objective '{objective}' does not belong to this objective")]
    StateMismatch { objective: String },
}

/// Errors that can occur while writing selections or reports.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write representatives to '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
