//! Error kinds raised by the loader, the column resolver and the detectors.
//!
//! Command handlers wrap these in `anyhow` with additional context; the
//! variants stay distinguishable so callers (and tests) can match on the
//! failure kind.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// The loader could not find an input dataset.
    #[error("{label} file not found: {path:?}")]
    SourceNotFound { label: String, path: PathBuf },

    /// A role could not be resolved to a column after the permitted attempts.
    #[error("Invalid column selected for '{role}': '{value}'")]
    InvalidColumnSelection { role: String, value: String },

    /// A column referenced by the mapping is absent from a loaded dataset.
    #[error("Column '{column}' not found in {dataset} dataset")]
    UnknownColumn { dataset: String, column: String },

    /// A configuration value is outside its accepted range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The operator prompt could not be read or written.
    #[error("Operator prompt failed")]
    Prompt(#[source] std::io::Error),
}

pub type AuditResult<T> = std::result::Result<T, AuditError>;
