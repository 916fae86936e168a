//! Error types for the Folio engine.
//!
//! Validation failures are not errors in the `Result` sense: they end up in
//! the form's error map. [`FieldError`] is the value type used to report them
//! out of a rejected submit.

use crate::FieldName;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from engine operations that can actually fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("unsupported snapshot format version: expected {expected}, got {actual}")]
    SnapshotVersionMismatch { expected: u32, actual: u32 },
}

/// A single field failing its declared rules.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: FieldName,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<FieldName>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
