//! Error taxonomy for cohort cadence.
//!
//! Engine operations fail fast with the precise kind so the caller can render
//! a specific message. Nothing in this crate retries.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the engine, the record store and the mirror contract.
#[derive(Debug, Error)]
pub enum CadenceError {
    /// A cohort identifier or name did not resolve to any record.
    #[error("Unknown cohort: {0}")]
    NotFound(String),

    /// A required attribute was missing or invalid on creation.
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Analysis was requested before the backing store exists.
    #[error("No cadence store found at {}. Run `cohort-cadence init` first.", path.display())]
    StoreNotInitialized { path: PathBuf },

    /// The external mirror's connection parameters are missing or invalid.
    #[error("Mirror unavailable: {0}")]
    MirrorUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CadenceError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        CadenceError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CadenceError>;
