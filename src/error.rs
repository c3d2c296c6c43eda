// In: src/error.rs

//! This module defines the single, unified error type for the entire cellcast library,
//! plus the non-fatal `InferenceFailure` returned by individual cascade stages.
//! Both use the `thiserror` crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CellcastError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    /// A caller-supplied force cast could not be applied. Recovered by the pipeline:
    /// the column falls back to automatic inference and the message is reported.
    #[error("could not cast column '{column}' to {requested}: {reason}")]
    ForceCastFailed {
        column: String,
        requested: String,
        reason: String,
    },

    /// A cell does not populate exactly the slots its dtype declares, or a value
    /// does not fit its dtype. Always a bug, never user input.
    #[error("Codec invariant violated (this is a bug): {0}")]
    CodecInvariantViolation(String),

    /// Stored data carries a dtype this build of the codec does not understand.
    #[error("Unsupported dtype at decode: {0}")]
    UnsupportedDtypeAtDecode(String),

    /// The all-or-nothing write of a source was rejected. Nothing was persisted.
    #[error("Bulk commit failed: {0}")]
    BulkCommitFailed(String),

    /// A `CastConfig` document parsed but carries an out-of-range setting.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error originating from the underlying I/O subsystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while reading a `CastConfig`.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error for Python FFI (Foreign Function Interface) operations.
    #[error("FFI operation failed: {0}")]
    FfiError(String),
}

/// Why a single cascade stage rejected a column.
///
/// These never reach the caller as errors; the cascade just moves on to the
/// next candidate dtype. They are logged at `debug` level.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceFailure {
    #[error("{exceptions} non-numeric entries exceed the tolerance of {allowed}")]
    NotNumeric { exceptions: usize, allowed: usize },

    #[error("row {row} is not a complex number")]
    NotComplex { row: usize },

    #[error("{distinct} distinct values out of {total} exceed the category limit")]
    TooManyCategories { distinct: usize, total: usize },

    #[error("row {row} is not a time span")]
    NotDuration { row: usize },

    #[error("row {row} is not a timestamp")]
    NotDateTime { row: usize },

    #[error("column is empty")]
    Empty,
}

#[cfg(feature = "python")]
impl From<pyo3::PyErr> for CellcastError {
    fn from(err: pyo3::PyErr) -> Self {
        CellcastError::FfiError(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<CellcastError> for pyo3::PyErr {
    fn from(err: CellcastError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
