//! This file is the root of the `cellcast` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`inference`, `codec`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Defining the `#[pymodule]` which acts as the main entry point when the
//!     compiled library is imported into Python (feature `python`).

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod bridge;
pub mod codec;
pub mod config;
pub mod error;
pub mod inference;
pub mod kernels;
pub mod observability;
pub mod pipeline;
pub mod traits;
pub mod types;

mod ffi;

pub use config::{CastConfig, NanTolerance};
pub use error::{CellcastError, InferenceFailure};
pub use pipeline::{decode_page, decode_row, ingest, IngestResult, Page, PageRequest, SortBy};
pub use types::{ColumnDescriptor, Dtype, GenericCell, RawColumn, RawTable, TypedValue};

//==================================================================================
// 2. Python Module Definition
//==================================================================================
#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The `cellcast` Python module, containing all exposed Rust functions.
#[cfg(feature = "python")]
#[pymodule]
fn cellcast(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ffi::python::ingest_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::python::decode_page_py, m)?)?;

    // --- Expose the custom error type ---
    m.add(
        "CellcastError",
        m.py().get_type_bound::<pyo3::exceptions::PyValueError>(),
    )?;

    // --- Expose version string as a module attribute ---
    m.add("__version__", VERSION)?;

    // --- Turn on logging for inference decisions ---
    m.add_function(wrap_pyfunction!(ffi::python::enable_verbose_logging_py, m)?)?;

    Ok(())
}
