// In: src/ffi/python.rs

use std::collections::HashMap;

use arrow::pyarrow::PyArrowType;
use arrow::record_batch::RecordBatch;
use log::LevelFilter;
use pyo3::prelude::*;

use crate::bridge::ingest_record_batch;
use crate::config::CastConfig;
use crate::error::CellcastError;
use crate::observability;
use crate::pipeline::{self, IngestResult, PageRequest, SortBy};

fn parse_config(config_json: Option<&str>) -> Result<CastConfig, CellcastError> {
    match config_json {
        Some(json) => CastConfig::from_json(json),
        None => Ok(CastConfig::default()),
    }
}

//==================================================================================
// I. Ingest
//==================================================================================

/// Infers and encodes a `pyarrow.RecordBatch`.
///
/// Returns the ingest result as a JSON document: `columns`, `cells` and the
/// per-column `errors` map. Force-cast failures never raise.
#[pyfunction]
#[pyo3(name = "ingest", signature = (source_id, table, force_casts = None, config_json = None))]
pub fn ingest_py(
    py: Python<'_>,
    source_id: &str,
    table: PyArrowType<RecordBatch>,
    force_casts: Option<HashMap<String, String>>,
    config_json: Option<&str>,
) -> PyResult<String> {
    let config = parse_config(config_json)?;
    let force_casts = force_casts.unwrap_or_default();
    let batch = table.0;

    let result = py.allow_threads(|| {
        ingest_record_batch(source_id, &batch, &force_casts, &config)
    })?;
    Ok(serde_json::to_string(&result).map_err(CellcastError::from)?)
}

//==================================================================================
// II. Read Side
//==================================================================================

/// Decodes one page of a JSON ingest result, as produced by `ingest`.
#[pyfunction]
#[pyo3(
    name = "decode_page",
    signature = (ingest_json, sort_by = "row_index", asc = true, page = 1, page_size = 10)
)]
pub fn decode_page_py(
    ingest_json: &str,
    sort_by: &str,
    asc: bool,
    page: usize,
    page_size: usize,
) -> PyResult<String> {
    let stored = IngestResult::from_json(ingest_json)?;
    let request = PageRequest::from_page(page, page_size, SortBy::parse(sort_by), asc)?;
    let page = pipeline::decode_page(&stored.columns, &stored.cells, &request)?;
    Ok(serde_json::to_string(&page).map_err(CellcastError::from)?)
}

//==================================================================================
// III. Logging
//==================================================================================

/// Turns on `info`-level logging, optionally appending to `log_file`.
#[pyfunction]
#[pyo3(name = "enable_verbose_logging", signature = (log_file = None))]
pub fn enable_verbose_logging_py(log_file: Option<String>) -> PyResult<()> {
    observability::init_logging(LevelFilter::Info, log_file.as_deref())?;
    Ok(())
}
