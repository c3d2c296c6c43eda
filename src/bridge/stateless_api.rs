// In: src/bridge/stateless_api.rs

use std::collections::HashMap;

use arrow::record_batch::RecordBatch;

use crate::bridge::arrow_impl;
use crate::config::CastConfig;
use crate::error::CellcastError;
use crate::pipeline::{self, IngestResult};

/// Ingests one Arrow record batch as the source `source_id`.
pub fn ingest_record_batch(
    source_id: &str,
    batch: &RecordBatch,
    force_casts: &HashMap<String, String>,
    config: &CastConfig,
) -> Result<IngestResult, CellcastError> {
    // 1. Marshal the data from the Arrow world into our pure internal format.
    let table = arrow_impl::raw_table_from_batch(batch)?;

    // 2. Call the pure pipeline engine.
    pipeline::ingest(source_id, &table, force_casts, config)
}
