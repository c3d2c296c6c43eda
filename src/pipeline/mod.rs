// In: src/pipeline/mod.rs

//! The end-to-end orchestration layer.
//!
//! `ingest` turns a raw table into column descriptors plus generic cells, ready
//! for one atomic commit. `decode_page` and `decode_row` serve the read side.
//! Columns are processed independently; within a column, values are visited in
//! row order so row indices stay dense.

pub mod store;

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{self, sort_rows};
use crate::config::CastConfig;
use crate::error::CellcastError;
use crate::inference::infer;
use crate::traits::CellStore;
use crate::types::{ColumnDescriptor, Dtype, GenericCell, RawTable, TypedValue};

//==================================================================================
// 1. Ingest
//==================================================================================

/// The bulk result of ingesting one table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestResult {
    pub columns: Vec<ColumnDescriptor>,
    /// Column-major: every cell of column 0 in row order, then column 1, ...
    pub cells: Vec<GenericCell>,
    /// Force-cast failures, keyed by column name. Always present, possibly empty.
    pub errors: BTreeMap<String, String>,
}

impl IngestResult {
    /// Reads back a serialized ingest result.
    ///
    /// Dtype keys are checked before the rest of the document, so a source
    /// written with a dtype this build does not know fails with
    /// `UnsupportedDtypeAtDecode` rather than a generic JSON error.
    pub fn from_json(json: &str) -> Result<Self, CellcastError> {
        let document: Value = serde_json::from_str(json)?;
        let keys = document
            .get("columns")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|column| column.get("dtype").and_then(Value::as_str));
        for key in keys {
            key.parse::<Dtype>()?;
        }
        Ok(serde_json::from_value(document)?)
    }
}

/// Infers and encodes every column of `table`.
///
/// Force-cast failures are non-fatal and land in `errors`. A codec failure
/// aborts the whole ingest, since it means nothing from this table may persist.
pub fn ingest(
    source_id: &str,
    table: &RawTable,
    force_casts: &HashMap<String, String>,
    config: &CastConfig,
) -> Result<IngestResult, CellcastError> {
    let start = Instant::now();

    for name in force_casts.keys() {
        if table.column(name).is_none() {
            warn!(
                "source '{}': force cast for unknown column '{}' ignored",
                source_id, name
            );
        }
    }

    let num_rows = table.num_rows().unwrap_or(0);
    let mut result = IngestResult {
        columns: Vec::with_capacity(table.num_columns()),
        cells: Vec::with_capacity(table.num_columns() * num_rows),
        errors: BTreeMap::new(),
    };

    for (index, (name, raw)) in table.columns().enumerate() {
        let index = u32::try_from(index)
            .map_err(|_| CellcastError::InvalidTable("too many columns".to_string()))?;

        // 1. Infer the column.
        let inference = infer(name, raw, force_casts.get(name).map(String::as_str), config);
        let dtype = inference.column.dtype;
        info!("source '{}': column '{}' -> {} ({})", source_id, name, dtype, dtype.label());

        let error = inference.error.map(|e| e.to_string());
        if let Some(message) = &error {
            result.errors.insert(name.to_string(), message.clone());
        }

        // 2. Encode its cells in row order.
        for (row, value) in inference.column.values.iter().enumerate() {
            result
                .cells
                .push(codec::encode(value, dtype, index, row as u64)?);
        }

        result.columns.push(ColumnDescriptor {
            source_id: source_id.to_string(),
            index,
            name: name.to_string(),
            dtype,
            error,
        });
    }

    info!(
        "source '{}': ingested {} columns x {} rows ({} force-cast errors) in {:?}",
        source_id,
        result.columns.len(),
        num_rows,
        result.errors.len(),
        start.elapsed()
    );
    Ok(result)
}

/// Ingests `table` and commits the result to `store` in one write.
///
/// Returns the per-column force-cast errors. On any failure nothing of this
/// table is visible in the store.
pub fn ingest_into<S: CellStore>(
    store: &mut S,
    source_id: &str,
    table: &RawTable,
    force_casts: &HashMap<String, String>,
    config: &CastConfig,
) -> Result<BTreeMap<String, String>, CellcastError> {
    let IngestResult {
        columns,
        cells,
        errors,
    } = ingest(source_id, table, force_casts, config)?;
    store.commit(source_id, columns, cells)?;
    Ok(errors)
}

//==================================================================================
// 2. Read Side
//==================================================================================

/// What to order a page by.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Original row order.
    #[default]
    RowIndex,
    /// The values of one column, using its dtype's sort key.
    Column(String),
}

impl SortBy {
    /// `"row_index"` selects row order; anything else names a column.
    pub fn parse(s: &str) -> SortBy {
        match s {
            "row_index" => SortBy::RowIndex,
            name => SortBy::Column(name.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub sort_by: SortBy,
    pub ascending: bool,
    pub offset: usize,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            sort_by: SortBy::RowIndex,
            ascending: true,
            offset: 0,
            limit: 10,
        }
    }
}

impl PageRequest {
    /// Builds a request from 1-based page numbering.
    pub fn from_page(
        page: usize,
        page_size: usize,
        sort_by: SortBy,
        ascending: bool,
    ) -> Result<Self, CellcastError> {
        if page == 0 || page_size == 0 {
            return Err(CellcastError::InvalidTable(format!(
                "page ({}) and page_size ({}) must both be at least 1",
                page, page_size
            )));
        }
        let offset = (page - 1).checked_mul(page_size).ok_or_else(|| {
            CellcastError::InvalidTable(format!("page {} is out of range", page))
        })?;
        Ok(Self {
            sort_by,
            ascending,
            offset,
            limit: page_size,
        })
    }
}

/// One decoded row, keyed by column name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedRow {
    pub row_index: u64,
    pub values: BTreeMap<String, TypedValue>,
}

impl DecodedRow {
    pub fn get(&self, column: &str) -> Option<&TypedValue> {
        self.values.get(column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<DecodedRow>,
    pub total_rows: usize,
}

/// The cells of each column, indexed by row.
struct ColumnCells<'a> {
    descriptor: &'a ColumnDescriptor,
    by_row: Vec<&'a GenericCell>,
}

/// Groups `cells` under their columns and checks that every column holds the
/// same dense run of rows `0..N`.
fn group_cells<'a>(
    columns: &'a [ColumnDescriptor],
    cells: &'a [GenericCell],
) -> Result<(Vec<ColumnCells<'a>>, usize), CellcastError> {
    let mut by_column: HashMap<u32, Vec<&GenericCell>> = HashMap::new();
    for cell in cells {
        by_column.entry(cell.column).or_default().push(cell);
    }

    let mut grouped = Vec::with_capacity(columns.len());
    let mut total_rows = None;
    for descriptor in columns {
        let mut by_row = by_column.remove(&descriptor.index).unwrap_or_default();
        by_row.sort_by_key(|cell| cell.row);
        if let Some((position, cell)) = by_row
            .iter()
            .enumerate()
            .find(|(position, cell)| cell.row != *position as u64)
        {
            return Err(CellcastError::CodecInvariantViolation(format!(
                "column '{}' has row {} at position {}; rows must be dense",
                descriptor.name, cell.row, position
            )));
        }
        match total_rows {
            None => total_rows = Some(by_row.len()),
            Some(n) if n != by_row.len() => {
                return Err(CellcastError::CodecInvariantViolation(format!(
                    "column '{}' has {} rows, expected {}",
                    descriptor.name,
                    by_row.len(),
                    n
                )))
            }
            Some(_) => {}
        }
        grouped.push(ColumnCells { descriptor, by_row });
    }

    if let Some(orphan) = by_column.keys().next() {
        return Err(CellcastError::CodecInvariantViolation(format!(
            "cells reference column index {} which has no descriptor",
            orphan
        )));
    }
    Ok((grouped, total_rows.unwrap_or(0)))
}

fn decode_at(grouped: &[ColumnCells<'_>], row: u64) -> Result<DecodedRow, CellcastError> {
    let mut values = BTreeMap::new();
    for column in grouped {
        let cell = column.by_row.get(row as usize).ok_or_else(|| {
            CellcastError::InvalidTable(format!("row {} is out of range", row))
        })?;
        values.insert(
            column.descriptor.name.clone(),
            codec::decode(cell, column.descriptor.dtype)?,
        );
    }
    Ok(DecodedRow {
        row_index: row,
        values,
    })
}

/// Orders, slices and decodes the stored rows of one source.
pub fn decode_page(
    columns: &[ColumnDescriptor],
    cells: &[GenericCell],
    request: &PageRequest,
) -> Result<Page, CellcastError> {
    let (grouped, total_rows) = group_cells(columns, cells)?;

    let order: Vec<u64> = match &request.sort_by {
        SortBy::RowIndex => {
            let rows = 0..total_rows as u64;
            if request.ascending {
                rows.collect()
            } else {
                rows.rev().collect()
            }
        }
        SortBy::Column(name) => {
            let column = grouped
                .iter()
                .find(|c| c.descriptor.name == *name)
                .ok_or_else(|| CellcastError::UnknownColumn(name.clone()))?;
            sort_rows(&column.by_row, column.descriptor.dtype, request.ascending)?
        }
    };

    let rows = order
        .into_iter()
        .skip(request.offset)
        .take(request.limit)
        .map(|row| decode_at(&grouped, row))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        columns: columns.to_vec(),
        rows,
        total_rows,
    })
}

/// Decodes a single row of one source.
pub fn decode_row(
    columns: &[ColumnDescriptor],
    cells: &[GenericCell],
    row: u64,
) -> Result<DecodedRow, CellcastError> {
    let (grouped, _) = group_cells(columns, cells)?;
    decode_at(&grouped, row)
}

#[cfg(test)]
mod tests;
