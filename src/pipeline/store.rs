//! An in-memory `CellStore`.
//!
//! Validates a whole write before touching the map, so a rejected commit leaves
//! the previous contents of the source in place.

use hashbrown::{HashMap, HashSet};
use log::debug;

use crate::codec::validate_cell;
use crate::error::CellcastError;
use crate::traits::{CellStore, StoredSource};
use crate::types::{ColumnDescriptor, Dtype, GenericCell};

#[derive(Debug, Default)]
pub struct MemoryStore {
    sources: HashMap<String, StoredSource>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn rejected(source_id: &str, reason: String) -> CellcastError {
    CellcastError::BulkCommitFailed(format!("source '{}': {}", source_id, reason))
}

/// Checks descriptor uniqueness, slot population and row density.
fn check_write(
    source_id: &str,
    columns: &[ColumnDescriptor],
    cells: &[GenericCell],
) -> Result<(), CellcastError> {
    let mut dtypes: HashMap<u32, Dtype> = HashMap::with_capacity(columns.len());
    let mut names: HashSet<&str> = HashSet::with_capacity(columns.len());
    for column in columns {
        if column.source_id != source_id {
            return Err(rejected(
                source_id,
                format!("column '{}' belongs to '{}'", column.name, column.source_id),
            ));
        }
        if dtypes.insert(column.index, column.dtype).is_some() {
            return Err(rejected(source_id, format!("duplicate column index {}", column.index)));
        }
        if !names.insert(column.name.as_str()) {
            return Err(rejected(source_id, format!("duplicate column name '{}'", column.name)));
        }
    }

    let mut rows_seen: HashMap<u32, HashSet<u64>> = HashMap::with_capacity(columns.len());
    for cell in cells {
        let dtype = *dtypes.get(&cell.column).ok_or_else(|| {
            rejected(source_id, format!("cell for unknown column index {}", cell.column))
        })?;
        validate_cell(cell, dtype).map_err(|e| rejected(source_id, e.to_string()))?;
        if !rows_seen.entry(cell.column).or_default().insert(cell.row) {
            return Err(rejected(
                source_id,
                format!("duplicate cell (column {}, row {})", cell.column, cell.row),
            ));
        }
    }

    let mut expected_rows = None;
    for column in columns {
        let rows = rows_seen.get(&column.index).map_or(0, HashSet::len);
        // Unique rows, so a dense run 0..N has N as its length and N - 1 as its max.
        let max_row = rows_seen
            .get(&column.index)
            .and_then(|set| set.iter().max().copied());
        if max_row.map_or(false, |max| max.checked_add(1) != Some(rows as u64)) {
            return Err(rejected(source_id, format!("rows of column '{}' are not dense", column.name)));
        }
        match expected_rows {
            None => expected_rows = Some(rows),
            Some(n) if n != rows => {
                return Err(rejected(
                    source_id,
                    format!("column '{}' has {} rows, expected {}", column.name, rows, n),
                ))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

impl CellStore for MemoryStore {
    fn commit(
        &mut self,
        source_id: &str,
        columns: Vec<ColumnDescriptor>,
        cells: Vec<GenericCell>,
    ) -> Result<(), CellcastError> {
        check_write(source_id, &columns, &cells)?;
        debug!(
            "source '{}': committing {} columns, {} cells",
            source_id,
            columns.len(),
            cells.len()
        );
        self.sources
            .insert(source_id.to_string(), StoredSource { columns, cells });
        Ok(())
    }

    fn load(&self, source_id: &str) -> Option<&StoredSource> {
        self.sources.get(source_id)
    }

    fn remove(&mut self, source_id: &str) -> bool {
        self.sources.remove(source_id).is_some()
    }
}
