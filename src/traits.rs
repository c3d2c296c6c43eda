// In: src/traits.rs

//! Defines the persistence seam between the pipeline and the relational store.
//!
//! The store itself lives outside this crate. The pipeline only needs two things
//! from it: an all-or-nothing write of a whole source, and a read of everything
//! one source holds.

use crate::error::CellcastError;
use crate::types::{ColumnDescriptor, GenericCell};

/// Everything persisted for one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredSource {
    pub columns: Vec<ColumnDescriptor>,
    pub cells: Vec<GenericCell>,
}

/// A store of ingested sources.
///
/// Implementations must make `commit` atomic: on `Err` the previous contents of
/// `source_id` (if any) remain visible and nothing of the new write does.
pub trait CellStore {
    /// Replaces the whole of `source_id` with `columns` and `cells`.
    /// Fails with `BulkCommitFailed`.
    fn commit(
        &mut self,
        source_id: &str,
        columns: Vec<ColumnDescriptor>,
        cells: Vec<GenericCell>,
    ) -> Result<(), CellcastError>;

    /// Everything stored for `source_id`, or `None` if it was never committed.
    fn load(&self, source_id: &str) -> Option<&StoredSource>;

    /// Removes a source together with its cells. Returns whether it existed.
    fn remove(&mut self, source_id: &str) -> bool;
}
