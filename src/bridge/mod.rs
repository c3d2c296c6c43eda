// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the boundary between Arrow data produced by a file parser and
// the pure, Arrow-agnostic inference `pipeline`.
//
// Data Flow (Ingest):
//
//   1. [Stateless API (ingest_record_batch)] -> Receives `&RecordBatch`
//         |
//         `-> a. Calls `arrow_impl` to convert every `&dyn Array` -> `RawColumn`
//         |
//         `-> b. Calls `pipeline::ingest` with the assembled `RawTable`
//
//   2. [Pipeline Engine (pipeline::ingest)] -> Returns `Result<IngestResult>`
//
// Integer, unsigned, float and non-null boolean arrays arrive already typed and
// take the passthrough path of the cascade. Strings arrive as text. Every other
// Arrow type is cast to UTF-8 first and inferred like text.
//
// ====================================================================================
pub(crate) mod arrow_impl;
pub mod stateless_api;

// --- Low-Level Stateless API (for FFI and testing) ---
pub use arrow_impl::raw_table_from_batch;
pub use stateless_api::ingest_record_batch;

#[cfg(test)]
mod tests;
