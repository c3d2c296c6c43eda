//! This module defines the core, strongly-typed data representations used
//! throughout cellcast.
//!
//! It includes the canonical `Dtype` registry, which replaces string-valued type
//! names with a closed, serializable enum, the typed and generic cell forms, and
//! the raw tabular input.

pub mod cell;
pub mod dtype;
pub mod raw;
pub mod value;

// Re-export the main type(s) for easier access.
pub use cell::{ColumnDescriptor, GenericCell};
pub use dtype::{Dtype, DtypeInfo, Slot, SlotSet, REGISTRY};
pub use raw::{RawColumn, RawTable};
pub use value::TypedValue;
