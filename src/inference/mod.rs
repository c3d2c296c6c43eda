//! The type inference cascade.
//!
//! Every column is inferred on its own, with no state shared between columns:
//!
//!   1. [Force cast]      -> a caller directive is tried first; a failure is recorded
//!         |                 and inference continues automatically.
//!   2. [Typed passthrough] -> machine integers/floats are downcast, booleans kept.
//!         |
//!   3. [Text cascade]    -> numeric -> complex -> category -> duration -> datetime,
//!                           first success wins, otherwise the column stays `text`.
//!
//! Each stage returns `Result<TypedColumn, InferenceFailure>`; moving on to the
//! next candidate is an explicit branch on that result.

pub mod cascade;
mod category;
pub mod force_cast;

pub use cascade::{infer, Inference};
pub use force_cast::ForceCast;

use crate::types::{Dtype, RawColumn, TypedValue};

/// A column after inference: one dtype and one typed value per row, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedColumn {
    pub dtype: Dtype,
    pub values: Vec<TypedValue>,
}

impl TypedColumn {
    pub fn new(dtype: Dtype, values: Vec<TypedValue>) -> Self {
        Self { dtype, values }
    }

    /// A text (or category) column. Missing cells become the empty string.
    pub(crate) fn from_text(dtype: Dtype, values: &[Option<String>]) -> Self {
        let values = values
            .iter()
            .map(|v| TypedValue::Text(v.clone().unwrap_or_default()))
            .collect();
        Self { dtype, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Hands the column back in raw form, as a parser would have produced it.
    /// Numbers and booleans stay typed; everything else is rendered as text.
    pub fn to_raw(&self) -> RawColumn {
        let mut uints = Vec::new();
        let mut ints = Vec::new();
        let mut floats = Vec::new();
        let mut bools = Vec::new();
        let mut texts = Vec::new();
        for value in &self.values {
            match value {
                TypedValue::UInt(v) => uints.push(Some(*v)),
                TypedValue::Int(v) => ints.push(Some(*v)),
                TypedValue::Float(v) => floats.push(Some(*v)),
                TypedValue::Bool(v) => bools.push(*v),
                other => texts.push(Some(other.to_string())),
            }
        }
        match self.dtype {
            d if d.is_unsigned_int() => RawColumn::UInt(uints),
            d if d.is_signed_int() => RawColumn::Int(ints),
            d if d.is_float() => RawColumn::Float(floats),
            Dtype::Bool => RawColumn::Bool(bools),
            _ => RawColumn::Text(texts),
        }
    }
}
