// In: src/codec/mod.rs

//! The generic value codec.
//!
//! Maps a `TypedValue` to the fixed slot set of a `GenericCell` and back. Every
//! branch matches `Dtype` exhaustively, so a new dtype cannot reach storage
//! without a rule here. `encode` and `decode` are exact inverses:
//!
//! | dtype            | slots                                 |
//! |------------------|---------------------------------------|
//! | text, category   | `text`                                |
//! | bool             | `bool`                                |
//! | uintN            | `magnitude_uint64`                    |
//! | intN             | `magnitude_uint64`, `signed_int16`    |
//! | float32/64       | `float64_a`                           |
//! | complex128       | `float64_a` (re), `float64_b` (im)    |
//! | datetime         | `datetime64`                          |
//! | duration         | `magnitude_uint64` (nanoseconds)      |

pub mod sort_key;

pub use sort_key::{sort_key, sort_rows, Combination, SortKey, SortValue};

use chrono::Duration;
use log::error;
use num_complex::Complex64;

use crate::error::CellcastError;
use crate::kernels::downcast::fits_f32;
use crate::types::{Dtype, GenericCell, Slot, TypedValue};

//==================================================================================
// 1. Invariant Checks
//==================================================================================

/// Logs and builds a `CodecInvariantViolation`.
fn violation(message: String) -> CellcastError {
    error!("codec invariant violated: {}", message);
    CellcastError::CodecInvariantViolation(message)
}

fn mismatch(value: &TypedValue, dtype: Dtype) -> CellcastError {
    violation(format!("a {} value cannot be stored as {}", value.kind(), dtype))
}

fn out_of_range(value: i128, dtype: Dtype) -> CellcastError {
    violation(format!("{} is out of range for {}", value, dtype))
}

/// Checks that `cell` populates exactly the significant slots of `dtype`.
pub fn validate_cell(cell: &GenericCell, dtype: Dtype) -> Result<(), CellcastError> {
    let expected = dtype.significant_slots();
    let populated = cell.populated_slots();
    if populated == expected {
        return Ok(());
    }
    Err(violation(format!(
        "cell (column {}, row {}) of dtype {} populates {} but must populate exactly {} \
         (missing {}, unexpected {})",
        cell.column,
        cell.row,
        dtype,
        populated,
        expected,
        expected.difference(populated),
        populated.difference(expected),
    )))
}

fn check_range(value: i128, dtype: Dtype) -> Result<(), CellcastError> {
    match dtype.int_range() {
        Some((min, max)) if value >= min && value <= max => Ok(()),
        _ => Err(out_of_range(value, dtype)),
    }
}

//==================================================================================
// 2. Encode
//==================================================================================

/// Encodes one typed value as the generic cell at `(column, row)`.
pub fn encode(
    value: &TypedValue,
    dtype: Dtype,
    column: u32,
    row: u64,
) -> Result<GenericCell, CellcastError> {
    let mut cell = GenericCell::new(column, row);

    match dtype {
        Dtype::Text | Dtype::Category => {
            let TypedValue::Text(s) = value else {
                return Err(mismatch(value, dtype));
            };
            cell.text = Some(s.clone());
        }
        Dtype::Bool => {
            let TypedValue::Bool(b) = value else {
                return Err(mismatch(value, dtype));
            };
            cell.bool = Some(*b);
        }
        Dtype::UInt8 | Dtype::UInt16 | Dtype::UInt32 | Dtype::UInt64 => {
            let TypedValue::UInt(v) = value else {
                return Err(mismatch(value, dtype));
            };
            check_range(i128::from(*v), dtype)?;
            cell.magnitude_uint64 = Some(*v);
        }
        Dtype::Int8 | Dtype::Int16 | Dtype::Int32 | Dtype::Int64 => {
            let TypedValue::Int(v) = value else {
                return Err(mismatch(value, dtype));
            };
            check_range(i128::from(*v), dtype)?;
            cell.magnitude_uint64 = Some(v.unsigned_abs());
            cell.signed_int16 = Some(if *v < 0 { -1 } else { 1 });
        }
        Dtype::Float32 | Dtype::Float64 => {
            let TypedValue::Float(f) = value else {
                return Err(mismatch(value, dtype));
            };
            if dtype == Dtype::Float32 && !fits_f32(*f) {
                return Err(violation(format!("{} is not representable as float32", f)));
            }
            cell.float64_a = Some(if f.is_nan() { f64::NAN } else { *f });
        }
        Dtype::Complex128 => {
            let TypedValue::Complex(z) = value else {
                return Err(mismatch(value, dtype));
            };
            cell.float64_a = Some(z.re);
            cell.float64_b = Some(z.im);
        }
        Dtype::DateTime => {
            let TypedValue::DateTime(dt) = value else {
                return Err(mismatch(value, dtype));
            };
            cell.datetime64 = Some(*dt);
        }
        Dtype::Duration => {
            let TypedValue::Duration(d) = value else {
                return Err(mismatch(value, dtype));
            };
            let nanos = d
                .num_nanoseconds()
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| violation(format!("duration {} is negative or too long", d)))?;
            cell.magnitude_uint64 = Some(nanos);
        }
    }

    validate_cell(&cell, dtype)?;
    Ok(cell)
}

//==================================================================================
// 3. Decode
//==================================================================================

/// Reads a significant slot that `validate_cell` has already vouched for.
fn slot<T>(value: Option<T>, slot: Slot, dtype: Dtype) -> Result<T, CellcastError> {
    value.ok_or_else(|| {
        CellcastError::InternalError(format!(
            "slot {} of a validated {} cell is null",
            slot.column_name(),
            dtype
        ))
    })
}

/// Decodes a generic cell back into the typed value of its column's dtype.
pub fn decode(cell: &GenericCell, dtype: Dtype) -> Result<TypedValue, CellcastError> {
    validate_cell(cell, dtype)?;

    let value = match dtype {
        Dtype::Text | Dtype::Category => {
            TypedValue::Text(slot(cell.text.clone(), Slot::Text, dtype)?)
        }
        Dtype::Bool => TypedValue::Bool(slot(cell.bool, Slot::Bool, dtype)?),
        Dtype::UInt8 | Dtype::UInt16 | Dtype::UInt32 | Dtype::UInt64 => {
            let magnitude = slot(cell.magnitude_uint64, Slot::MagnitudeUInt64, dtype)?;
            check_range(i128::from(magnitude), dtype)?;
            TypedValue::UInt(magnitude)
        }
        Dtype::Int8 | Dtype::Int16 | Dtype::Int32 | Dtype::Int64 => {
            let magnitude = slot(cell.magnitude_uint64, Slot::MagnitudeUInt64, dtype)?;
            let sign = slot(cell.signed_int16, Slot::SignedInt16, dtype)?;
            if sign != 1 && sign != -1 {
                return Err(violation(format!("sign slot holds {}, expected +1 or -1", sign)));
            }
            let product = i128::from(sign) * i128::from(magnitude);
            check_range(product, dtype)?;
            // Range checked above.
            TypedValue::Int(product as i64)
        }
        Dtype::Float32 | Dtype::Float64 => {
            TypedValue::Float(slot(cell.float64_a, Slot::Float64A, dtype)?)
        }
        Dtype::Complex128 => TypedValue::Complex(Complex64::new(
            slot(cell.float64_a, Slot::Float64A, dtype)?,
            slot(cell.float64_b, Slot::Float64B, dtype)?,
        )),
        Dtype::DateTime => TypedValue::DateTime(slot(cell.datetime64, Slot::DateTime64, dtype)?),
        Dtype::Duration => {
            let nanos = slot(cell.magnitude_uint64, Slot::MagnitudeUInt64, dtype)?;
            let nanos = i64::try_from(nanos)
                .map_err(|_| violation(format!("{} ns overflows a duration", nanos)))?;
            TypedValue::Duration(Duration::nanoseconds(nanos))
        }
    };
    Ok(value)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
