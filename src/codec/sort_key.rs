//! Per-dtype ordering of generic cells.
//!
//! A `SortKey` names the slots a dtype sorts on and how they combine into one
//! comparable `SortValue`. Orders are scoped to a single column; values of
//! different kinds are never compared in practice.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::error::CellcastError;
use crate::types::{Dtype, GenericCell, Slot};

/// How the key slots combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combination {
    /// The single significant slot, compared as stored.
    Direct,
    /// `sign * magnitude`, reconstructed before comparing.
    SignedProduct,
    /// `sqrt(re^2 + im^2)`. Values of equal modulus tie.
    EuclideanMagnitude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub slots: &'static [Slot],
    pub combination: Combination,
}

/// Resolves the sort key of `dtype`.
pub fn sort_key(dtype: Dtype) -> SortKey {
    let (slots, combination): (&'static [Slot], Combination) = match dtype {
        Dtype::Text | Dtype::Category => (&[Slot::Text], Combination::Direct),
        Dtype::Bool => (&[Slot::Bool], Combination::Direct),
        Dtype::UInt8 | Dtype::UInt16 | Dtype::UInt32 | Dtype::UInt64 | Dtype::Duration => {
            (&[Slot::MagnitudeUInt64], Combination::Direct)
        }
        Dtype::Int8 | Dtype::Int16 | Dtype::Int32 | Dtype::Int64 => (
            &[Slot::SignedInt16, Slot::MagnitudeUInt64],
            Combination::SignedProduct,
        ),
        Dtype::Float32 | Dtype::Float64 => (&[Slot::Float64A], Combination::Direct),
        Dtype::Complex128 => (
            &[Slot::Float64A, Slot::Float64B],
            Combination::EuclideanMagnitude,
        ),
        Dtype::DateTime => (&[Slot::DateTime64], Combination::Direct),
    };
    SortKey { slots, combination }
}

/// A comparable value derived from a cell.
#[derive(Debug, Clone)]
pub enum SortValue {
    Text(String),
    Bool(bool),
    Unsigned(u64),
    Signed(i128),
    /// NaN of either sign sorts after every number; the rest compare with
    /// `f64::total_cmp`.
    Float(f64),
    Instant(DateTime<Utc>),
}

impl SortValue {
    fn rank(&self) -> u8 {
        match self {
            SortValue::Text(_) => 0,
            SortValue::Bool(_) => 1,
            SortValue::Unsigned(_) => 2,
            SortValue::Signed(_) => 3,
            SortValue::Float(_) => 4,
            SortValue::Instant(_) => 5,
        }
    }
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Bool(a), SortValue::Bool(b)) => a.cmp(b),
            (SortValue::Unsigned(a), SortValue::Unsigned(b)) => a.cmp(b),
            (SortValue::Signed(a), SortValue::Signed(b)) => a.cmp(b),
            (SortValue::Float(a), SortValue::Float(b)) => match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => a.total_cmp(b),
            },
            (SortValue::Instant(a), SortValue::Instant(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortValue {}

fn null_slot(cell: &GenericCell, slot: Slot) -> CellcastError {
    CellcastError::CodecInvariantViolation(format!(
        "cell (column {}, row {}) has no {} slot to sort on",
        cell.column,
        cell.row,
        slot.column_name()
    ))
}

fn need<T>(cell: &GenericCell, value: Option<T>, slot: Slot) -> Result<T, CellcastError> {
    value.ok_or_else(|| null_slot(cell, slot))
}

impl SortKey {
    /// Derives the comparable value of `cell`.
    pub fn value_of(&self, cell: &GenericCell) -> Result<SortValue, CellcastError> {
        let value = match (self.combination, self.slots) {
            (Combination::SignedProduct, _) => {
                let sign = need(cell, cell.signed_int16, Slot::SignedInt16)?;
                let magnitude = need(cell, cell.magnitude_uint64, Slot::MagnitudeUInt64)?;
                SortValue::Signed(i128::from(sign.signum()) * i128::from(magnitude))
            }
            (Combination::EuclideanMagnitude, _) => {
                let re = need(cell, cell.float64_a, Slot::Float64A)?;
                let im = need(cell, cell.float64_b, Slot::Float64B)?;
                SortValue::Float(re.hypot(im))
            }
            (Combination::Direct, [slot]) => match slot {
                Slot::Text => SortValue::Text(need(cell, cell.text.clone(), Slot::Text)?),
                Slot::Bool => SortValue::Bool(need(cell, cell.bool, Slot::Bool)?),
                Slot::MagnitudeUInt64 => {
                    SortValue::Unsigned(need(cell, cell.magnitude_uint64, Slot::MagnitudeUInt64)?)
                }
                Slot::Float64A => SortValue::Float(need(cell, cell.float64_a, Slot::Float64A)?),
                Slot::Float64B => SortValue::Float(need(cell, cell.float64_b, Slot::Float64B)?),
                Slot::DateTime64 => SortValue::Instant(need(cell, cell.datetime64, Slot::DateTime64)?),
                Slot::SignedInt16 => {
                    SortValue::Signed(i128::from(need(cell, cell.signed_int16, Slot::SignedInt16)?))
                }
            },
            (Combination::Direct, slots) => {
                return Err(CellcastError::InternalError(format!(
                    "direct sort key over {} slots",
                    slots.len()
                )))
            }
        };
        Ok(value)
    }
}

/// Orders the cells of one column and returns their row indices.
///
/// Ties keep ascending row order in both directions.
pub fn sort_rows(
    cells: &[&GenericCell],
    dtype: Dtype,
    ascending: bool,
) -> Result<Vec<u64>, CellcastError> {
    let key = sort_key(dtype);
    let mut keyed = cells
        .iter()
        .map(|cell| Ok((key.value_of(cell)?, cell.row)))
        .collect::<Result<Vec<(SortValue, u64)>, CellcastError>>()?;

    keyed.sort_by(|(a, row_a), (b, row_b)| {
        let by_value = if ascending { a.cmp(b) } else { b.cmp(a) };
        by_value.then(row_a.cmp(row_b))
    });
    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::types::TypedValue;
    use num_complex::Complex64;

    fn signed_cell(row: u64, magnitude: u64, sign: i16) -> GenericCell {
        GenericCell {
            signed_int16: Some(sign),
            magnitude_uint64: Some(magnitude),
            ..GenericCell::new(0, row)
        }
    }

    #[test]
    fn test_signed_product_order() {
        let cells = [signed_cell(0, 5, -1), signed_cell(1, 5, 1), signed_cell(2, 3, -1)];
        let refs: Vec<&GenericCell> = cells.iter().collect();
        assert_eq!(sort_rows(&refs, Dtype::Int8, true).unwrap(), vec![0, 2, 1]);
        assert_eq!(sort_rows(&refs, Dtype::Int8, false).unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn test_complex_magnitude_order() {
        let cells: Vec<GenericCell> = [Complex64::new(3.0, 4.0), Complex64::new(1.0, 1.0)]
            .iter()
            .enumerate()
            .map(|(row, z)| encode(&TypedValue::Complex(*z), Dtype::Complex128, 0, row as u64).unwrap())
            .collect();
        let refs: Vec<&GenericCell> = cells.iter().collect();
        assert_eq!(sort_rows(&refs, Dtype::Complex128, true).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_ties_keep_row_order() {
        let cells: Vec<GenericCell> = [Complex64::new(3.0, 4.0), Complex64::new(0.0, 1.0), Complex64::new(5.0, 0.0)]
            .iter()
            .enumerate()
            .map(|(row, z)| encode(&TypedValue::Complex(*z), Dtype::Complex128, 0, row as u64).unwrap())
            .collect();
        let refs: Vec<&GenericCell> = cells.iter().collect();
        assert_eq!(sort_rows(&refs, Dtype::Complex128, true).unwrap(), vec![1, 0, 2]);
        assert_eq!(sort_rows(&refs, Dtype::Complex128, false).unwrap(), vec![0, 2, 1]);
    }

    #[test]
    fn test_nan_sorts_last_ascending() {
        let cells: Vec<GenericCell> = [2.0, f64::NAN, -1.0]
            .iter()
            .enumerate()
            .map(|(row, f)| encode(&TypedValue::Float(*f), Dtype::Float64, 0, row as u64).unwrap())
            .collect();
        let refs: Vec<&GenericCell> = cells.iter().collect();
        assert_eq!(sort_rows(&refs, Dtype::Float64, true).unwrap(), vec![2, 0, 1]);
    }

    #[test]
    fn test_negative_nan_sorts_last_ascending() {
        let mut cells: Vec<GenericCell> = [2.0, f64::NAN, 1.0]
            .iter()
            .enumerate()
            .map(|(row, f)| encode(&TypedValue::Float(*f), Dtype::Float64, 0, row as u64).unwrap())
            .collect();
        // A stored cell may still carry the sign bit.
        cells[1].float64_a = Some(-f64::NAN);
        let refs: Vec<&GenericCell> = cells.iter().collect();
        assert_eq!(sort_rows(&refs, Dtype::Float64, true).unwrap(), vec![2, 0, 1]);
        assert_eq!(sort_rows(&refs, Dtype::Float64, false).unwrap(), vec![1, 0, 2]);
    }

    #[test]
    fn test_every_dtype_sorts_on_significant_slots() {
        for info in crate::types::REGISTRY.iter() {
            let key = sort_key(info.dtype);
            for slot in key.slots {
                assert!(info.significant.contains(*slot), "{} sorts on {:?}", info.key, slot);
            }
        }
    }

    #[test]
    fn test_null_slot_is_an_error() {
        let cell = GenericCell::new(0, 0);
        assert!(sort_key(Dtype::Text).value_of(&cell).is_err());
    }
}
