//! This module contains the pure, stateless kernel for numeric downcasting.
//!
//! Given a sequence of parsed numbers (with `None` marking entries that are not
//! numbers), it selects the narrowest dtype that represents every value exactly:
//! the smallest unsigned integer, else the smallest signed integer, else the
//! smallest float. A bounded number of exceptions demotes the column to float so
//! they can be carried as NaN.

use num_traits::ToPrimitive;

use crate::error::InferenceFailure;
use crate::types::{Dtype, TypedValue};

//==================================================================================
// 1. Parsed Numbers
//==================================================================================

/// One successfully parsed numeric entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// A non-negative integer literal.
    UInt(u64),
    /// A negative integer literal.
    Int(i64),
    /// Anything else that parsed as a float. Never NaN.
    Float(f64),
}

impl Number {
    pub fn from_i64(v: i64) -> Number {
        if v >= 0 {
            Number::UInt(v as u64)
        } else {
            Number::Int(v)
        }
    }

    /// `None` for NaN, which counts as an exception.
    pub fn from_f64(v: f64) -> Option<Number> {
        if v.is_nan() {
            None
        } else {
            Some(Number::Float(v))
        }
    }

    /// The value as an unsigned integer, if it is a non-negative integer.
    fn as_unsigned(&self) -> Option<u64> {
        match *self {
            Number::UInt(v) => Some(v),
            Number::Int(_) => None,
            Number::Float(f) if f.fract() == 0.0 => f.to_u64(),
            Number::Float(_) => None,
        }
    }

    /// The value as a signed integer, if it is an integer within `i64`.
    fn as_signed(&self) -> Option<i64> {
        match *self {
            Number::UInt(v) => v.to_i64(),
            Number::Int(v) => Some(v),
            Number::Float(f) if f.fract() == 0.0 => f.to_i64(),
            Number::Float(_) => None,
        }
    }

    /// The value as an exact integer, if it has no fractional part.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Number::UInt(v) => Some(v as i128),
            Number::Int(v) => Some(v as i128),
            Number::Float(f) if f.fract() == 0.0 => f.to_i128(),
            Number::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::UInt(v) => v as f64,
            Number::Int(v) => v as f64,
            Number::Float(f) => f,
        }
    }
}

/// Parses one text entry. Integer literals are kept exact so values beyond
/// 2^53 survive; anything that is not a number, and NaN, yields `None`.
pub fn parse_number(text: &str) -> Option<Number> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = trimmed.parse::<u64>() {
        return Some(Number::UInt(v));
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(Number::from_i64(v));
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}

//==================================================================================
// 2. Width Selection
//==================================================================================

/// The first dtype in `candidates` whose range holds `[lo, hi]`.
fn narrowest(candidates: &[Dtype], lo: i128, hi: i128) -> Option<Dtype> {
    candidates.iter().copied().find(|dtype| {
        dtype
            .int_range()
            .map_or(false, |(min, max)| lo >= min && hi <= max)
    })
}

/// The smallest unsigned dtype able to hold `max`.
pub fn smallest_unsigned(max: u64) -> Dtype {
    narrowest(&Dtype::UNSIGNED, 0, max as i128).unwrap_or(Dtype::UInt64)
}

/// The smallest signed dtype able to hold `[min, max]`.
pub fn smallest_signed(min: i64, max: i64) -> Dtype {
    narrowest(&Dtype::SIGNED, min as i128, max as i128).unwrap_or(Dtype::Int64)
}

/// `true` when `v` survives a round trip through `f32` unchanged.
pub fn fits_f32(v: f64) -> bool {
    v.is_nan() || (v as f32) as f64 == v
}

//==================================================================================
// 3. Public API
//==================================================================================

/// The outcome of a successful downcast.
#[derive(Debug, Clone, PartialEq)]
pub struct Downcast {
    pub dtype: Dtype,
    pub values: Vec<TypedValue>,
    /// How many entries became NaN.
    pub exceptions: usize,
}

/// Selects the narrowest numeric representation for `numbers`.
///
/// Fails with `NotNumeric` when more than `allowed_exceptions` entries are `None`.
pub fn downcast(
    numbers: &[Option<Number>],
    allowed_exceptions: usize,
) -> Result<Downcast, InferenceFailure> {
    let exceptions = numbers.iter().filter(|n| n.is_none()).count();
    if exceptions > allowed_exceptions {
        return Err(InferenceFailure::NotNumeric {
            exceptions,
            allowed: allowed_exceptions,
        });
    }
    if exceptions > 0 {
        return Ok(to_float(numbers, exceptions));
    }

    // No exceptions from here on, so every entry is `Some`.
    let present = || numbers.iter().flatten();

    if let Some(unsigned) = present().map(Number::as_unsigned).collect::<Option<Vec<u64>>>() {
        let max = unsigned.iter().copied().max().unwrap_or(0);
        return Ok(Downcast {
            dtype: smallest_unsigned(max),
            values: unsigned.into_iter().map(TypedValue::UInt).collect(),
            exceptions: 0,
        });
    }

    if let Some(signed) = present().map(Number::as_signed).collect::<Option<Vec<i64>>>() {
        let min = signed.iter().copied().min().unwrap_or(0);
        let max = signed.iter().copied().max().unwrap_or(0);
        return Ok(Downcast {
            dtype: smallest_signed(min, max),
            values: signed.into_iter().map(TypedValue::Int).collect(),
            exceptions: 0,
        });
    }

    Ok(to_float(numbers, 0))
}

/// Demotes the column to the narrowest float. Exceptions become NaN.
fn to_float(numbers: &[Option<Number>], exceptions: usize) -> Downcast {
    let floats: Vec<f64> = numbers
        .iter()
        .map(|n| n.map_or(f64::NAN, |n| n.as_f64()))
        .collect();
    let dtype = if floats.iter().all(|v| fits_f32(*v)) {
        Dtype::Float32
    } else {
        Dtype::Float64
    };
    Downcast {
        dtype,
        values: floats.into_iter().map(TypedValue::Float).collect(),
        exceptions,
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(items: &[&str]) -> Vec<Option<Number>> {
        items.iter().map(|s| parse_number(s)).collect()
    }

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number(" 42 "), Some(Number::UInt(42)));
        assert_eq!(parse_number("-7"), Some(Number::Int(-7)));
        assert_eq!(parse_number("-0"), Some(Number::UInt(0)));
        assert_eq!(parse_number("2.5"), Some(Number::Float(2.5)));
        assert_eq!(parse_number("1e3"), Some(Number::Float(1000.0)));
        assert_eq!(parse_number("18446744073709551615"), Some(Number::UInt(u64::MAX)));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("x"), None);
    }

    #[test]
    fn test_smallest_unsigned_is_minimal() {
        let result = downcast(&parse_all(&["0", "17", "255"]), 0).unwrap();
        assert_eq!(result.dtype, Dtype::UInt8);
        let result = downcast(&parse_all(&["0", "256"]), 0).unwrap();
        assert_eq!(result.dtype, Dtype::UInt16);
        let result = downcast(&parse_all(&["4294967296"]), 0).unwrap();
        assert_eq!(result.dtype, Dtype::UInt64);
        assert_eq!(result.values, vec![TypedValue::UInt(4294967296)]);
    }

    #[test]
    fn test_one_negative_forces_signed() {
        let result = downcast(&parse_all(&["1", "2", "-1"]), 0).unwrap();
        assert_eq!(result.dtype, Dtype::Int8);
        assert_eq!(result.values[2], TypedValue::Int(-1));

        let result = downcast(&parse_all(&["-129", "5"]), 0).unwrap();
        assert_eq!(result.dtype, Dtype::Int16);
    }

    #[test]
    fn test_one_fraction_forces_float() {
        let result = downcast(&parse_all(&["1", "2", "2.5"]), 0).unwrap();
        assert_eq!(result.dtype, Dtype::Float32);
        assert_eq!(result.values[2], TypedValue::Float(2.5));

        // 0.1 does not survive f32, so the column needs float64.
        let result = downcast(&parse_all(&["1", "0.1"]), 0).unwrap();
        assert_eq!(result.dtype, Dtype::Float64);
    }

    #[test]
    fn test_integral_floats_count_as_integers() {
        let result = downcast(&parse_all(&["1.0", "2", "3e2"]), 0).unwrap();
        assert_eq!(result.dtype, Dtype::UInt16);
        assert_eq!(result.values[2], TypedValue::UInt(300));
    }

    #[test]
    fn test_u64_beyond_i64_with_negative_falls_to_float() {
        let result = downcast(&parse_all(&["18446744073709551615", "-1"]), 0).unwrap();
        assert!(result.dtype.is_float());
        assert_eq!(result.values[1], TypedValue::Float(-1.0));
    }

    #[test]
    fn test_exceptions_within_tolerance_become_nan() {
        let result = downcast(&parse_all(&["1", "2", "x", "4", "5"]), 2).unwrap();
        assert_eq!(result.dtype, Dtype::Float32);
        assert_eq!(result.exceptions, 1);
        assert!(matches!(result.values[2], TypedValue::Float(v) if v.is_nan()));
        assert_eq!(result.values[4], TypedValue::Float(5.0));
    }

    #[test]
    fn test_tolerance_boundary() {
        let at_limit = parse_all(&["1", "a", "b", "4"]);
        assert!(downcast(&at_limit, 2).is_ok());

        let over_limit = parse_all(&["1", "a", "b", "c"]);
        assert_eq!(
            downcast(&over_limit, 2).unwrap_err(),
            InferenceFailure::NotNumeric {
                exceptions: 3,
                allowed: 2
            }
        );
    }

    #[test]
    fn test_empty_input_is_uint8() {
        let result = downcast(&[], 0).unwrap();
        assert_eq!(result.dtype, Dtype::UInt8);
        assert!(result.values.is_empty());
    }
}
