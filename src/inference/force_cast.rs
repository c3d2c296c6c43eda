//! Caller-requested conversions.
//!
//! A force cast is strict: every row must convert, or the whole directive fails
//! with a human-readable reason. Integers must be integral and in range, so
//! `"300"` does not fit `int8`. Float targets accept missing cells as NaN.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use num_complex::Complex64;

use super::TypedColumn;
use crate::config::CastConfig;
use crate::kernels::{
    parse_bool, parse_complex, parse_datetime, parse_datetime_with_format, parse_duration,
    parse_number,
};
use crate::types::{Dtype, RawColumn, TypedValue};

/// A parsed force-cast directive.
#[derive(Debug, Clone, PartialEq)]
pub enum ForceCast {
    /// One of the eight integer dtypes.
    Integer(Dtype),
    /// `float32` or `float64`.
    Float(Dtype),
    Category,
    Complex,
    Text,
    Bool,
    Duration,
    /// `datetime` or `datetime(<chrono format>)`.
    DateTime { format: Option<String> },
}

impl FromStr for ForceCast {
    type Err = String;

    fn from_str(directive: &str) -> Result<Self, Self::Err> {
        let s = directive.trim();
        // The keyword is case-insensitive; the chrono format keeps its case.
        const DATETIME_OPEN: &str = "datetime(";
        let format = s
            .get(..DATETIME_OPEN.len())
            .filter(|head| head.eq_ignore_ascii_case(DATETIME_OPEN))
            .and_then(|_| s[DATETIME_OPEN.len()..].strip_suffix(')'));
        if let Some(format) = format {
            if format.is_empty() {
                return Err(format!("force casting to {} not supported", directive));
            }
            return Ok(ForceCast::DateTime {
                format: Some(format.to_string()),
            });
        }

        let cast = match s.to_ascii_lowercase().as_str() {
            "uint" => ForceCast::Integer(Dtype::UInt32),
            "int" => ForceCast::Integer(Dtype::Int64),
            "float" => ForceCast::Float(Dtype::Float64),
            "category" => ForceCast::Category,
            "complex" | "complex128" => ForceCast::Complex,
            "object" | "text" => ForceCast::Text,
            "bool" => ForceCast::Bool,
            "timedelta" | "duration" => ForceCast::Duration,
            "datetime" => ForceCast::DateTime { format: None },
            other => match other.parse::<Dtype>() {
                Ok(d) if d.is_unsigned_int() || d.is_signed_int() => ForceCast::Integer(d),
                Ok(d) if d.is_float() => ForceCast::Float(d),
                _ => return Err(format!("force casting to {} not supported", directive)),
            },
        };
        Ok(cast)
    }
}

impl fmt::Display for ForceCast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForceCast::DateTime {
                format: Some(format),
            } => write!(f, "datetime({})", format),
            other => write!(f, "{}", other.target()),
        }
    }
}

impl ForceCast {
    /// The dtype a successful cast produces.
    pub fn target(&self) -> Dtype {
        match self {
            ForceCast::Integer(d) | ForceCast::Float(d) => *d,
            ForceCast::Category => Dtype::Category,
            ForceCast::Complex => Dtype::Complex128,
            ForceCast::Text => Dtype::Text,
            ForceCast::Bool => Dtype::Bool,
            ForceCast::Duration => Dtype::Duration,
            ForceCast::DateTime { .. } => Dtype::DateTime,
        }
    }

    /// Converts every row of `raw`, or explains the first row that would not.
    pub fn apply(&self, raw: &RawColumn, config: &CastConfig) -> Result<TypedColumn, String> {
        let target = self.target();
        let values = match self {
            ForceCast::Integer(dtype) => to_integers(raw, *dtype)?,
            ForceCast::Float(dtype) => to_floats(raw, *dtype)?,
            ForceCast::Category | ForceCast::Text => {
                return Ok(TypedColumn::from_text(target, &raw.to_text()));
            }
            ForceCast::Complex => to_complex(raw)?,
            ForceCast::Bool => to_bools(raw)?,
            ForceCast::Duration => to_durations(raw)?,
            ForceCast::DateTime { format } => to_datetimes(raw, format.as_deref(), config)?,
        };
        Ok(TypedColumn::new(target, values))
    }
}

//==================================================================================
// Per-target converters
//==================================================================================

fn missing(row: usize) -> String {
    format!("row {} is missing", row)
}

fn to_integers(raw: &RawColumn, dtype: Dtype) -> Result<Vec<TypedValue>, String> {
    let (min, max) = dtype
        .int_range()
        .ok_or_else(|| format!("{} is not an integer dtype", dtype))?;

    let integers: Vec<i128> = match raw {
        RawColumn::Int(v) => v
            .iter()
            .enumerate()
            .map(|(row, x)| x.map(i128::from).ok_or_else(|| missing(row)))
            .collect::<Result<_, _>>()?,
        RawColumn::UInt(v) => v
            .iter()
            .enumerate()
            .map(|(row, x)| x.map(i128::from).ok_or_else(|| missing(row)))
            .collect::<Result<_, _>>()?,
        RawColumn::Bool(v) => v.iter().map(|&b| i128::from(b)).collect(),
        RawColumn::Float(v) => v
            .iter()
            .enumerate()
            .map(|(row, x)| {
                let x = x.filter(|f| !f.is_nan()).ok_or_else(|| missing(row))?;
                crate::kernels::Number::Float(x)
                    .as_integer()
                    .ok_or_else(|| format!("row {}: {} is not an integer", row, x))
            })
            .collect::<Result<_, _>>()?,
        RawColumn::Text(v) => v
            .iter()
            .enumerate()
            .map(|(row, text)| {
                let text = text.as_deref().ok_or_else(|| missing(row))?;
                parse_number(text)
                    .and_then(|n| n.as_integer())
                    .ok_or_else(|| format!("row {}: '{}' is not an integer", row, text))
            })
            .collect::<Result<_, _>>()?,
    };

    integers
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            if v < min || v > max {
                return Err(format!("row {}: {} does not fit {}", row, v, dtype));
            }
            // In range, so the narrowing below cannot fail.
            if dtype.is_unsigned_int() {
                Ok(TypedValue::UInt(v as u64))
            } else {
                Ok(TypedValue::Int(v as i64))
            }
        })
        .collect()
}

fn to_floats(raw: &RawColumn, dtype: Dtype) -> Result<Vec<TypedValue>, String> {
    let floats: Vec<f64> = match raw {
        RawColumn::Int(v) => v.iter().map(|x| x.map_or(f64::NAN, |x| x as f64)).collect(),
        RawColumn::UInt(v) => v.iter().map(|x| x.map_or(f64::NAN, |x| x as f64)).collect(),
        RawColumn::Float(v) => v.iter().map(|x| x.unwrap_or(f64::NAN)).collect(),
        RawColumn::Bool(v) => v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect(),
        RawColumn::Text(v) => v
            .iter()
            .enumerate()
            .map(|(row, text)| match text.as_deref().map(str::trim) {
                None | Some("") => Ok(f64::NAN),
                Some(s) => s
                    .parse::<f64>()
                    .map_err(|_| format!("row {}: '{}' is not a number", row, s)),
            })
            .collect::<Result<_, _>>()?,
    };

    let narrow = dtype == Dtype::Float32;
    Ok(floats
        .into_iter()
        .map(|f| match f {
            f if f.is_nan() => TypedValue::Float(f64::NAN),
            f if narrow => TypedValue::Float(f as f32 as f64),
            f => TypedValue::Float(f),
        })
        .collect())
}

fn to_complex(raw: &RawColumn) -> Result<Vec<TypedValue>, String> {
    let real = |f: f64| TypedValue::Complex(Complex64::new(f, 0.0));
    match raw {
        RawColumn::Int(v) => v
            .iter()
            .enumerate()
            .map(|(row, x)| x.map(|x| real(x as f64)).ok_or_else(|| missing(row)))
            .collect(),
        RawColumn::UInt(v) => v
            .iter()
            .enumerate()
            .map(|(row, x)| x.map(|x| real(x as f64)).ok_or_else(|| missing(row)))
            .collect(),
        RawColumn::Float(v) => v
            .iter()
            .enumerate()
            .map(|(row, x)| {
                x.filter(|f| !f.is_nan())
                    .map(real)
                    .ok_or_else(|| missing(row))
            })
            .collect(),
        RawColumn::Bool(_) => Err("booleans cannot be read as complex numbers".to_string()),
        RawColumn::Text(v) => v
            .iter()
            .enumerate()
            .map(|(row, text)| {
                let text = text.as_deref().ok_or_else(|| missing(row))?;
                parse_complex(text)
                    .map(TypedValue::Complex)
                    .ok_or_else(|| format!("row {}: '{}' is not a complex number", row, text))
            })
            .collect(),
    }
}

fn to_bools(raw: &RawColumn) -> Result<Vec<TypedValue>, String> {
    let from_number = |row: usize, v: f64| match v {
        v if v == 0.0 => Ok(TypedValue::Bool(false)),
        v if v == 1.0 => Ok(TypedValue::Bool(true)),
        v => Err(format!("row {}: {} is not 0 or 1", row, v)),
    };
    match raw {
        RawColumn::Bool(v) => Ok(v.iter().map(|&b| TypedValue::Bool(b)).collect()),
        RawColumn::Int(v) => v
            .iter()
            .enumerate()
            .map(|(row, x)| from_number(row, x.ok_or_else(|| missing(row))? as f64))
            .collect(),
        RawColumn::UInt(v) => v
            .iter()
            .enumerate()
            .map(|(row, x)| from_number(row, x.ok_or_else(|| missing(row))? as f64))
            .collect(),
        RawColumn::Float(v) => v
            .iter()
            .enumerate()
            .map(|(row, x)| from_number(row, x.ok_or_else(|| missing(row))?))
            .collect(),
        RawColumn::Text(v) => v
            .iter()
            .enumerate()
            .map(|(row, text)| {
                let text = text.as_deref().ok_or_else(|| missing(row))?;
                parse_bool(text)
                    .map(TypedValue::Bool)
                    .ok_or_else(|| format!("row {}: '{}' is not a boolean", row, text))
            })
            .collect(),
    }
}

/// Integers are read as nanoseconds.
fn to_durations(raw: &RawColumn) -> Result<Vec<TypedValue>, String> {
    let from_nanos = |row: usize, v: i64| {
        if v < 0 {
            Err(format!("row {}: negative time span {}", row, v))
        } else {
            Ok(TypedValue::Duration(Duration::nanoseconds(v)))
        }
    };
    match raw {
        RawColumn::Int(v) => v
            .iter()
            .enumerate()
            .map(|(row, x)| from_nanos(row, x.ok_or_else(|| missing(row))?))
            .collect(),
        RawColumn::UInt(v) => v
            .iter()
            .enumerate()
            .map(|(row, x)| {
                let x = x.ok_or_else(|| missing(row))?;
                let x = i64::try_from(x)
                    .map_err(|_| format!("row {}: {} ns overflows a time span", row, x))?;
                from_nanos(row, x)
            })
            .collect(),
        RawColumn::Float(_) | RawColumn::Bool(_) => Err(format!(
            "only integer nanoseconds or text can become {}",
            Dtype::Duration
        )),
        RawColumn::Text(v) => v
            .iter()
            .enumerate()
            .map(|(row, text)| {
                let text = text.as_deref().ok_or_else(|| missing(row))?;
                parse_duration(text)
                    .map(TypedValue::Duration)
                    .ok_or_else(|| format!("row {}: '{}' is not a time span", row, text))
            })
            .collect(),
    }
}

fn to_datetimes(
    raw: &RawColumn,
    format: Option<&str>,
    config: &CastConfig,
) -> Result<Vec<TypedValue>, String> {
    let RawColumn::Text(v) = raw else {
        return Err(format!("only text can become {}", Dtype::DateTime));
    };
    v.iter()
        .enumerate()
        .map(|(row, text)| {
            let text = text.as_deref().ok_or_else(|| missing(row))?;
            let parsed = match format {
                Some(format) => parse_datetime_with_format(text, format, config.assume_utc),
                None => parse_datetime(text, &config.datetime_formats, config.assume_utc),
            };
            parsed
                .map(TypedValue::DateTime)
                .ok_or_else(|| format!("row {}: '{}' is not a timestamp", row, text))
        })
        .collect()
}
