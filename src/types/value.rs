//! The decoded, typed form of one cell.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use num_complex::Complex64;
use serde::{Serialize, Serializer};
use std::fmt;

use super::dtype::Dtype;

/// A typed cell value.
///
/// Integer widths collapse into `UInt`/`Int`, and both float widths into `Float`:
/// the owning column's `Dtype` carries the width. A float32 column holds values
/// that were already rounded through `f32`.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Text(String),
    Bool(bool),
    UInt(u64),
    Int(i64),
    Float(f64),
    Complex(Complex64),
    DateTime(DateTime<Utc>),
    /// Always non-negative.
    Duration(Duration),
}

impl TypedValue {
    /// Returns `true` when this variant is the representation used by `dtype`.
    pub fn matches_dtype(&self, dtype: Dtype) -> bool {
        match self {
            TypedValue::Text(_) => matches!(dtype, Dtype::Text | Dtype::Category),
            TypedValue::Bool(_) => dtype == Dtype::Bool,
            TypedValue::UInt(_) => dtype.is_unsigned_int(),
            TypedValue::Int(_) => dtype.is_signed_int(),
            TypedValue::Float(_) => dtype.is_float(),
            TypedValue::Complex(_) => dtype == Dtype::Complex128,
            TypedValue::DateTime(_) => dtype == Dtype::DateTime,
            TypedValue::Duration(_) => dtype == Dtype::Duration,
        }
    }

    /// Short variant name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            TypedValue::Text(_) => "text",
            TypedValue::Bool(_) => "bool",
            TypedValue::UInt(_) => "unsigned integer",
            TypedValue::Int(_) => "signed integer",
            TypedValue::Float(_) => "float",
            TypedValue::Complex(_) => "complex",
            TypedValue::DateTime(_) => "datetime",
            TypedValue::Duration(_) => "duration",
        }
    }
}

/// Formats a complex number the way the ingest side accepts it: `3+4j`.
fn format_complex(f: &mut fmt::Formatter<'_>, z: &Complex64) -> fmt::Result {
    if z.im.is_sign_negative() {
        write!(f, "{}-{}j", z.re, -z.im)
    } else {
        write!(f, "{}+{}j", z.re, z.im)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Text(s) => f.write_str(s),
            TypedValue::Bool(b) => write!(f, "{}", b),
            TypedValue::UInt(v) => write!(f, "{}", v),
            TypedValue::Int(v) => write!(f, "{}", v),
            TypedValue::Float(v) => write!(f, "{}", v),
            TypedValue::Complex(z) => format_complex(f, z),
            TypedValue::DateTime(dt) => {
                f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            TypedValue::Duration(d) => write!(f, "{}", d),
        }
    }
}

/// JSON shape served by the read API: scalars stay scalars (NaN becomes `null`),
/// everything else is rendered through `Display`.
impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypedValue::Text(s) => serializer.serialize_str(s),
            TypedValue::Bool(b) => serializer.serialize_bool(*b),
            TypedValue::UInt(v) => serializer.serialize_u64(*v),
            TypedValue::Int(v) => serializer.serialize_i64(*v),
            TypedValue::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            TypedValue::Float(_) => serializer.serialize_none(),
            other => serializer.collect_str(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_json_shapes() {
        let values = vec![
            TypedValue::Text("a".into()),
            TypedValue::Int(-3),
            TypedValue::Float(f64::NAN),
            TypedValue::Complex(Complex64::new(3.0, -4.0)),
            TypedValue::DateTime(Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap()),
            TypedValue::Duration(Duration::seconds(90)),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(
            json,
            r#"["a",-3,null,"3-4j","2021-03-04T05:06:07Z","PT90S"]"#
        );
    }

    #[test]
    fn test_matches_dtype() {
        assert!(TypedValue::Text("x".into()).matches_dtype(Dtype::Category));
        assert!(TypedValue::UInt(1).matches_dtype(Dtype::UInt16));
        assert!(!TypedValue::UInt(1).matches_dtype(Dtype::Int16));
        assert!(!TypedValue::Float(1.0).matches_dtype(Dtype::Complex128));
    }
}
