// In: src/inference/cascade.rs

//! The per-column driver: force cast, typed passthrough, then the text cascade.

use log::{debug, warn};

use super::category::category_conversion;
use super::force_cast::ForceCast;
use super::TypedColumn;
use crate::config::CastConfig;
use crate::error::{CellcastError, InferenceFailure};
use crate::kernels::{
    downcast, parse_complex, parse_datetime, parse_duration, parse_number, Number,
};
use crate::types::{Dtype, RawColumn, TypedValue};

//==================================================================================
// 1. Public API
//==================================================================================

/// The result of inferring one column.
#[derive(Debug)]
pub struct Inference {
    pub column: TypedColumn,
    /// Set when a requested force cast could not be applied. The column was
    /// inferred automatically instead.
    pub error: Option<CellcastError>,
}

/// Infers the dtype of one column and converts every value to it.
///
/// Never fails: the worst case is a `text` column. A force-cast failure is
/// returned alongside the automatically inferred column.
pub fn infer(
    name: &str,
    raw: &RawColumn,
    force_cast: Option<&str>,
    config: &CastConfig,
) -> Inference {
    let mut error = None;

    if let Some(directive) = force_cast {
        match directive
            .parse::<ForceCast>()
            .and_then(|cast| cast.apply(raw, config))
        {
            Ok(column) => {
                debug!("column '{}': force cast to {} applied", name, column.dtype);
                return Inference {
                    column,
                    error: None,
                };
            }
            Err(reason) => {
                let err = CellcastError::ForceCastFailed {
                    column: name.to_string(),
                    requested: directive.to_string(),
                    reason,
                };
                warn!("{}; falling back to automatic inference", err);
                error = Some(err);
            }
        }
    }

    let column = infer_automatic(name, raw, config);
    debug!("column '{}': inferred {}", name, column.dtype);
    Inference { column, error }
}

//==================================================================================
// 2. Typed Passthrough
//==================================================================================

fn infer_automatic(name: &str, raw: &RawColumn, config: &CastConfig) -> TypedColumn {
    let allowed = config.nan_tolerance.allowed(raw.len());
    let numbers: Vec<Option<Number>> = match raw {
        RawColumn::Text(values) => return infer_text(name, values, config),
        RawColumn::Bool(values) => {
            return TypedColumn::new(
                Dtype::Bool,
                values.iter().map(|&b| TypedValue::Bool(b)).collect(),
            );
        }
        RawColumn::Int(values) => values.iter().map(|v| v.map(Number::from_i64)).collect(),
        RawColumn::UInt(values) => values.iter().map(|v| v.map(Number::UInt)).collect(),
        RawColumn::Float(values) => values
            .iter()
            .map(|v| v.and_then(Number::from_f64))
            .collect(),
    };

    match downcast(&numbers, allowed) {
        Ok(result) => TypedColumn::new(result.dtype, result.values),
        Err(failure) => {
            // Already numeric; too many gaps only means it cannot be narrowed.
            debug!("column '{}': {}; keeping float64", name, failure);
            let values = numbers
                .iter()
                .map(|n| TypedValue::Float(n.map_or(f64::NAN, |n| n.as_f64())))
                .collect();
            TypedColumn::new(Dtype::Float64, values)
        }
    }
}

//==================================================================================
// 3. Text Cascade
//==================================================================================

type Stage = fn(&[Option<String>], &CastConfig) -> Result<TypedColumn, InferenceFailure>;

/// Candidates in priority order. The first one to accept the column wins.
const TEXT_CASCADE: [(&str, Stage); 5] = [
    ("numeric", numeric_conversion),
    ("complex", complex_conversion),
    ("category", category_conversion),
    ("duration", duration_conversion),
    ("datetime", datetime_conversion),
];

fn infer_text(name: &str, values: &[Option<String>], config: &CastConfig) -> TypedColumn {
    if values.is_empty() {
        return TypedColumn::new(Dtype::Text, Vec::new());
    }
    for (stage, convert) in TEXT_CASCADE {
        match convert(values, config) {
            Ok(column) => return column,
            Err(failure) => debug!("column '{}': not {}: {}", name, stage, failure),
        }
    }
    TypedColumn::from_text(Dtype::Text, values)
}

fn numeric_conversion(
    values: &[Option<String>],
    config: &CastConfig,
) -> Result<TypedColumn, InferenceFailure> {
    let numbers: Vec<Option<Number>> = values
        .iter()
        .map(|v| v.as_deref().and_then(parse_number))
        .collect();
    // A short column of nothing but exceptions is not numeric.
    if numbers.iter().all(Option::is_none) {
        return Err(InferenceFailure::NotNumeric {
            exceptions: numbers.len(),
            allowed: 0,
        });
    }
    let result = downcast(&numbers, config.nan_tolerance.allowed(values.len()))?;
    Ok(TypedColumn::new(result.dtype, result.values))
}

/// Runs `parse` over every entry; the first miss fails the stage.
fn convert_all<T>(
    values: &[Option<String>],
    parse: impl Fn(&str) -> Option<T>,
    wrap: impl Fn(T) -> TypedValue,
    failure: impl Fn(usize) -> InferenceFailure,
) -> Result<Vec<TypedValue>, InferenceFailure> {
    values
        .iter()
        .enumerate()
        .map(|(row, v)| {
            v.as_deref()
                .and_then(&parse)
                .map(&wrap)
                .ok_or_else(|| failure(row))
        })
        .collect()
}

fn complex_conversion(
    values: &[Option<String>],
    _config: &CastConfig,
) -> Result<TypedColumn, InferenceFailure> {
    let converted = convert_all(values, parse_complex, TypedValue::Complex, |row| {
        InferenceFailure::NotComplex { row }
    })?;
    Ok(TypedColumn::new(Dtype::Complex128, converted))
}

fn duration_conversion(
    values: &[Option<String>],
    _config: &CastConfig,
) -> Result<TypedColumn, InferenceFailure> {
    let converted = convert_all(values, parse_duration, TypedValue::Duration, |row| {
        InferenceFailure::NotDuration { row }
    })?;
    Ok(TypedColumn::new(Dtype::Duration, converted))
}

fn datetime_conversion(
    values: &[Option<String>],
    config: &CastConfig,
) -> Result<TypedColumn, InferenceFailure> {
    let converted = convert_all(
        values,
        |s| parse_datetime(s, &config.datetime_formats, config.assume_utc),
        TypedValue::DateTime,
        |row| InferenceFailure::NotDateTime { row },
    )?;
    Ok(TypedColumn::new(Dtype::DateTime, converted))
}

#[cfg(test)]
#[path = "cascade_tests.rs"]
mod tests;
