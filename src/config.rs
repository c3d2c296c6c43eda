// In: src/config.rs

//! The single source of truth for all cellcast inference configuration.
//!
//! `CastConfig` is created once at the application boundary (a JSON document, a
//! Python dictionary, or plain `Default`) and passed down through the system as a
//! shared, read-only `&CastConfig`. Nothing mutates it after construction.

use serde::{Deserialize, Serialize};

use crate::error::CellcastError;

//==================================================================================
// I. Policy Enums
//==================================================================================

/// How many unparseable entries a numeric column may contain and still be
/// inferred as numeric. Exceptions become NaN in the resulting float column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum NanTolerance {
    /// An absolute number of exceptions per column.
    Count { max: usize },
    /// A fraction of the column length, in `[0, 1]`.
    Ratio { max: f64 },
}

impl Default for NanTolerance {
    fn default() -> Self {
        NanTolerance::Count { max: 1 }
    }
}

impl NanTolerance {
    /// The largest exception count accepted for a column of `total` values.
    pub fn allowed(&self, total: usize) -> usize {
        match *self {
            NanTolerance::Count { max } => max,
            NanTolerance::Ratio { max } => {
                let max = max.clamp(0.0, 1.0);
                (max * total as f64).floor() as usize
            }
        }
    }
}

//==================================================================================
// II. The Unified CastConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct CastConfig {
    /// Exception budget for the numeric downcast.
    #[serde(default)]
    pub nan_tolerance: NanTolerance,

    /// A column becomes `category` only while `distinct / total` stays at or
    /// below this ratio.
    #[serde(default = "default_category_threshold")]
    pub category_threshold: f64,

    /// Optional absolute cap on distinct values, applied on top of the ratio.
    #[serde(default)]
    pub max_categories: Option<usize>,

    /// chrono format strings tried, in order, by automatic datetime detection.
    /// RFC 3339 is always tried first.
    #[serde(default = "default_datetime_formats")]
    pub datetime_formats: Vec<String>,

    /// Interpret timestamps without an offset as UTC. When false they are
    /// interpreted in the local time zone of the host.
    #[serde(default = "default_true")]
    pub assume_utc: bool,
}

impl Default for CastConfig {
    fn default() -> Self {
        Self {
            nan_tolerance: NanTolerance::default(),
            category_threshold: default_category_threshold(),
            max_categories: None,
            datetime_formats: default_datetime_formats(),
            assume_utc: true,
        }
    }
}

impl CastConfig {
    /// Parses a configuration document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CellcastError> {
        let config: CastConfig = serde_json::from_str(json)?;
        if !(0.0..=1.0).contains(&config.category_threshold) {
            return Err(CellcastError::InvalidConfig(format!(
                "category_threshold must be within [0, 1], got {}",
                config.category_threshold
            )));
        }
        if let NanTolerance::Ratio { max } = config.nan_tolerance {
            if !(0.0..=1.0).contains(&max) {
                return Err(CellcastError::InvalidConfig(format!(
                    "nan_tolerance ratio must be within [0, 1], got {}",
                    max
                )));
            }
        }
        Ok(config)
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}

fn default_category_threshold() -> f64 {
    0.05
}

fn default_datetime_formats() -> Vec<String> {
    [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %I:%M:%S %p",
        "%m/%d/%Y",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y",
        "%B %d %Y",
        "%b %d %Y",
        "%d %B %Y",
        "%d %b %Y",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = CastConfig::from_json("{}").unwrap();
        assert_eq!(config, CastConfig::default());
        assert_eq!(config.nan_tolerance, NanTolerance::Count { max: 1 });

        let config =
            CastConfig::from_json(r#"{"nan_tolerance": {"policy": "count", "max": 2}}"#).unwrap();
        assert_eq!(config.nan_tolerance.allowed(100), 2);
    }

    #[test]
    fn test_ratio_tolerance_from_json() {
        let config =
            CastConfig::from_json(r#"{"nan_tolerance": {"policy": "ratio", "max": 0.1}}"#).unwrap();
        assert_eq!(config.nan_tolerance.allowed(50), 5);
        assert_eq!(config.nan_tolerance.allowed(9), 0);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(CastConfig::from_json(r#"{"nan_tolerence": 3}"#).is_err());
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected() {
        let result = CastConfig::from_json(r#"{"category_threshold": 1.5}"#);
        assert!(matches!(result, Err(CellcastError::InvalidConfig(_))));

        let result = CastConfig::from_json(r#"{"nan_tolerance": {"policy": "ratio", "max": 2.0}}"#);
        assert!(matches!(result, Err(CellcastError::InvalidConfig(_))));
    }
}
