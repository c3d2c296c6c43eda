//! The categorical rule: low cardinality relative to row count.

use hashbrown::HashSet;

use super::TypedColumn;
use crate::config::CastConfig;
use crate::error::InferenceFailure;
use crate::types::Dtype;

/// Converts `values` to `category` when the distinct/total ratio stays at or
/// below `config.category_threshold` (and under `max_categories`, if set).
/// The scan stops as soon as either limit is crossed.
pub(crate) fn category_conversion(
    values: &[Option<String>],
    config: &CastConfig,
) -> Result<TypedColumn, InferenceFailure> {
    let total = values.len();
    if total == 0 {
        return Err(InferenceFailure::Empty);
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for value in values {
        if !seen.insert(value.as_deref().unwrap_or("")) {
            continue;
        }
        let distinct = seen.len();
        let over_ratio = distinct as f64 / total as f64 > config.category_threshold;
        let over_cap = config.max_categories.map_or(false, |cap| distinct > cap);
        if over_ratio || over_cap {
            return Err(InferenceFailure::TooManyCategories { distinct, total });
        }
    }

    Ok(TypedColumn::from_text(Dtype::Category, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(distinct: usize, total: usize) -> Vec<Option<String>> {
        (0..total).map(|i| Some(format!("v{}", i % distinct))).collect()
    }

    #[test]
    fn test_ratio_boundary() {
        let config = CastConfig::default();
        assert!(category_conversion(&column(4, 100), &config).is_ok());
        assert!(category_conversion(&column(5, 100), &config).is_ok());
        assert_eq!(
            category_conversion(&column(6, 100), &config).unwrap_err(),
            InferenceFailure::TooManyCategories {
                distinct: 6,
                total: 100
            }
        );
    }

    #[test]
    fn test_absolute_cap() {
        let config = CastConfig {
            category_threshold: 1.0,
            max_categories: Some(3),
            ..CastConfig::default()
        };
        assert!(category_conversion(&column(3, 10), &config).is_ok());
        assert!(category_conversion(&column(4, 10), &config).is_err());
    }

    #[test]
    fn test_missing_cells_count_as_empty_category() {
        let mut values = column(2, 100);
        values[3] = None;
        let typed = category_conversion(&values, &CastConfig::default()).unwrap();
        assert_eq!(typed.dtype, Dtype::Category);
        assert_eq!(typed.values[3], crate::types::TypedValue::Text(String::new()));
    }
}
