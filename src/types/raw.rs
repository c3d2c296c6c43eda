//! Input side: the tabular structure handed over by the file parser.

use crate::error::CellcastError;

/// One column of raw input values, in row order.
///
/// Parsers that already know a column is numeric or boolean hand it over typed;
/// everything else arrives as text. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawColumn {
    Text(Vec<Option<String>>),
    Int(Vec<Option<i64>>),
    UInt(Vec<Option<u64>>),
    Float(Vec<Option<f64>>),
    /// Boolean columns never contain missing cells; a parser that sees one
    /// should hand the column over as text instead.
    Bool(Vec<bool>),
}

impl RawColumn {
    pub fn len(&self) -> usize {
        match self {
            RawColumn::Text(v) => v.len(),
            RawColumn::Int(v) => v.len(),
            RawColumn::UInt(v) => v.len(),
            RawColumn::Float(v) => v.len(),
            RawColumn::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convenience constructor for text columns without missing cells.
    pub fn text<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RawColumn::Text(values.into_iter().map(|s| Some(s.into())).collect())
    }

    /// The value at `row` rendered as text, `None` when missing.
    pub fn text_at(&self, row: usize) -> Option<String> {
        match self {
            RawColumn::Text(v) => v.get(row).cloned().flatten(),
            RawColumn::Int(v) => v.get(row).copied().flatten().map(|x| x.to_string()),
            RawColumn::UInt(v) => v.get(row).copied().flatten().map(|x| x.to_string()),
            RawColumn::Float(v) => v.get(row).copied().flatten().map(|x| x.to_string()),
            RawColumn::Bool(v) => v.get(row).map(|x| x.to_string()),
        }
    }

    /// Every value rendered as text.
    pub fn to_text(&self) -> Vec<Option<String>> {
        match self {
            RawColumn::Text(v) => v.clone(),
            _ => (0..self.len()).map(|row| self.text_at(row)).collect(),
        }
    }
}

/// An ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<(String, RawColumn)>,
}

impl RawTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column, enforcing unique names and equal lengths.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        column: RawColumn,
    ) -> Result<(), CellcastError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CellcastError::InvalidTable(
                "column names must not be empty".to_string(),
            ));
        }
        if self.columns.iter().any(|(existing, _)| *existing == name) {
            return Err(CellcastError::InvalidTable(format!(
                "duplicate column name '{}'",
                name
            )));
        }
        if let Some(expected) = self.num_rows() {
            if column.len() != expected {
                return Err(CellcastError::InvalidTable(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    column.len(),
                    expected
                )));
            }
        }
        self.columns.push((name, column));
        Ok(())
    }

    /// Builder-style `push_column`.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        column: RawColumn,
    ) -> Result<Self, CellcastError> {
        self.push_column(name, column)?;
        Ok(self)
    }

    /// `None` for a table without columns.
    pub fn num_rows(&self) -> Option<usize> {
        self.columns.first().map(|(_, c)| c.len())
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &RawColumn)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_table_is_rejected() {
        let table = RawTable::new()
            .with_column("a", RawColumn::text(["1", "2"]))
            .unwrap();
        let err = table
            .with_column("b", RawColumn::Int(vec![Some(1)]))
            .unwrap_err();
        assert!(matches!(err, CellcastError::InvalidTable(msg) if msg.contains("expected 2")));
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut table = RawTable::new();
        table.push_column("a", RawColumn::Bool(vec![true])).unwrap();
        assert!(table.push_column("a", RawColumn::Bool(vec![false])).is_err());
        assert_eq!(table.num_columns(), 1);
    }

    #[test]
    fn test_text_rendering_of_typed_columns() {
        let col = RawColumn::Float(vec![Some(1.5), None]);
        assert_eq!(col.to_text(), vec![Some("1.5".to_string()), None]);
    }
}
