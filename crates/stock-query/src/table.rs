//! In-memory tabular query results

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single value of a query result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Cell {
    Null,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    /// Numeric value, if this cell holds a finite number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("NaN"),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(v) => f.write_str(&format_number(*v)),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Date(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

/// Semantic type of a column, inferred from its non-null cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Date,
    Text,
    /// No non-null values at all
    Empty,
}

/// Result of one query: named columns over ordered rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create a table with the given column names and no rows
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; short rows are padded with nulls, long rows truncated
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    /// Builder-style [`Table::push_row`]
    pub fn with_row(mut self, row: Vec<Cell>) -> Self {
        self.push_row(row);
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate the cells of one column in row order
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Infer the semantic type of a column
    ///
    /// A column is numeric/date only when every non-null cell is; any mix
    /// falls back to text.
    pub fn column_kind(&self, index: usize) -> ColumnKind {
        let mut kind = ColumnKind::Empty;
        for cell in self.column(index) {
            let cell_kind = match cell {
                Cell::Null => continue,
                Cell::Number(_) => ColumnKind::Numeric,
                Cell::Date(_) => ColumnKind::Date,
                Cell::Text(_) => ColumnKind::Text,
            };
            kind = match kind {
                ColumnKind::Empty => cell_kind,
                current if current == cell_kind => current,
                _ => return ColumnKind::Text,
            };
        }
        kind
    }

    /// Indices of numeric columns
    pub fn numeric_columns(&self) -> Vec<usize> {
        (0..self.column_count())
            .filter(|&i| self.column_kind(i) == ColumnKind::Numeric)
            .collect()
    }

    /// New table holding the rows at `indices`, in that order
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

/// Format a number the way result tables show it
///
/// Integral values drop the fractional part; everything else uses the
/// shortest representation that round-trips.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{sign}inf")
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices() -> Table {
        Table::new(["trade_date", "close"])
            .with_row(vec!["2024-01-02".into(), 1685.01.into()])
            .with_row(vec!["2024-01-03".into(), Cell::Null])
            .with_row(vec!["2024-01-04".into(), 1700.0.into()])
    }

    #[test]
    fn test_column_kinds() {
        let table = prices();
        assert_eq!(table.column_kind(0), ColumnKind::Text);
        assert_eq!(table.column_kind(1), ColumnKind::Numeric);
        assert_eq!(table.numeric_columns(), vec![1]);
    }

    #[test]
    fn test_mixed_column_is_text() {
        let table = Table::new(["v"])
            .with_row(vec![1.0.into()])
            .with_row(vec!["x".into()]);
        assert_eq!(table.column_kind(0), ColumnKind::Text);
    }

    #[test]
    fn test_empty_column_kind() {
        let table = Table::new(["v"]).with_row(vec![Cell::Null]);
        assert_eq!(table.column_kind(0), ColumnKind::Empty);
    }

    #[test]
    fn test_push_row_pads() {
        let mut table = Table::new(["a", "b", "c"]);
        table.push_row(vec![1.0.into()]);
        assert_eq!(table.rows[0].len(), 3);
        assert!(table.rows[0][2].is_null());
    }

    #[test]
    fn test_select_rows_keeps_order() {
        let table = prices().select_rows(&[2, 0]);
        assert_eq!(table.rows[0][0], Cell::from("2024-01-04"));
        assert_eq!(table.rows[1][0], Cell::from("2024-01-02"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1700.0), "1700");
        assert_eq!(format_number(1685.01), "1685.01");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_cell_display() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(Cell::Date(date).to_string(), "2024-03-01");
        assert_eq!(Cell::Null.to_string(), "NaN");
    }
}
