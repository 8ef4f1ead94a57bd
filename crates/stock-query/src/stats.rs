//! Summary statistics of query results

use crate::table::{Cell, ColumnKind, Table, format_number};
use std::collections::HashMap;

/// Summary table in the layout of a dataframe `describe()`
///
/// Numeric columns get count, mean, std, min, quartiles and max. When the
/// result has no numeric column, every column is summarised as categorical
/// (count, unique, top, freq) instead.
pub fn describe(table: &Table) -> Table {
    let numeric = table.numeric_columns();
    if numeric.is_empty() {
        describe_categorical(table)
    } else {
        describe_numeric(table, &numeric)
    }
}

/// Sample standard deviation and linear-interpolated quartiles
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl NumericSummary {
    /// Summarise the finite values of `values`; `None` when there are none
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let n = count as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let std = if count > 1 {
            (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            f64::NAN
        };

        Some(Self {
            count,
            mean,
            std,
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }

    fn cells(summary: Option<&Self>) -> [Cell; 8] {
        match summary {
            Some(s) => [
                Cell::Text(s.count.to_string()),
                stat(s.mean),
                stat(s.std),
                stat(s.min),
                stat(s.q1),
                stat(s.median),
                stat(s.q3),
                stat(s.max),
            ],
            None => [
                Cell::Text("0".to_string()),
                Cell::Null,
                Cell::Null,
                Cell::Null,
                Cell::Null,
                Cell::Null,
                Cell::Null,
                Cell::Null,
            ],
        }
    }
}

const NUMERIC_STATS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
const CATEGORICAL_STATS: [&str; 4] = ["count", "unique", "top", "freq"];

fn describe_numeric(table: &Table, columns: &[usize]) -> Table {
    let summaries: Vec<[Cell; 8]> = columns
        .iter()
        .map(|&i| {
            let summary = NumericSummary::from_values(table.column(i).filter_map(Cell::as_f64));
            NumericSummary::cells(summary.as_ref())
        })
        .collect();

    let mut out = Table::new(
        std::iter::once(String::new()).chain(columns.iter().map(|&i| table.columns[i].clone())),
    );
    for (row, label) in NUMERIC_STATS.iter().enumerate() {
        let mut cells = vec![Cell::from(*label)];
        cells.extend(summaries.iter().map(|s| s[row].clone()));
        out.push_row(cells);
    }
    out
}

fn describe_categorical(table: &Table) -> Table {
    let mut columns: Vec<usize> = (0..table.column_count())
        .filter(|&i| table.column_kind(i) != ColumnKind::Empty)
        .collect();
    // Without any values (e.g. no rows) every column is summarised with count 0
    if columns.is_empty() {
        columns = (0..table.column_count()).collect();
    }

    let summaries: Vec<[Cell; 4]> = columns
        .iter()
        .map(|&i| {
            let values: Vec<String> = table
                .column(i)
                .filter(|c| !c.is_null())
                .map(ToString::to_string)
                .collect();
            categorical(&values)
        })
        .collect();

    let mut out = Table::new(
        std::iter::once(String::new()).chain(columns.iter().map(|&i| table.columns[i].clone())),
    );
    for (row, label) in CATEGORICAL_STATS.iter().enumerate() {
        let mut cells = vec![Cell::from(*label)];
        cells.extend(summaries.iter().map(|s| s[row].clone()));
        out.push_row(cells);
    }
    out
}

fn categorical(values: &[String]) -> [Cell; 4] {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    // Ties resolve to the value seen first
    let mut top: Option<(&str, usize)> = None;
    for value in values {
        let count = counts.entry(value.as_str()).or_insert(0);
        *count += 1;
        if top.is_none_or(|(_, best)| *count > best) {
            top = Some((value.as_str(), *count));
        }
    }

    [
        Cell::Text(values.len().to_string()),
        Cell::Text(counts.len().to_string()),
        top.map_or(Cell::Null, |(v, _)| Cell::from(v)),
        top.map_or(Cell::Null, |(_, n)| Cell::Text(n.to_string())),
    ]
}

/// Linear-interpolated quantile of an ascending, non-empty slice
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Statistic cell rounded to six significant digits
fn stat(value: f64) -> Cell {
    if value.is_finite() {
        Cell::Text(significant(value, 6))
    } else {
        Cell::Text(format_number(value))
    }
}

fn significant(value: f64, digits: i32) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (digits - 1 - magnitude).clamp(0, 12) as usize;
    let text = format!("{value:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}
