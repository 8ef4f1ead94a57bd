//! Markdown rendering of query results

use crate::table::Table;
use comfy_table::Table as Grid;
use comfy_table::presets::ASCII_MARKDOWN;

/// Results longer than this are shown as head + tail
pub const PREVIEW_THRESHOLD: usize = 10;
/// Rows kept from each end of a long result
pub const PREVIEW_EDGE_ROWS: usize = 5;

/// Render every row of `table` as a markdown table
pub fn markdown(table: &Table) -> String {
    let mut grid = Grid::new();
    grid.load_preset(ASCII_MARKDOWN)
        .set_header(table.columns.iter().map(|c| escape(c)));

    for row in &table.rows {
        grid.add_row(row.iter().map(|cell| escape(&cell.to_string())));
    }

    grid.to_string()
}

/// Row indices shown for a result of `row_count` rows
///
/// Up to [`PREVIEW_THRESHOLD`] rows are all shown; longer results keep the
/// first and last [`PREVIEW_EDGE_ROWS`] in their original order.
pub fn preview_indices(row_count: usize) -> Vec<usize> {
    if row_count <= PREVIEW_THRESHOLD {
        (0..row_count).collect()
    } else {
        (0..PREVIEW_EDGE_ROWS)
            .chain(row_count - PREVIEW_EDGE_ROWS..row_count)
            .collect()
    }
}

/// Render the preview of `table` (all columns, head + tail rows when long)
pub fn preview(table: &Table) -> String {
    markdown(&table.select_rows(&preview_indices(table.row_count())))
}

/// Keep cell text from breaking the markdown table layout
fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn dated(rows: usize) -> Table {
        let mut table = Table::new(["trade_date", "close", "vol"]);
        for i in 0..rows {
            table.push_row(vec![
                Cell::Text(format!("2024-02-{:02}", i + 1)),
                Cell::Number(1500.0 + i as f64),
                Cell::Number(10_000.0 + i as f64),
            ]);
        }
        table
    }

    fn occurrences(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_markdown_shape() {
        let text = markdown(&dated(2));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("trade_date"));
        assert!(lines[1].starts_with("|-"));
        assert!(lines[2].contains("2024-02-01"));
        assert!(lines[2].contains("1500"));
    }

    #[test]
    fn test_short_results_show_every_row_once() {
        for rows in [0, 1, 7, 10] {
            let text = preview(&dated(rows));
            for i in 0..rows {
                let date = format!("2024-02-{:02}", i + 1);
                assert_eq!(occurrences(&text, &date), 1, "row {i} of {rows}");
            }
        }
    }

    #[test]
    fn test_long_results_show_head_and_tail() {
        let text = preview(&dated(25));
        let shown: Vec<usize> = (0..25)
            .filter(|i| text.contains(&format!("2024-02-{:02}", i + 1)))
            .collect();
        assert_eq!(shown, vec![0, 1, 2, 3, 4, 20, 21, 22, 23, 24]);

        // Original order, no duplicates
        let positions: Vec<usize> = shown
            .iter()
            .map(|i| text.find(&format!("2024-02-{:02}", i + 1)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        for i in &shown {
            assert_eq!(occurrences(&text, &format!("2024-02-{:02}", i + 1)), 1);
        }
    }

    #[test]
    fn test_long_results_keep_all_columns() {
        let text = preview(&dated(11));
        let header = text.lines().next().unwrap();
        for column in ["trade_date", "close", "vol"] {
            assert!(header.contains(column));
        }
    }

    #[test]
    fn test_preview_indices() {
        assert_eq!(preview_indices(3), vec![0, 1, 2]);
        assert_eq!(preview_indices(11), vec![0, 1, 2, 3, 4, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_escape_pipes() {
        let table = Table::new(["name"]).with_row(vec![Cell::from("a|b")]);
        assert!(markdown(&table).contains("a\\|b"));
    }
}
