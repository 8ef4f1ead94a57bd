//! Chart selection and rendering
//!
//! [`select_chart`] decides what a query result should look like; the
//! resulting [`Chart`] is drawn as an SVG scene and optionally rasterised.

pub mod raster;
pub mod svg;

use crate::config::ChartFormat;
use crate::error::Result;
use crate::table::Table;

/// Results with more rows than this are drawn as a sampled line chart
pub const MAX_BAR_ROWS: usize = 20;
/// Rows sampled for a line chart
pub const LINE_SAMPLES: usize = 10;

pub const NO_DATA_MESSAGE: &str = "No data to visualize";
const OVERVIEW_TITLE: &str = "Stock data overview";
const VALUE_LABEL: &str = "Value";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Grouped bars, one group per category
    Bar,
    /// Lines through the category positions
    Line,
}

/// One plotted series, aligned with [`ChartSpec::categories`]
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    /// `None` leaves a gap
    pub values: Vec<Option<f64>>,
    pub markers: bool,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
            markers: false,
        }
    }

    pub fn with_markers(mut self) -> Self {
        self.markers = true;
        self
    }
}

/// A fully specified plot
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: ChartKind,
    /// X axis positions, in order
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    /// Indices into `categories` that get a tick label
    pub ticks: Vec<usize>,
    pub grid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    /// Figure with a single centred message
    Placeholder { message: String },
    Plot(ChartSpec),
}

impl Chart {
    pub fn placeholder(message: impl Into<String>) -> Self {
        Chart::Placeholder {
            message: message.into(),
        }
    }

    pub fn to_svg(&self) -> String {
        svg::render(self)
    }

    /// Encode the chart in `format`
    pub fn encode(&self, format: ChartFormat) -> Result<Vec<u8>> {
        let scene = self.to_svg();
        match format {
            ChartFormat::Svg => Ok(scene.into_bytes()),
            ChartFormat::Png => raster::svg_to_png(&scene),
        }
    }
}

/// Pick a chart for a query result
///
/// The first column supplies the x categories and every other numeric column
/// becomes a series; text and date value columns are not plotted, so a result
/// without a numeric value column gets the placeholder. Long results are sampled down to [`LINE_SAMPLES`] rows
/// and drawn as lines; short ones as grouped bars.
pub fn select_chart(table: &Table) -> Chart {
    if table.is_empty() || table.column_count() < 2 {
        return Chart::placeholder(NO_DATA_MESSAGE);
    }

    let value_columns: Vec<usize> = table
        .numeric_columns()
        .into_iter()
        .filter(|&i| i > 0)
        .collect();
    if value_columns.is_empty() {
        return Chart::placeholder(NO_DATA_MESSAGE);
    }

    let (kind, rows) = if table.row_count() > MAX_BAR_ROWS {
        (ChartKind::Line, sample_indices(table.row_count(), LINE_SAMPLES))
    } else {
        (ChartKind::Bar, (0..table.row_count()).collect())
    };

    let categories: Vec<String> = rows.iter().map(|&r| table.rows[r][0].to_string()).collect();
    let series = value_columns
        .iter()
        .map(|&c| {
            let values = rows.iter().map(|&r| table.rows[r][c].as_f64()).collect();
            let series = Series::new(table.columns[c].clone(), values);
            match kind {
                ChartKind::Line => series.with_markers(),
                ChartKind::Bar => series,
            }
        })
        .collect();

    Chart::Plot(ChartSpec {
        title: OVERVIEW_TITLE.to_string(),
        x_label: table.columns[0].clone(),
        y_label: VALUE_LABEL.to_string(),
        kind,
        ticks: (0..categories.len()).collect(),
        categories,
        series,
        grid: false,
    })
}

/// `samples` evenly spaced indices over `0..len`, first and last included
///
/// Index `i` is `i * (len - 1) / (samples - 1)` rounded down.
pub fn sample_indices(len: usize, samples: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    if samples <= 1 {
        return vec![0];
    }
    (0..samples).map(|i| i * (len - 1) / (samples - 1)).collect()
}
