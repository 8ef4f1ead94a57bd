//! Closing-price forecasts
//!
//! Cleans a fetched price history, fits the configured ARIMA model and lays
//! the result out as a table and a chart.

pub mod arima;
pub mod linalg;

use crate::chart::{Chart, ChartKind, ChartSpec, Series};
use crate::config::{ArimaOrder, AssistantConfig};
use crate::error::{Result, StockQueryError};
use crate::source::PricePoint;
use crate::table::{Cell, Table};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Combined history + forecast lengths above this get thinned x ticks
pub const DENSE_TICK_THRESHOLD: usize = 12;

/// One predicted close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Usable observations of one entity, ascending by date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
}

impl History {
    /// Keep points with a parseable date and a finite close, sorted by date
    pub fn from_points(points: &[PricePoint]) -> Self {
        let mut valid: Vec<(NaiveDate, f64)> = points
            .iter()
            .filter_map(|point| {
                let close = point.close.filter(|c| c.is_finite())?;
                Some((parse_trade_date(&point.trade_date)?, close))
            })
            .collect();
        valid.sort_by_key(|(date, _)| *date);

        let (dates, closes) = valid.into_iter().unzip();
        Self { dates, closes }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

/// Parse a stored trade date (`YYYY-MM-DD`, `YYYYMMDD` or a datetime)
pub fn parse_trade_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y%m%d"))
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .ok()
}

/// The `[start, end)` window of history used for a forecast made on `today`
pub fn history_window(today: NaiveDate, lookback_days: i64) -> (NaiveDate, NaiveDate) {
    let start = TimeDelta::try_days(lookback_days)
        .and_then(|lookback| today.checked_sub_signed(lookback))
        .unwrap_or(NaiveDate::MIN);
    (start, today)
}

/// `horizon` consecutive calendar days starting the day after `last`
pub fn forecast_dates(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    last.iter_days().skip(1).take(horizon).collect()
}

/// X positions labelled on the forecast chart
///
/// Up to [`DENSE_TICK_THRESHOLD`] points every position is labelled;
/// beyond that every `max(1, total / 10)`-th one, starting at the first.
pub fn tick_indices(total: usize) -> Vec<usize> {
    if total <= DENSE_TICK_THRESHOLD {
        (0..total).collect()
    } else {
        (0..total).step_by((total / 10).max(1)).collect()
    }
}

/// Fits the model and produces forecasts
#[derive(Debug, Clone)]
pub struct Forecaster {
    order: ArimaOrder,
    min_observations: usize,
    max_horizon: usize,
}

impl Forecaster {
    pub fn new(order: ArimaOrder, min_observations: usize, max_horizon: usize) -> Self {
        Self {
            order,
            min_observations,
            max_horizon,
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(
            config.arima_order,
            config.forecast_min_observations,
            config.forecast_max_horizon,
        )
    }

    /// Reject horizons outside `1..=max_horizon`
    pub fn check_horizon(&self, horizon: usize) -> Result<()> {
        if horizon == 0 || horizon > self.max_horizon {
            return Err(StockQueryError::InvalidParameters(format!(
                "n must be between 1 and {}, got {horizon}",
                self.max_horizon
            )));
        }
        Ok(())
    }

    /// Forecast `horizon` closes of `entity` following `history`
    pub fn forecast(
        &self,
        entity: &str,
        history: &History,
        horizon: usize,
    ) -> Result<Vec<ForecastPoint>> {
        self.check_horizon(horizon)?;
        if history.len() < self.min_observations {
            return Err(StockQueryError::InsufficientData {
                entity: entity.to_string(),
                required: self.min_observations,
                found: history.len(),
            });
        }
        let Some(last) = history.last_date() else {
            return Err(StockQueryError::InsufficientData {
                entity: entity.to_string(),
                required: self.min_observations,
                found: 0,
            });
        };

        debug!(entity, observations = history.len(), horizon, "Fitting forecast model");
        let values = arima::fit(self.order, &history.closes)?.forecast(horizon)?;

        let points: Vec<ForecastPoint> = forecast_dates(last, horizon)
            .into_iter()
            .zip(values)
            .map(|(date, value)| ForecastPoint { date, value })
            .collect();

        info!(
            entity,
            observations = history.len(),
            horizon,
            last_observed = %last,
            "Forecast complete"
        );
        Ok(points)
    }
}

/// `forecast_date` / `forecast_close` table, closes rounded to cents
pub fn forecast_table(points: &[ForecastPoint]) -> Table {
    let mut table = Table::new(["forecast_date", "forecast_close"]);
    for point in points {
        table.push_row(vec![
            Cell::Date(point.date),
            Cell::Number((point.value * 100.0).round() / 100.0),
        ]);
    }
    table
}

/// History and forecast drawn on one date axis
pub fn forecast_chart(entity: &str, history: &History, points: &[ForecastPoint]) -> Chart {
    let observed = history.len();
    let total = observed + points.len();

    let categories: Vec<String> = history
        .dates
        .iter()
        .chain(points.iter().map(|p| &p.date))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();

    let historical = history
        .closes
        .iter()
        .map(|&c| Some(c))
        .chain(std::iter::repeat_n(None, points.len()))
        .collect();
    let predicted = std::iter::repeat_n(None, observed)
        .chain(points.iter().map(|p| Some(p.value)))
        .collect();

    Chart::Plot(ChartSpec {
        title: format!("{entity} close price ARIMA forecast"),
        x_label: "Date".to_string(),
        y_label: "Close".to_string(),
        kind: ChartKind::Line,
        categories,
        series: vec![
            Series::new("Historical close", historical),
            Series::new("Forecast close", predicted).with_markers(),
        ],
        ticks: tick_indices(total),
        grid: true,
    })
}
