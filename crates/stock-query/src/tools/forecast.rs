//! ARIMA closing-price forecast tool

use super::parse_params;
use crate::artifact::ArtifactStore;
use crate::config::AssistantConfig;
use crate::error::{Result, StockQueryError};
use crate::forecast::{Forecaster, History, forecast_chart, forecast_table, history_window};
use crate::render;
use crate::source::DataSource;
use agent_core::{Context, Result as AgentResult};
use agent_tools::{Tool, schema};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

pub const NAME: &str = "arima_stock";
const CHART_ALT: &str = "ARIMA forecast";

/// Forecasts the next `n` daily closes of one stock
pub struct ArimaStockTool {
    source: Arc<dyn DataSource>,
    artifacts: ArtifactStore,
    forecaster: Forecaster,
    database: String,
    lookback_days: i64,
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct ArimaParams {
    ts_code: String,
    n: Horizon,
}

/// Horizon as sent by the agent: a number or a numeric string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Horizon {
    Number(i64),
    Text(String),
}

impl Horizon {
    fn steps(&self) -> Result<usize> {
        let value = match self {
            Horizon::Number(n) => *n,
            Horizon::Text(text) => text.trim().parse().map_err(|_| {
                StockQueryError::InvalidParameters(format!("n must be an integer, got '{text}'"))
            })?,
        };
        usize::try_from(value).map_err(|_| {
            StockQueryError::InvalidParameters(format!("n must be positive, got {value}"))
        })
    }
}

impl ArimaStockTool {
    pub fn new(
        source: Arc<dyn DataSource>,
        artifacts: ArtifactStore,
        config: &AssistantConfig,
    ) -> Self {
        Self {
            source,
            artifacts,
            forecaster: Forecaster::from_config(config),
            database: config.default_database.clone(),
            lookback_days: config.forecast_lookback_days,
            today: None,
        }
    }

    /// Pin the date forecasts are made on instead of the local clock
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    async fn run(&self, entity: &str, horizon: usize) -> Result<String> {
        let (start, end) = history_window(self.today(), self.lookback_days);
        let points = match self.source.daily_closes(&self.database, entity, start, end).await {
            Ok(points) => points,
            Err(e) => return Ok(format!("Failed to load price history for {entity}: {e}")),
        };
        let history = History::from_points(&points);
        info!(
            entity,
            fetched = points.len(),
            usable = history.len(),
            %start,
            %end,
            "Loaded price history"
        );

        let forecast = match self.forecaster.forecast(entity, &history, horizon) {
            Ok(forecast) => forecast,
            Err(e @ StockQueryError::InsufficientData { .. }) => return Ok(e.to_string()),
            Err(e @ StockQueryError::InvalidParameters(_)) => return Err(e),
            Err(e) => return Ok(fit_failure(&e)),
        };

        let chart = forecast_chart(entity, &history, &forecast);
        let artifact = match self.artifacts.save(&format!("arima_{entity}"), &chart) {
            Ok(artifact) => artifact,
            Err(e) => return Ok(fit_failure(&e)),
        };

        Ok(format!(
            "{}\n\n{}",
            render::markdown(&forecast_table(&forecast)),
            artifact.markdown(CHART_ALT)
        ))
    }
}

fn fit_failure(error: &StockQueryError) -> String {
    format!("ARIMA modeling or forecasting failed: {error}")
}

#[async_trait]
impl Tool for ArimaStockTool {
    async fn execute(&self, params: Value, _context: &mut Context) -> AgentResult<String> {
        let params: ArimaParams = parse_params(params)?;
        let entity = params.ts_code.trim();
        if entity.is_empty() {
            return Err(agent_core::Error::InvalidParameters(
                "ts_code must not be empty".to_string(),
            ));
        }
        let horizon = params.n.steps()?;
        self.forecaster.check_horizon(horizon)?;

        Ok(self.run(entity, horizon).await?)
    }

    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Forecast the next n daily closing prices of a stock with an ARIMA(5,1,5) model \
         fitted on the past year of closes. Returns a forecast table and a chart image \
         reference showing history and forecast."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "ts_code": schema::string("Stock code, e.g. 600519.SH"),
                "n": schema::integer("Number of future days to forecast"),
            }),
            &["ts_code", "n"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartFormat;
    use crate::source::{MockDataSource, PricePoint};
    use chrono::Days;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn closes(count: usize, first: NaiveDate) -> Vec<PricePoint> {
        (0..count)
            .map(|i| {
                let noise = ((i * 7919 + 13) % 101) as f64 / 101.0 - 0.5;
                let close = 1650.0 + 0.3 * i as f64 + 30.0 * (i as f64 / 15.0).sin() + 5.0 * noise;
                let day = first + Days::new(i as u64);
                PricePoint::new(day.format("%Y-%m-%d").to_string(), Some(close))
            })
            .collect()
    }

    fn tool(source: MockDataSource, dir: &TempDir) -> ArimaStockTool {
        ArimaStockTool::new(
            Arc::new(source),
            ArtifactStore::new(dir.path(), ChartFormat::Svg),
            &AssistantConfig::default(),
        )
        .with_today(date("2025-06-30"))
    }

    fn serving(points: Vec<PricePoint>) -> MockDataSource {
        let mut source = MockDataSource::new();
        source
            .expect_daily_closes()
            .withf(|database, entity, start, end| {
                database == "stock"
                    && entity == "600519.SH"
                    && *start == NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
                    && *end == NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
            })
            .times(1)
            .returning(move |_, _, _, _| Ok(points.clone()));
        source
    }

    #[tokio::test]
    async fn test_forecast_output() {
        let dir = TempDir::new().unwrap();
        let tool = tool(serving(closes(365, date("2024-06-30"))), &dir);

        let output = tool
            .execute(json!({"ts_code": "600519.SH", "n": 5}), &mut Context::new())
            .await
            .unwrap();

        let (table, image) = output.split_once("\n\n").unwrap();
        assert!(table.lines().next().unwrap().contains("forecast_date"));
        assert_eq!(table.lines().count(), 2 + 5);
        assert!(table.contains("2025-06-30"));
        assert!(image.starts_with("![ARIMA forecast](image_show/arima_600519.SH_"));
        assert_eq!(std::fs::read_dir(dir.path().join("image_show")).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_insufficient_history_is_reported() {
        let dir = TempDir::new().unwrap();
        let tool = tool(serving(closes(29, date("2025-05-01"))), &dir);

        let output = tool
            .execute(json!({"ts_code": "600519.SH", "n": 5}), &mut Context::new())
            .await
            .unwrap();

        assert!(output.starts_with("Insufficient history for 600519.SH"), "{output}");
        assert!(!dir.path().join("image_show").exists());
    }

    #[tokio::test]
    async fn test_string_horizon() {
        let dir = TempDir::new().unwrap();
        let tool = tool(serving(closes(60, date("2025-04-01"))), &dir);

        let output = tool
            .execute(json!(r#"{"ts_code": "600519.SH", "n": "3"}"#), &mut Context::new())
            .await
            .unwrap();
        let (table, _) = output.split_once("\n\n").unwrap();
        assert_eq!(table.lines().count(), 2 + 3);
    }

    #[tokio::test]
    async fn test_invalid_horizon_skips_query() {
        let dir = TempDir::new().unwrap();
        let tool = tool(MockDataSource::new(), &dir);

        for n in [json!(0), json!(-2), json!(400), json!("soon")] {
            let result = tool
                .execute(json!({"ts_code": "600519.SH", "n": n}), &mut Context::new())
                .await;
            assert!(matches!(result, Err(agent_core::Error::InvalidParameters(_))), "{n}");
        }
    }

    #[tokio::test]
    async fn test_flat_history_forecasts_last_close() {
        let dir = TempDir::new().unwrap();
        let flat: Vec<PricePoint> = closes(100, date("2025-01-01"))
            .into_iter()
            .map(|p| PricePoint::new(p.trade_date, Some(88.0)))
            .collect();
        let tool = tool(serving(flat), &dir);

        let output = tool
            .execute(json!({"ts_code": "600519.SH", "n": 2}), &mut Context::new())
            .await
            .unwrap();
        let (table, _) = output.split_once("\n\n").unwrap();
        let rows: Vec<&str> = table.lines().skip(2).collect();
        assert_eq!(rows.len(), 2, "{output}");
        assert!(rows.iter().all(|row| row.contains("| 88 ")), "{output}");
    }

    #[tokio::test]
    async fn test_source_errors_become_text() {
        let dir = TempDir::new().unwrap();
        let mut source = MockDataSource::new();
        source
            .expect_daily_closes()
            .returning(|_, _, _, _| Err(StockQueryError::Connection("pool timed out".to_string())));
        let tool = tool(source, &dir);

        let output = tool
            .execute(json!({"ts_code": "000001.SZ", "n": 2}), &mut Context::new())
            .await
            .unwrap();
        assert!(output.starts_with("Failed to load price history for 000001.SZ"));
    }
}
