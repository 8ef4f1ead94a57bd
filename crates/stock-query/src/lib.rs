//! Stock price query, visualization and forecasting tools for chat agents
//!
//! The crate exposes two tools over a MySQL `stock_price` table:
//!
//! - `exc_sql` runs a SQL statement and answers with a markdown table, summary
//!   statistics and an automatically chosen chart
//! - `arima_stock` fits an ARIMA(5,1,5) model on the past year of closes of
//!   one stock and answers with a forecast table and chart
//!
//! [`StockAssistant`] wires both into a [`agent_tools::ToolDispatcher`] with
//! per-session state, and renders the system prompt the chat agent runs with.
//!
//! # Example
//!
//! ```no_run
//! use stock_query::{AssistantConfig, StockAssistant};
//! use serde_json::json;
//!
//! # async fn example() -> stock_query::Result<()> {
//! let assistant = StockAssistant::connect(AssistantConfig::from_env()?)?;
//! let output = assistant
//!     .call("session-1", "arima_stock", json!({"ts_code": "600519.SH", "n": 5}))
//!     .await;
//! println!("{output}");
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod assistant;
pub mod chart;
pub mod config;
pub mod error;
pub mod forecast;
pub mod prompts;
pub mod render;
pub mod session;
pub mod source;
pub mod stats;
pub mod table;
pub mod tools;

pub use artifact::{Artifact, ArtifactStore};
pub use assistant::StockAssistant;
pub use chart::{Chart, ChartKind, ChartSpec, select_chart};
pub use config::{ArimaOrder, AssistantConfig, ChartFormat};
pub use error::{Result, StockQueryError};
pub use forecast::{ForecastPoint, Forecaster, History};
pub use session::SessionStore;
pub use source::{DataSource, MySqlSource, PricePoint};
pub use table::{Cell, Table};
pub use tools::{ArimaStockTool, ExcSqlTool};
