//! Relational data sources the tools query
//!
//! Tools only see the [`DataSource`] trait; [`MySqlSource`] is the production
//! implementation and tests substitute mocks.

pub mod mysql;

pub use mysql::MySqlSource;

use crate::error::{Result, StockQueryError};
use crate::table::Table;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

/// One daily close as stored in the price table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trade date as stored (`YYYY-MM-DD`)
    pub trade_date: String,
    /// Close price; `None` when the stored value is NULL or not numeric
    pub close: Option<f64>,
}

impl PricePoint {
    pub fn new(trade_date: impl Into<String>, close: Option<f64>) -> Self {
        Self {
            trade_date: trade_date.into(),
            close,
        }
    }
}

/// A relational store that can run statements and serve price history
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Run an arbitrary SQL statement against `database`
    async fn query(&self, database: &str, sql: &str) -> Result<Table>;

    /// Daily closes of `entity` with `start <= trade_date < end`, ascending by date
    async fn daily_closes(
        &self,
        database: &str,
        entity: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>>;
}

/// Stand-in used when no database is configured; every call fails
///
/// Lets tool definitions and the system prompt be produced offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl Unconfigured {
    fn error() -> StockQueryError {
        StockQueryError::Connection("no database configured (set STOCK_QUERY_DATABASE_URL)".to_string())
    }
}

#[async_trait]
impl DataSource for Unconfigured {
    async fn query(&self, _database: &str, _sql: &str) -> Result<Table> {
        Err(Self::error())
    }

    async fn daily_closes(
        &self,
        _database: &str,
        _entity: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        Err(Self::error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_source_fails() {
        let result = Unconfigured.query("stock", "SELECT 1").await;
        assert!(matches!(result, Err(StockQueryError::Connection(_))));
    }
}
