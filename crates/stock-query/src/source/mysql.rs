//! MySQL-backed data source

use super::{DataSource, PricePoint};
use crate::config::{AssistantConfig, is_identifier};
use crate::error::{Result, StockQueryError};
use crate::table::{Cell, Table};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Executor, Row, TypeInfo};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Data source over a MySQL server
///
/// One bounded pool is created lazily per database name and shared by every
/// caller in the process. Exhausting a pool surfaces as a connection timeout;
/// nothing is retried.
pub struct MySqlSource {
    base_options: MySqlConnectOptions,
    price_table: String,
    max_connections: u32,
    connect_timeout: Duration,
    pools: RwLock<HashMap<String, MySqlPool>>,
}

impl MySqlSource {
    /// Create a source from the assistant configuration
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        let url = config.database_url.as_deref().ok_or_else(|| {
            StockQueryError::Config("STOCK_QUERY_DATABASE_URL is not set".to_string())
        })?;
        let base_options = MySqlConnectOptions::from_str(url)?.charset("utf8mb4");

        Ok(Self {
            base_options,
            price_table: config.price_table.clone(),
            max_connections: config.max_connections,
            connect_timeout: config.connect_timeout,
            pools: RwLock::new(HashMap::new()),
        })
    }

    /// Pool for `database`, created on first use
    fn pool(&self, database: &str) -> Result<MySqlPool> {
        if !is_identifier(database) {
            return Err(StockQueryError::InvalidParameters(format!(
                "'{database}' is not a valid database name"
            )));
        }

        if let Some(pool) = self
            .pools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(database)
        {
            return Ok(pool.clone());
        }

        let mut pools = self.pools.write().unwrap_or_else(PoisonError::into_inner);
        let pool = pools
            .entry(database.to_string())
            .or_insert_with(|| {
                debug!(database, max_connections = self.max_connections, "Creating pool");
                MySqlPoolOptions::new()
                    .max_connections(self.max_connections)
                    .acquire_timeout(self.connect_timeout)
                    .connect_lazy_with(self.base_options.clone().database(database))
            })
            .clone();
        Ok(pool)
    }
}

#[async_trait]
impl DataSource for MySqlSource {
    async fn query(&self, database: &str, sql: &str) -> Result<Table> {
        let pool = self.pool(database)?;
        let sql_preview: String = sql.chars().take(300).collect();
        debug!(database, sql = %sql_preview, "Running query");

        let start = Instant::now();
        let rows = sqlx::query(sql).fetch_all(&pool).await?;
        let columns = match rows.first() {
            Some(first) => column_names(first.columns()),
            // No row to read the header from; ask the server for the statement's columns
            None => column_names((&pool).describe(sql).await?.columns()),
        };
        let table = rows_to_table(columns, &rows);

        info!(
            database,
            rows = table.row_count(),
            columns = table.column_count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Query completed"
        );
        Ok(table)
    }

    async fn daily_closes(
        &self,
        database: &str,
        entity: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        let pool = self.pool(database)?;
        let sql = format!(
            "SELECT trade_date, close FROM {} \
             WHERE ts_code = ? AND trade_date >= ? AND trade_date < ? \
             ORDER BY trade_date ASC",
            self.price_table
        );

        let rows = sqlx::query(&sql)
            .bind(entity)
            .bind(start.format("%Y-%m-%d").to_string())
            .bind(end.format("%Y-%m-%d").to_string())
            .fetch_all(&pool)
            .await?;

        let points: Vec<PricePoint> = rows
            .iter()
            .map(|row| PricePoint {
                trade_date: decode_cell(row, 0).to_string(),
                close: decode_cell(row, 1).as_f64(),
            })
            .collect();

        info!(entity, %start, %end, points = points.len(), "Fetched daily closes");
        Ok(points)
    }
}

fn column_names<C: Column>(columns: &[C]) -> Vec<String> {
    columns.iter().map(|c| c.name().to_string()).collect()
}

fn rows_to_table(columns: Vec<String>, rows: &[MySqlRow]) -> Table {
    let mut table = Table::new(columns);
    for row in rows {
        table.push_row((0..row.columns().len()).map(|i| decode_cell(row, i)).collect());
    }
    table
}

/// Decode `Option<T>` at `index`; `None` when the column type is incompatible
fn try_decode<'r, T>(row: &'r MySqlRow, index: usize) -> Option<Option<T>>
where
    T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
{
    row.try_get::<Option<T>, _>(index).ok()
}

fn number<T: Into<f64>>(value: Option<T>) -> Cell {
    value.map_or(Cell::Null, |v| Cell::Number(v.into()))
}

fn decode_cell(row: &MySqlRow, index: usize) -> Cell {
    let type_name = row.columns()[index].type_info().name().to_ascii_uppercase();
    let unsigned = type_name.ends_with("UNSIGNED");
    let base = type_name.split_whitespace().next().unwrap_or_default();

    let decoded = match base {
        "NULL" => Some(Cell::Null),
        "BOOLEAN" => try_decode::<bool>(row, index).map(|v| number(v.map(u8::from))),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" if unsigned => {
            try_decode::<u64>(row, index).map(|v| number(v.map(|n| n as f64)))
        }
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            try_decode::<i64>(row, index).map(|v| number(v.map(|n| n as f64)))
        }
        "FLOAT" | "DOUBLE" => try_decode::<f64>(row, index).map(number),
        "DECIMAL" => try_decode::<Decimal>(row, index)
            .map(|v| v.and_then(|d| d.to_f64()).map_or(Cell::Null, Cell::Number)),
        "DATE" => try_decode::<NaiveDate>(row, index).map(|v| v.map_or(Cell::Null, Cell::Date)),
        "DATETIME" | "TIMESTAMP" => try_decode::<NaiveDateTime>(row, index).map(|v| {
            v.map_or(Cell::Null, |dt| {
                Cell::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string())
            })
        }),
        "TIME" => try_decode::<NaiveTime>(row, index)
            .map(|v| v.map_or(Cell::Null, |t| Cell::Text(t.format("%H:%M:%S").to_string()))),
        "JSON" => try_decode::<serde_json::Value>(row, index)
            .map(|v| v.map_or(Cell::Null, |j| Cell::Text(j.to_string()))),
        _ => None,
    };

    decoded.unwrap_or_else(|| decode_text(row, index, &type_name))
}

fn decode_text(row: &MySqlRow, index: usize, type_name: &str) -> Cell {
    if let Some(value) = try_decode::<String>(row, index) {
        return value.map_or(Cell::Null, Cell::Text);
    }
    if let Some(bytes) = try_decode::<Vec<u8>>(row, index) {
        return bytes.map_or(Cell::Null, |b| {
            Cell::Text(String::from_utf8_lossy(&b).into_owned())
        });
    }
    debug!(column = index, type_name, "Undecodable column value");
    Cell::Null
}
