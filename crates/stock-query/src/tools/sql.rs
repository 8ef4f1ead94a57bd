//! SQL execution tool with automatic visualization

use super::parse_params;
use crate::artifact::ArtifactStore;
use crate::chart::select_chart;
use crate::error::Result;
use crate::render;
use crate::session::LAST_RESULT;
use crate::source::DataSource;
use crate::stats::describe;
use crate::table::Table;
use agent_core::{Context, Result as AgentResult};
use agent_tools::{Tool, schema};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

pub const NAME: &str = "exc_sql";
const CHART_PREFIX: &str = "stock";
const CHART_ALT: &str = "Stock data chart";

/// Runs a SQL statement and renders the result for the conversation
///
/// Output is the result table (head and tail when long), followed for
/// multi-row results by summary statistics and a chart reference.
pub struct ExcSqlTool {
    source: Arc<dyn DataSource>,
    artifacts: ArtifactStore,
    default_database: String,
}

#[derive(Debug, Deserialize)]
struct ExcSqlParams {
    sql_input: String,
    #[serde(default = "default_visualize")]
    need_visualize: bool,
    #[serde(default)]
    database: Option<String>,
}

fn default_visualize() -> bool {
    true
}

impl ExcSqlTool {
    pub fn new(
        source: Arc<dyn DataSource>,
        artifacts: ArtifactStore,
        default_database: impl Into<String>,
    ) -> Self {
        Self {
            source,
            artifacts,
            default_database: default_database.into(),
        }
    }

    async fn run(&self, params: ExcSqlParams, context: &mut Context) -> Result<String> {
        let database = params.database.as_deref().unwrap_or(&self.default_database);
        let table = self.source.query(database, &params.sql_input).await?;
        remember(context, &table);

        let preview = render::preview(&table);
        if table.row_count() == 1 || !params.need_visualize {
            return Ok(preview);
        }

        let summary = render::markdown(&describe(&table));
        let artifact = self.artifacts.save(CHART_PREFIX, &select_chart(&table))?;
        debug!(rows = table.row_count(), chart = %artifact.reference, "Rendered SQL result");

        Ok(format!(
            "{preview}\n\n{summary}\n\n{}",
            artifact.markdown(CHART_ALT)
        ))
    }
}

fn remember(context: &mut Context, table: &Table) {
    if let Err(e) = context.insert_typed(LAST_RESULT, table) {
        warn!(error = %e, "Could not store query result in session");
    }
}

#[async_trait]
impl Tool for ExcSqlTool {
    async fn execute(&self, params: Value, context: &mut Context) -> AgentResult<String> {
        let params: ExcSqlParams = parse_params(params)?;
        match self.run(params, context).await {
            Ok(output) => Ok(output),
            Err(e) => Ok(format!("SQL execution or visualization failed: {e}")),
        }
    }

    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Run a SQL statement against the stock database and return the result as a \
         markdown table. Results longer than 10 rows show the first and last 5 rows. \
         For multi-row results the output also contains summary statistics and a chart \
         image reference unless need_visualize is false."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "sql_input": schema::string("SQL statement to execute"),
                "need_visualize": schema::with_default(
                    schema::boolean("Add summary statistics and a chart for multi-row results"),
                    json!(true),
                ),
                "database": schema::with_default(
                    schema::string("Database to run the statement in"),
                    json!(self.default_database),
                ),
            }),
            &["sql_input"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartFormat;
    use crate::error::StockQueryError;
    use crate::source::MockDataSource;
    use crate::table::Cell;
    use tempfile::TempDir;

    fn prices(rows: usize) -> Table {
        let mut table = Table::new(["trade_date", "close"]);
        for i in 0..rows {
            table.push_row(vec![
                Cell::Text(format!("2024-05-{:02}", i + 1)),
                Cell::Number(1700.0 + i as f64),
            ]);
        }
        table
    }

    fn tool(source: MockDataSource, dir: &TempDir) -> ExcSqlTool {
        ExcSqlTool::new(
            Arc::new(source),
            ArtifactStore::new(dir.path(), ChartFormat::Svg),
            "stock",
        )
    }

    fn returning(table: Table) -> MockDataSource {
        let mut source = MockDataSource::new();
        source
            .expect_query()
            .withf(|database, sql| database == "stock" && sql.starts_with("SELECT"))
            .times(1)
            .returning(move |_, _| Ok(table.clone()));
        source
    }

    #[tokio::test]
    async fn test_multi_row_result_has_table_stats_and_chart() {
        let dir = TempDir::new().unwrap();
        let tool = tool(returning(prices(5)), &dir);
        let mut ctx = Context::for_session("s");

        let output = tool
            .execute(json!({"sql_input": "SELECT trade_date, close FROM stock_price"}), &mut ctx)
            .await
            .unwrap();

        let sections: Vec<&str> = output.split("\n\n").collect();
        assert_eq!(sections.len(), 3, "{output}");
        assert!(sections[0].contains("2024-05-05"));
        assert!(sections[1].contains("mean"));
        assert!(sections[2].starts_with("![Stock data chart](image_show/stock_"));

        let files: Vec<_> = std::fs::read_dir(dir.path().join("image_show")).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_single_row_is_table_only() {
        let dir = TempDir::new().unwrap();
        let tool = tool(returning(prices(1)), &dir);
        let mut ctx = Context::new();

        let output = tool
            .execute(json!({"sql_input": "SELECT trade_date, close FROM stock_price LIMIT 1"}), &mut ctx)
            .await
            .unwrap();

        assert_eq!(output, render::markdown(&prices(1)));
        assert!(!dir.path().join("image_show").exists());
    }

    #[tokio::test]
    async fn test_empty_result_keeps_header() {
        let dir = TempDir::new().unwrap();
        let tool = tool(returning(prices(0)), &dir);
        let mut ctx = Context::new();

        let output = tool
            .execute(
                json!({"sql_input": "SELECT trade_date, close FROM stock_price WHERE ts_code = 'NONE'"}),
                &mut ctx,
            )
            .await
            .unwrap();

        let sections: Vec<&str> = output.split("\n\n").collect();
        assert_eq!(sections.len(), 3, "{output}");

        let header = sections[0].lines().next().unwrap();
        assert!(header.contains("trade_date") && header.contains("close"), "{output}");
        assert_eq!(sections[0].matches("trade_date").count(), 1);

        let count = sections[1].lines().find(|l| l.contains("count")).unwrap();
        assert_eq!(count.matches(" 0 ").count(), 2, "{count}");

        assert!(sections[2].starts_with("![Stock data chart](image_show/stock_"));
        let files: Vec<_> = std::fs::read_dir(dir.path().join("image_show"))
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        let scene = std::fs::read_to_string(&files[0]).unwrap();
        assert!(scene.contains(crate::chart::NO_DATA_MESSAGE));
    }

    #[tokio::test]
    async fn test_visualization_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let tool = tool(returning(prices(4)), &dir);
        let mut ctx = Context::new();

        let output = tool
            .execute(
                json!({"sql_input": "SELECT trade_date, close FROM stock_price", "need_visualize": false}),
                &mut ctx,
            )
            .await
            .unwrap();

        assert!(!output.contains("!["));
        assert!(!output.contains("mean"));
    }

    #[tokio::test]
    async fn test_result_is_stored_in_context() {
        let dir = TempDir::new().unwrap();
        let tool = tool(returning(prices(3)), &dir);
        let mut ctx = Context::for_session("s");

        tool.execute(json!({"sql_input": "SELECT 1"}), &mut ctx)
            .await
            .unwrap();

        let stored: Option<Table> = ctx.get_typed(LAST_RESULT).unwrap();
        assert_eq!(stored, Some(prices(3)));
    }

    #[tokio::test]
    async fn test_explicit_database() {
        let dir = TempDir::new().unwrap();
        let mut source = MockDataSource::new();
        source
            .expect_query()
            .withf(|database, _| database == "archive")
            .returning(|_, _| Ok(Table::default()));
        let tool = tool(source, &dir);

        let output = tool
            .execute(json!({"sql_input": "SELECT 1", "database": "archive", "need_visualize": false}), &mut Context::new())
            .await
            .unwrap();
        assert!(!output.starts_with("SQL execution"));
    }

    #[tokio::test]
    async fn test_query_errors_become_text() {
        let dir = TempDir::new().unwrap();
        let mut source = MockDataSource::new();
        source
            .expect_query()
            .returning(|_, _| Err(StockQueryError::Query("Unknown column 'x'".to_string())));
        let tool = tool(source, &dir);

        let output = tool
            .execute(json!({"sql_input": "SELECT x"}), &mut Context::new())
            .await
            .unwrap();
        assert_eq!(
            output,
            "SQL execution or visualization failed: Query error: Unknown column 'x'"
        );
    }

    #[tokio::test]
    async fn test_missing_sql_is_invalid() {
        let dir = TempDir::new().unwrap();
        let tool = tool(MockDataSource::new(), &dir);
        let result = tool.execute(json!({}), &mut Context::new()).await;
        assert!(matches!(result, Err(agent_core::Error::InvalidParameters(_))));
    }

    #[test]
    fn test_schema_defaults() {
        let dir = TempDir::new().unwrap();
        let tool = tool(MockDataSource::new(), &dir);
        let schema = tool.input_schema();
        assert_eq!(schema["required"], json!(["sql_input"]));
        assert_eq!(schema["properties"]["need_visualize"]["default"], json!(true));
        assert_eq!(schema["properties"]["database"]["default"], json!("stock"));
    }
}
