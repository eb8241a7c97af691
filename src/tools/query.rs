//! Arbitrary SQL execution tool.
//!
//! Implements `postgres_execute_query`. The statement text is caller-supplied
//! and runs as-is against the named connection; `fetch_results` selects
//! between fetching a (limited) result set and reporting rows affected.

use crate::db::{ConnectionRegistry, StatementExecutor};
use crate::error::PgResult;
use crate::models::{DEFAULT_QUERY_ROW_LIMIT, MAX_ROW_LIMIT, StatementOutcome};
use crate::tools::format::{render_query_result, render_rows_affected};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

fn default_connection_name() -> String {
    crate::models::DEFAULT_CONNECTION_NAME.to_string()
}

fn default_fetch_results() -> bool {
    true
}

fn default_limit() -> u32 {
    DEFAULT_QUERY_ROW_LIMIT
}

/// Input for the postgres_execute_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteQueryInput {
    /// SQL statement to execute
    pub query: String,
    /// Name of the connection to use. Default: "default"
    #[serde(default = "default_connection_name")]
    pub connection_name: String,
    /// Fetch and return result rows. Set false for statements without a
    /// result set. Default: true
    #[serde(default = "default_fetch_results")]
    pub fetch_results: bool,
    /// Maximum rows to return. Default: 1000, max: 10000
    #[serde(default = "default_limit")]
    pub limit: u32,
}

/// Handler for arbitrary SQL execution.
pub struct QueryToolHandler {
    registry: Arc<ConnectionRegistry>,
    executor: StatementExecutor,
}

impl QueryToolHandler {
    pub fn new(registry: Arc<ConnectionRegistry>, executor: StatementExecutor) -> Self {
        Self { registry, executor }
    }

    pub async fn execute_query(&self, input: ExecuteQueryInput) -> PgResult<String> {
        let pool = self.registry.get(&input.connection_name).await?;
        let limit = input.limit.clamp(1, MAX_ROW_LIMIT);

        let outcome = self
            .executor
            .execute(&pool, &input.query, &[], input.fetch_results, Some(limit))
            .await?;

        match outcome {
            StatementOutcome::Rows(result) => {
                info!(
                    connection_name = %input.connection_name,
                    row_count = result.row_count(),
                    truncated = result.truncated,
                    execution_time_ms = result.execution_time_ms,
                    "Query executed"
                );
                Ok(render_query_result(&result, limit))
            }
            StatementOutcome::RowsAffected {
                count,
                execution_time_ms,
            } => {
                info!(
                    connection_name = %input.connection_name,
                    rows_affected = count,
                    execution_time_ms = execution_time_ms,
                    "Statement executed"
                );
                Ok(render_rows_affected(count))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_query_input_defaults() {
        let input: ExecuteQueryInput =
            serde_json::from_str(r#"{"query": "SELECT 1"}"#).unwrap();
        assert_eq!(input.connection_name, "default");
        assert!(input.fetch_results);
        assert_eq!(input.limit, 1000);
    }

    #[test]
    fn test_execute_query_input_explicit() {
        let json = r#"{
            "query": "DELETE FROM t",
            "connection_name": "staging",
            "fetch_results": false,
            "limit": 50
        }"#;
        let input: ExecuteQueryInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.connection_name, "staging");
        assert!(!input.fetch_results);
        assert_eq!(input.limit, 50);
    }
}
