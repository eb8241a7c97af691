//! Schema introspection tools.
//!
//! Implements `postgres_list_tables` and `postgres_describe_table` via
//! `information_schema` queries with bound parameters.

use crate::db::{ConnectionRegistry, StatementExecutor, statements};
use crate::error::{PgError, PgResult};
use crate::models::{BindValue, DEFAULT_SCHEMA, MAX_ROW_LIMIT, StatementOutcome};
use crate::tools::format::format_as_table;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

fn default_connection_name() -> String {
    crate::models::DEFAULT_CONNECTION_NAME.to_string()
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

/// Input for the postgres_list_tables tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// Name of the connection to use. Default: "default"
    #[serde(default = "default_connection_name")]
    pub connection_name: String,
    /// Schema to list tables from. Default: "public"
    #[serde(default = "default_schema")]
    pub schema: String,
}

/// Input for the postgres_describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Table to describe
    pub table_name: String,
    /// Name of the connection to use. Default: "default"
    #[serde(default = "default_connection_name")]
    pub connection_name: String,
    /// Schema containing the table. Default: "public"
    #[serde(default = "default_schema")]
    pub schema: String,
}

/// Handler for schema introspection.
pub struct SchemaToolHandler {
    registry: Arc<ConnectionRegistry>,
    executor: StatementExecutor,
}

impl SchemaToolHandler {
    pub fn new(registry: Arc<ConnectionRegistry>, executor: StatementExecutor) -> Self {
        Self { registry, executor }
    }

    pub async fn list_tables(&self, input: ListTablesInput) -> PgResult<String> {
        let pool = self.registry.get(&input.connection_name).await?;
        let params = vec![BindValue::String(input.schema.clone())];

        let outcome = self
            .executor
            .execute(
                &pool,
                statements::list_tables_sql(),
                &params,
                true,
                Some(MAX_ROW_LIMIT),
            )
            .await?;

        let result = match outcome {
            StatementOutcome::Rows(result) => result,
            StatementOutcome::RowsAffected { .. } => {
                return Err(PgError::internal("list_tables produced no result set"));
            }
        };

        if result.is_empty() {
            return Ok(format!("No tables found in schema '{}'", input.schema));
        }

        Ok(format!(
            "Tables in schema '{}' ({}):\n\n{}",
            input.schema,
            result.row_count(),
            format_as_table(&result)
        ))
    }

    pub async fn describe_table(&self, input: DescribeTableInput) -> PgResult<String> {
        let pool = self.registry.get(&input.connection_name).await?;
        let params = vec![
            BindValue::String(input.schema.clone()),
            BindValue::String(input.table_name.clone()),
        ];

        let outcome = self
            .executor
            .execute(
                &pool,
                statements::describe_table_sql(),
                &params,
                true,
                Some(MAX_ROW_LIMIT),
            )
            .await?;

        let result = match outcome {
            StatementOutcome::Rows(result) => result,
            StatementOutcome::RowsAffected { .. } => {
                return Err(PgError::internal("describe_table produced no result set"));
            }
        };

        if result.is_empty() {
            return Err(PgError::invalid_input(format!(
                "Table '{}.{}' does not exist",
                input.schema, input.table_name
            )));
        }

        Ok(format!(
            "Table '{}.{}' ({} columns):\n\n{}",
            input.schema,
            input.table_name,
            result.row_count(),
            format_as_table(&result)
        ))
    }
}
