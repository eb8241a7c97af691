//! Table lifecycle tools.
//!
//! Implements `postgres_create_table`, `postgres_drop_table`, and
//! `postgres_backup_table`.

use crate::db::{ConnectionRegistry, StatementExecutor, statements};
use crate::error::{PgError, PgResult};
use crate::models::{ColumnSpec, DEFAULT_SCHEMA, StatementOutcome};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

fn default_connection_name() -> String {
    crate::models::DEFAULT_CONNECTION_NAME.to_string()
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_true() -> bool {
    true
}

/// Input for the postgres_create_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateTableInput {
    /// Table to create
    pub table_name: String,
    /// Column definitions
    pub columns: Vec<ColumnSpec>,
    /// Name of the connection to use. Default: "default"
    #[serde(default = "default_connection_name")]
    pub connection_name: String,
    /// Schema to create the table in. Default: "public"
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Add IF NOT EXISTS. Default: true
    #[serde(default = "default_true")]
    pub if_not_exists: bool,
}

/// Input for the postgres_drop_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DropTableInput {
    /// Table to drop
    pub table_name: String,
    /// Name of the connection to use. Default: "default"
    #[serde(default = "default_connection_name")]
    pub connection_name: String,
    /// Schema containing the table. Default: "public"
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Add IF EXISTS. Default: true
    #[serde(default = "default_true")]
    pub if_exists: bool,
    /// Add CASCADE. Default: false
    #[serde(default)]
    pub cascade: bool,
}

/// Input for the postgres_backup_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BackupTableInput {
    /// Table to copy
    pub table_name: String,
    /// Name of the new table holding the copy
    pub backup_table_name: String,
    /// Name of the connection to use. Default: "default"
    #[serde(default = "default_connection_name")]
    pub connection_name: String,
    /// Schema containing both tables. Default: "public"
    #[serde(default = "default_schema")]
    pub schema: String,
}

/// Handler for table lifecycle tools.
pub struct TableToolHandler {
    registry: Arc<ConnectionRegistry>,
    executor: StatementExecutor,
    strict_clauses: bool,
}

impl TableToolHandler {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        executor: StatementExecutor,
        strict_clauses: bool,
    ) -> Self {
        Self {
            registry,
            executor,
            strict_clauses,
        }
    }

    pub async fn create_table(&self, input: CreateTableInput) -> PgResult<String> {
        if self.strict_clauses {
            for col in &input.columns {
                if col.default.as_deref().map(|d| !d.trim().is_empty()).unwrap_or(false) {
                    return Err(PgError::invalid_input(
                        "Raw SQL fragment 'default' is not allowed in strict mode",
                    ));
                }
            }
        }

        let sql = statements::create_table_sql(
            &input.schema,
            &input.table_name,
            &input.columns,
            input.if_not_exists,
        )?;

        let pool = self.registry.get(&input.connection_name).await?;
        self.executor.execute(&pool, &sql, &[], false, None).await?;

        info!(
            connection_name = %input.connection_name,
            table = %input.table_name,
            columns = input.columns.len(),
            "Table created"
        );

        Ok(format!(
            "Table '{}.{}' created successfully",
            input.schema, input.table_name
        ))
    }

    pub async fn drop_table(&self, input: DropTableInput) -> PgResult<String> {
        let sql = statements::drop_table_sql(
            &input.schema,
            &input.table_name,
            input.if_exists,
            input.cascade,
        )?;

        let pool = self.registry.get(&input.connection_name).await?;
        self.executor.execute(&pool, &sql, &[], false, None).await?;

        info!(
            connection_name = %input.connection_name,
            table = %input.table_name,
            cascade = input.cascade,
            "Table dropped"
        );

        Ok(format!(
            "Table '{}.{}' dropped successfully",
            input.schema, input.table_name
        ))
    }

    pub async fn backup_table(&self, input: BackupTableInput) -> PgResult<String> {
        let sql = statements::backup_table_sql(
            &input.schema,
            &input.table_name,
            &input.backup_table_name,
        )?;

        let pool = self.registry.get(&input.connection_name).await?;
        let outcome = self.executor.execute(&pool, &sql, &[], false, None).await?;

        let copied = match outcome {
            StatementOutcome::RowsAffected { count, .. } => count,
            StatementOutcome::Rows(result) => result.row_count() as u64,
        };

        info!(
            connection_name = %input.connection_name,
            source = %input.table_name,
            backup = %input.backup_table_name,
            rows = copied,
            "Table backed up"
        );

        let row_text = if copied == 1 { "row" } else { "rows" };
        Ok(format!(
            "Successfully backed up table '{}.{}' to '{}.{}' ({} {})",
            input.schema,
            input.table_name,
            input.schema,
            input.backup_table_name,
            copied,
            row_text
        ))
    }
}
