//! Row-level data tools.
//!
//! Implements `postgres_table_data`, `postgres_insert_data`,
//! `postgres_update_data`, and `postgres_delete_data`. Row values are always
//! bound; WHERE / ORDER BY / ON CONFLICT fragments are interpolated under the
//! trusted-caller model and rejected outright in strict mode.

use crate::db::{ConnectionRegistry, StatementExecutor, statements};
use crate::error::{PgError, PgResult};
use crate::models::{
    BindValue, DEFAULT_SCHEMA, DEFAULT_TABLE_DATA_LIMIT, MAX_ROW_LIMIT, StatementOutcome,
};
use crate::tools::format::format_as_table;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

fn default_connection_name() -> String {
    crate::models::DEFAULT_CONNECTION_NAME.to_string()
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_table_data_limit() -> u32 {
    DEFAULT_TABLE_DATA_LIMIT
}

/// Input for the postgres_table_data tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TableDataInput {
    /// Table to read from
    pub table_name: String,
    /// Name of the connection to use. Default: "default"
    #[serde(default = "default_connection_name")]
    pub connection_name: String,
    /// Schema containing the table. Default: "public"
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Maximum rows to return. Default: 100, max: 10000
    #[serde(default = "default_table_data_limit")]
    pub limit: u32,
    /// Number of rows to skip. Default: 0
    #[serde(default)]
    pub offset: u64,
    /// Raw WHERE clause (without the WHERE keyword)
    #[serde(default)]
    pub where_clause: Option<String>,
    /// Raw ORDER BY expression (without the ORDER BY keywords)
    #[serde(default)]
    pub order_by: Option<String>,
}

/// Input for the postgres_insert_data tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InsertDataInput {
    /// Table to insert into
    pub table_name: String,
    /// A single row object or an array of row objects, column name to value
    pub data: JsonValue,
    /// Name of the connection to use. Default: "default"
    #[serde(default = "default_connection_name")]
    pub connection_name: String,
    /// Schema containing the table. Default: "public"
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Raw ON CONFLICT fragment, e.g. "(id) DO NOTHING"
    #[serde(default)]
    pub on_conflict: Option<String>,
}

/// Input for the postgres_update_data tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateDataInput {
    /// Table to update
    pub table_name: String,
    /// Object of column name to new value
    pub data: JsonValue,
    /// Raw WHERE clause (without the WHERE keyword); required
    pub where_clause: String,
    /// Name of the connection to use. Default: "default"
    #[serde(default = "default_connection_name")]
    pub connection_name: String,
    /// Schema containing the table. Default: "public"
    #[serde(default = "default_schema")]
    pub schema: String,
}

/// Input for the postgres_delete_data tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteDataInput {
    /// Table to delete from
    pub table_name: String,
    /// Raw WHERE clause (without the WHERE keyword); required
    pub where_clause: String,
    /// Name of the connection to use. Default: "default"
    #[serde(default = "default_connection_name")]
    pub connection_name: String,
    /// Schema containing the table. Default: "public"
    #[serde(default = "default_schema")]
    pub schema: String,
}

/// Handler for row-level data tools.
pub struct DataToolHandler {
    registry: Arc<ConnectionRegistry>,
    executor: StatementExecutor,
    strict_clauses: bool,
}

impl DataToolHandler {
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

    fn reject_fragment(&self, field: &str, fragment: Option<&str>) -> PgResult<()> {
        if self.strict_clauses
            && fragment.map(|f| !f.trim().is_empty()).unwrap_or(false)
        {
            return Err(PgError::invalid_input(format!(
                "Raw SQL fragment '{}' is not allowed in strict mode",
                field
            )));
        }
        Ok(())
    }

    pub async fn table_data(&self, input: TableDataInput) -> PgResult<String> {
        self.reject_fragment("where_clause", input.where_clause.as_deref())?;
        self.reject_fragment("order_by", input.order_by.as_deref())?;

        let pool = self.registry.get(&input.connection_name).await?;
        let limit = input.limit.clamp(1, MAX_ROW_LIMIT);
        let sql = statements::table_data_sql(
            &input.schema,
            &input.table_name,
            input.where_clause.as_deref(),
            input.order_by.as_deref(),
            limit,
            input.offset,
        )?;

        let outcome = self
            .executor
            .execute(&pool, &sql, &[], true, Some(limit))
            .await?;

        let result = match outcome {
            StatementOutcome::Rows(result) => result,
            StatementOutcome::RowsAffected { .. } => {
                return Err(PgError::internal("table_data produced no result set"));
            }
        };

        if result.is_empty() {
            return Ok(format!(
                "No data found in '{}.{}'",
                input.schema, input.table_name
            ));
        }

        Ok(format!(
            "Data from '{}.{}' ({} rows):\n\n{}",
            input.schema,
            input.table_name,
            result.row_count(),
            format_as_table(&result)
        ))
    }

    pub async fn insert_data(&self, input: InsertDataInput) -> PgResult<String> {
        self.reject_fragment("on_conflict", input.on_conflict.as_deref())?;

        let rows = normalize_rows(&input.data)?;
        let columns = row_columns(&rows)?;
        let bind_rows = bind_rows(&rows, &columns);

        let sql = statements::insert_sql(
            &input.schema,
            &input.table_name,
            &columns,
            input.on_conflict.as_deref(),
        )?;

        let pool = self.registry.get(&input.connection_name).await?;
        let inserted = self.executor.insert_rows(&pool, &sql, &bind_rows).await?;

        info!(
            connection_name = %input.connection_name,
            table = %input.table_name,
            rows = inserted,
            "Rows inserted"
        );

        let row_text = if inserted == 1 { "row" } else { "rows" };
        Ok(format!(
            "Successfully inserted {} {} into '{}.{}'",
            inserted, row_text, input.schema, input.table_name
        ))
    }

    pub async fn update_data(&self, input: UpdateDataInput) -> PgResult<String> {
        self.reject_fragment("where_clause", Some(&input.where_clause))?;

        let row = input.data.as_object().ok_or_else(|| {
            PgError::invalid_input("update_data 'data' must be an object of column: value")
        })?;
        if row.is_empty() {
            return Err(PgError::invalid_input(
                "update_data 'data' must not be empty",
            ));
        }

        let columns: Vec<String> = row.keys().cloned().collect();
        let params: Vec<BindValue> = columns
            .iter()
            .map(|col| BindValue::from(&row[col]))
            .collect();

        let sql = statements::update_sql(
            &input.schema,
            &input.table_name,
            &columns,
            &input.where_clause,
        )?;

        let pool = self.registry.get(&input.connection_name).await?;
        let outcome = self
            .executor
            .execute(&pool, &sql, &params, false, None)
            .await?;

        let count = rows_affected(outcome)?;
        info!(
            connection_name = %input.connection_name,
            table = %input.table_name,
            rows = count,
            "Rows updated"
        );

        let row_text = if count == 1 { "row" } else { "rows" };
        Ok(format!(
            "Successfully updated {} {} in '{}.{}'",
            count, row_text, input.schema, input.table_name
        ))
    }

    pub async fn delete_data(&self, input: DeleteDataInput) -> PgResult<String> {
        self.reject_fragment("where_clause", Some(&input.where_clause))?;

        let sql = statements::delete_sql(&input.schema, &input.table_name, &input.where_clause)?;

        let pool = self.registry.get(&input.connection_name).await?;
        let outcome = self.executor.execute(&pool, &sql, &[], false, None).await?;

        let count = rows_affected(outcome)?;
        info!(
            connection_name = %input.connection_name,
            table = %input.table_name,
            rows = count,
            "Rows deleted"
        );

        let row_text = if count == 1 { "row" } else { "rows" };
        Ok(format!(
            "Successfully deleted {} {} from '{}.{}'",
            count, row_text, input.schema, input.table_name
        ))
    }
}

fn rows_affected(outcome: StatementOutcome) -> PgResult<u64> {
    match outcome {
        StatementOutcome::RowsAffected { count, .. } => Ok(count),
        StatementOutcome::Rows(_) => Err(PgError::internal(
            "Expected a rows-affected outcome, got a result set",
        )),
    }
}

/// Normalize the insert payload to a list of row objects.
fn normalize_rows(data: &JsonValue) -> PgResult<Vec<&serde_json::Map<String, JsonValue>>> {
    match data {
        JsonValue::Object(row) => Ok(vec![row]),
        JsonValue::Array(items) => {
            if items.is_empty() {
                return Err(PgError::invalid_input(
                    "insert_data 'data' must not be an empty array",
                ));
            }
            items
                .iter()
                .map(|item| {
                    item.as_object().ok_or_else(|| {
                        PgError::invalid_input(
                            "insert_data 'data' array items must be objects of column: value",
                        )
                    })
                })
                .collect()
        }
        _ => Err(PgError::invalid_input(
            "insert_data 'data' must be an object or an array of objects",
        )),
    }
}

/// Column order for the insert statement, taken from the first row. Every
/// row must carry exactly the same column set.
fn row_columns(rows: &[&serde_json::Map<String, JsonValue>]) -> PgResult<Vec<String>> {
    let columns: Vec<String> = rows[0].keys().cloned().collect();
    if columns.is_empty() {
        return Err(PgError::invalid_input(
            "insert_data rows must have at least one column",
        ));
    }
    for (i, row) in rows.iter().enumerate().skip(1) {
        if row.len() != columns.len() || !columns.iter().all(|c| row.contains_key(c)) {
            return Err(PgError::invalid_input(format!(
                "insert_data row {} has different columns than the first row",
                i
            )));
        }
    }
    Ok(columns)
}

fn bind_rows(
    rows: &[&serde_json::Map<String, JsonValue>],
    columns: &[String],
) -> Vec<Vec<BindValue>> {
    rows.iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| row.get(col).map(BindValue::from).unwrap_or(BindValue::Null))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_data_input_defaults() {
        let input: TableDataInput =
            serde_json::from_str(r#"{"table_name": "users"}"#).unwrap();
        assert_eq!(input.limit, 100);
        assert_eq!(input.offset, 0);
        assert!(input.where_clause.is_none());
        assert!(input.order_by.is_none());
    }

    #[test]
    fn test_normalize_rows_single_object() {
        let data = json!({"name": "Alice", "age": 30});
        let rows = normalize_rows(&data).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_normalize_rows_array() {
        let data = json!([{"name": "Alice"}, {"name": "Bob"}]);
        let rows = normalize_rows(&data).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_normalize_rows_rejects_scalars_and_empty() {
        assert!(normalize_rows(&json!("not a row")).is_err());
        assert!(normalize_rows(&json!([])).is_err());
        assert!(normalize_rows(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_row_columns_mismatch_rejected() {
        let data = json!([{"a": 1, "b": 2}, {"a": 3}]);
        let rows = normalize_rows(&data).unwrap();
        assert!(row_columns(&rows).is_err());
    }

    #[test]
    fn test_bind_rows_order_follows_columns() {
        let data = json!([{"a": 1, "b": "x"}]);
        let rows = normalize_rows(&data).unwrap();
        let columns = row_columns(&rows).unwrap();
        let bound = bind_rows(&rows, &columns);
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].len(), 2);
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_where_clause() {
        let handler = DataToolHandler::new(
            Arc::new(ConnectionRegistry::new()),
            StatementExecutor::new(),
            true,
        );
        let input = TableDataInput {
            table_name: "users".into(),
            connection_name: "default".into(),
            schema: "public".into(),
            limit: 100,
            offset: 0,
            where_clause: Some("id = 1".into()),
            order_by: None,
        };
        let result = handler.table_data(input).await;
        assert!(matches!(result, Err(PgError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_strict_mode_allows_plain_reads() {
        // Without fragments the strict flag must not get in the way; this
        // fails on the missing connection instead.
        let handler = DataToolHandler::new(
            Arc::new(ConnectionRegistry::new()),
            StatementExecutor::new(),
            true,
        );
        let input = TableDataInput {
            table_name: "users".into(),
            connection_name: "default".into(),
            schema: "public".into(),
            limit: 100,
            offset: 0,
            where_clause: None,
            order_by: None,
        };
        let result = handler.table_data(input).await;
        assert!(matches!(result, Err(PgError::ConnectionNotFound { .. })));
    }
}
