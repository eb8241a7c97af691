//! Statement execution engine.
//!
//! Single entry point for running SQL against a registered session:
//! - fetch mode streams at most `limit + 1` rows (truncation detection
//!   without pulling the whole result set) and returns an ordered tabular
//!   result
//! - non-fetch mode executes the statement and returns rows affected
//! - either path is wrapped in a configurable timeout
//!
//! Bound parameters are only ever row values; identifiers and clause
//! fragments are assembled into the SQL text upstream (see `statements`).

use crate::db::types::{column_names, row_values};
use crate::error::{PgError, PgResult};
use crate::models::{
    BindValue, DEFAULT_QUERY_ROW_LIMIT, DEFAULT_STATEMENT_TIMEOUT_SECS, MAX_ROW_LIMIT,
    StatementOutcome, TabularResult,
};
use futures_util::StreamExt;
use sqlx::PgPool;
use sqlx::postgres::{PgArguments, PgRow};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Executor that runs statements against a PostgreSQL pool.
pub struct StatementExecutor {
    default_timeout: Duration,
    default_limit: u32,
}

impl StatementExecutor {
    /// Create a new executor with default settings.
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(DEFAULT_STATEMENT_TIMEOUT_SECS as u64),
            default_limit: DEFAULT_QUERY_ROW_LIMIT,
        }
    }

    /// Create a new executor with custom settings.
    pub fn with_defaults(timeout_secs: u64, row_limit: u32) -> Self {
        Self {
            default_timeout: Duration::from_secs(timeout_secs),
            default_limit: row_limit.min(MAX_ROW_LIMIT),
        }
    }

    /// Execute a statement.
    ///
    /// With `fetch` true the statement's result set is retrieved (capped at
    /// `limit` rows); zero rows is a normal success outcome. With `fetch`
    /// false the statement is executed for its side effect and the affected
    /// row count is returned. Driver errors propagate verbatim and are never
    /// retried.
    pub async fn execute(
        &self,
        pool: &PgPool,
        sql: &str,
        params: &[BindValue],
        fetch: bool,
        limit: Option<u32>,
    ) -> PgResult<StatementOutcome> {
        let start = Instant::now();
        // Clamp to [1, MAX_ROW_LIMIT]: limit=0 would mark every result truncated
        let row_limit = limit
            .map(|l| l.clamp(1, MAX_ROW_LIMIT))
            .unwrap_or(self.default_limit);

        debug!(
            sql = %sql,
            params = params.len(),
            fetch = fetch,
            limit = row_limit,
            "Executing statement"
        );

        if fetch {
            let rows = self.fetch_rows(pool, sql, params, row_limit).await?;
            Ok(StatementOutcome::Rows(build_result(rows, row_limit, start)))
        } else {
            let rows_affected = self.execute_write(pool, sql, params).await?;
            Ok(StatementOutcome::RowsAffected {
                count: rows_affected,
                execution_time_ms: start.elapsed().as_millis() as u64,
            })
        }
    }

    /// Insert rows one statement at a time inside a single transaction.
    ///
    /// Preserves the classic per-row INSERT loop but with an explicit
    /// transaction boundary: a failure on any row rolls back every earlier
    /// row, and the single commit lands only after the last row.
    pub async fn insert_rows(
        &self,
        pool: &PgPool,
        sql: &str,
        rows: &[Vec<BindValue>],
    ) -> PgResult<u64> {
        let insert_all = async {
            let mut tx = pool.begin().await?;
            let mut inserted = 0u64;
            for row in rows {
                let mut query = sqlx::query(sql);
                for value in row {
                    query = bind_value(query, value);
                }
                let result = query.execute(&mut *tx).await?;
                inserted += result.rows_affected();
            }
            tx.commit().await?;
            Ok::<u64, sqlx::Error>(inserted)
        };

        match timeout(self.default_timeout, insert_all).await {
            Ok(Ok(count)) => Ok(count),
            Ok(Err(e)) => Err(PgError::from(e)),
            Err(_) => Err(timeout_error("bulk insert", self.default_timeout)),
        }
    }

    async fn fetch_rows(
        &self,
        pool: &PgPool,
        sql: &str,
        params: &[BindValue],
        row_limit: u32,
    ) -> PgResult<Vec<PgRow>> {
        // Fetch one extra row to detect truncation
        let fetch_limit = row_limit as usize + 1;
        let results = if params.is_empty() {
            // Raw SQL avoids prepared-statement restrictions on some statements
            use sqlx::Executor;
            let stream = pool.fetch(sql).take(fetch_limit);
            timeout(self.default_timeout, stream.collect::<Vec<_>>()).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_value(query, param);
            }
            let stream = query.fetch(pool).take(fetch_limit);
            timeout(self.default_timeout, stream.collect::<Vec<_>>()).await
        };

        match results {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", self.default_timeout)),
        }
    }

    async fn execute_write(
        &self,
        pool: &PgPool,
        sql: &str,
        params: &[BindValue],
    ) -> PgResult<u64> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(self.default_timeout, pool.execute(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_value(query, param);
            }
            timeout(self.default_timeout, query.execute(pool)).await
        };

        match result {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(PgError::from(e)),
            Err(_) => Err(timeout_error("write operation", self.default_timeout)),
        }
    }
}

impl Default for StatementExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    value: &'q BindValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match value {
        BindValue::Null => query.bind(None::<String>),
        BindValue::Bool(v) => query.bind(*v),
        BindValue::Int(v) => query.bind(*v),
        BindValue::Float(v) => query.bind(*v),
        BindValue::String(v) => query.bind(v.as_str()),
    }
}

fn collect_rows(results: Vec<Result<PgRow, sqlx::Error>>) -> PgResult<Vec<PgRow>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(PgError::from)?);
    }
    Ok(rows)
}

fn timeout_error(operation: &str, timeout: Duration) -> PgError {
    PgError::timeout(operation, timeout.as_secs() as u32)
}

/// Build a tabular result from fetched rows, applying the row limit.
fn build_result(rows: Vec<PgRow>, row_limit: u32, start: Instant) -> TabularResult {
    let execution_time_ms = start.elapsed().as_millis() as u64;

    if rows.is_empty() {
        return TabularResult {
            columns: Vec::new(),
            rows: Vec::new(),
            truncated: false,
            execution_time_ms,
        };
    }

    let columns = column_names(&rows[0]);
    let total_rows = rows.len();
    let truncated = total_rows > row_limit as usize;
    let rows_to_take = (row_limit as usize).min(total_rows);

    let values: Vec<Vec<serde_json::Value>> =
        rows.iter().take(rows_to_take).map(row_values).collect();

    if truncated {
        warn!(
            total_rows = total_rows,
            limit = row_limit,
            "Query result truncated"
        );
    }

    TabularResult {
        columns,
        rows: values,
        truncated,
        execution_time_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_defaults() {
        let executor = StatementExecutor::new();
        assert_eq!(
            executor.default_timeout,
            Duration::from_secs(DEFAULT_STATEMENT_TIMEOUT_SECS as u64)
        );
        assert_eq!(executor.default_limit, DEFAULT_QUERY_ROW_LIMIT);
    }

    #[test]
    fn test_executor_custom_settings() {
        let executor = StatementExecutor::with_defaults(60, 500);
        assert_eq!(executor.default_timeout, Duration::from_secs(60));
        assert_eq!(executor.default_limit, 500);
    }

    #[test]
    fn test_executor_limit_capped() {
        let executor = StatementExecutor::with_defaults(30, 99999);
        assert_eq!(executor.default_limit, MAX_ROW_LIMIT);
    }
}
