//! Integration tests for the connection registry and tool handlers that do
//! not require a running PostgreSQL server.
//!
//! Tests verify that:
//! - Unknown connection names surface ConnectionNotFound from every tool
//! - Error kinds map to the right MCP error codes
//! - Input validation fires before any connection lookup

use pg_mcp_server::db::{ConnectionRegistry, StatementExecutor};
use pg_mcp_server::error::PgError;
use pg_mcp_server::tools::connection::{ConnectionNameInput, ConnectionToolHandler};
use pg_mcp_server::tools::data::{DataToolHandler, DeleteDataInput, InsertDataInput};
use pg_mcp_server::tools::query::{ExecuteQueryInput, QueryToolHandler};
use pg_mcp_server::tools::schema::{ListTablesInput, SchemaToolHandler};
use rmcp::ErrorData as McpError;
use serde_json::json;
use std::sync::Arc;

fn registry() -> Arc<ConnectionRegistry> {
    Arc::new(ConnectionRegistry::new())
}

#[tokio::test]
async fn query_on_unknown_connection_reports_not_found() {
    let handler = QueryToolHandler::new(registry(), StatementExecutor::new());
    let result = handler
        .execute_query(ExecuteQueryInput {
            query: "SELECT 1".to_string(),
            connection_name: "nope".to_string(),
            fetch_results: true,
            limit: 10,
        })
        .await;

    match result {
        Err(PgError::ConnectionNotFound { name }) => assert_eq!(name, "nope"),
        other => panic!("expected ConnectionNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn list_tables_on_unknown_connection_reports_not_found() {
    let handler = SchemaToolHandler::new(registry(), StatementExecutor::new());
    let result = handler
        .list_tables(ListTablesInput {
            connection_name: "missing".to_string(),
            schema: "public".to_string(),
        })
        .await;
    assert!(matches!(result, Err(PgError::ConnectionNotFound { .. })));
}

#[tokio::test]
async fn health_check_on_unknown_connection_reports_not_found() {
    let handler = ConnectionToolHandler::new(registry());
    let result = handler
        .health_check(ConnectionNameInput {
            connection_name: "missing".to_string(),
        })
        .await;
    assert!(matches!(result, Err(PgError::ConnectionNotFound { .. })));
}

#[tokio::test]
async fn insert_validation_fires_before_connection_lookup() {
    // Bad payload shape must be rejected as invalid input even though no
    // connection named "missing" exists.
    let handler = DataToolHandler::new(registry(), StatementExecutor::new(), false);
    let result = handler
        .insert_data(InsertDataInput {
            table_name: "users".to_string(),
            data: json!("not an object"),
            connection_name: "missing".to_string(),
            schema: "public".to_string(),
            on_conflict: None,
        })
        .await;
    assert!(matches!(result, Err(PgError::InvalidInput { .. })));
}

#[tokio::test]
async fn delete_requires_where_before_connection_lookup() {
    let handler = DataToolHandler::new(registry(), StatementExecutor::new(), false);
    let result = handler
        .delete_data(DeleteDataInput {
            table_name: "users".to_string(),
            where_clause: "".to_string(),
            connection_name: "missing".to_string(),
            schema: "public".to_string(),
        })
        .await;
    assert!(matches!(result, Err(PgError::InvalidInput { .. })));
}

#[test]
fn error_kinds_map_to_mcp_codes() {
    let not_found: McpError = PgError::connection_not_found("x").into();
    assert_eq!(not_found.code.0, -32002);

    let invalid: McpError = PgError::invalid_input("bad").into();
    assert_eq!(invalid.code.0, -32602);

    let internal: McpError = PgError::internal("boom").into();
    assert_eq!(internal.code.0, -32603);
}

#[test]
fn not_found_message_names_the_connection() {
    let err = PgError::connection_not_found("staging");
    assert_eq!(err.to_string(), "No connection found for 'staging'");
}
