//! Data models for the PostgreSQL MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod statement;
pub mod table;

// Re-export commonly used types
pub use connection::{
    ConnectParams, ConnectionInfo, ConnectionSummary, DEFAULT_CONNECTION_NAME, DEFAULT_PG_PORT,
    HealthStatus,
};
pub use statement::{
    BindValue, DEFAULT_QUERY_ROW_LIMIT, DEFAULT_STATEMENT_TIMEOUT_SECS, DEFAULT_TABLE_DATA_LIMIT,
    MAX_ROW_LIMIT, StatementOutcome, TabularResult,
};
pub use table::{ColumnSpec, DEFAULT_SCHEMA};
