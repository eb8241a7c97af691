//! Statement-related data models.
//!
//! This module defines types for statement execution requests and their
//! structured results. Results stay structured at this layer; text rendering
//! happens only at the MCP boundary.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Default row limit for execute_query results.
pub const DEFAULT_QUERY_ROW_LIMIT: u32 = 1000;

/// Default row limit for table_data results.
pub const DEFAULT_TABLE_DATA_LIMIT: u32 = 100;

/// Maximum allowed row limit.
pub const MAX_ROW_LIMIT: u32 = 10000;

/// Default statement timeout in seconds.
pub const DEFAULT_STATEMENT_TIMEOUT_SECS: u32 = 30;

/// A value passed to the driver as a bound parameter.
///
/// Bound values are only ever row values for INSERT/UPDATE; identifiers and
/// clause fragments never travel this path.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum BindValue {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

impl BindValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this value for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

impl From<&JsonValue> for BindValue {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Self::String(s.clone()),
            // Arrays and objects are bound as their JSON text
            other => Self::String(other.to_string()),
        }
    }
}

/// Ordered tabular result: named columns plus rows of scalar values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabularResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
    /// True if more rows existed than the requested limit
    pub truncated: bool,
    pub execution_time_ms: u64,
}

impl TabularResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outcome of a single statement execution.
#[derive(Debug, Clone)]
pub enum StatementOutcome {
    /// The statement produced a result set (possibly empty)
    Rows(TabularResult),
    /// The statement completed without producing rows
    RowsAffected {
        count: u64,
        execution_time_ms: u64,
    },
}
