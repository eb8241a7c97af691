//! Table-definition data models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default schema used when the caller does not provide one.
pub const DEFAULT_SCHEMA: &str = "public";

/// Column definition for create_table.
///
/// The type and default strings are caller-supplied SQL text and are
/// interpolated into the statement as-is; only the column name is validated
/// and quoted as an identifier.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,
    /// SQL type, e.g. "SERIAL", "VARCHAR(100)", "TIMESTAMP"
    #[serde(rename = "type")]
    pub data_type: String,
    /// Add NOT NULL
    #[serde(default)]
    pub not_null: bool,
    /// DEFAULT expression, interpolated as-is
    #[serde(default)]
    pub default: Option<String>,
    /// Add PRIMARY KEY
    #[serde(default)]
    pub primary_key: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_spec_deserialization() {
        let json = r#"{"name": "id", "type": "SERIAL", "primary_key": true}"#;
        let spec: ColumnSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.name, "id");
        assert_eq!(spec.data_type, "SERIAL");
        assert!(spec.primary_key);
        assert!(!spec.not_null);
        assert!(spec.default.is_none());
    }
}
