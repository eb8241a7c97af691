//! Integration tests for SQL statement assembly.
//!
//! Tests verify that:
//! - Identifiers are validated and double-quoted everywhere they appear
//! - Bound-value placeholders are numbered left to right
//! - Optional clause fragments land in the right position
//! - Hostile identifier input is rejected before any SQL is produced

use pg_mcp_server::db::statements::{
    backup_table_sql, create_table_sql, delete_sql, describe_table_sql, drop_table_sql,
    insert_sql, list_tables_sql, table_data_sql, update_sql,
};
use pg_mcp_server::error::PgError;
use pg_mcp_server::models::ColumnSpec;

fn col(name: &str, data_type: &str) -> ColumnSpec {
    ColumnSpec {
        name: name.to_string(),
        data_type: data_type.to_string(),
        not_null: false,
        default: None,
        primary_key: false,
    }
}

#[test]
fn introspection_queries_bind_filters() {
    assert!(list_tables_sql().contains("information_schema.tables"));
    assert!(list_tables_sql().contains("table_schema = $1"));

    assert!(describe_table_sql().contains("information_schema.columns"));
    assert!(describe_table_sql().contains("table_schema = $1"));
    assert!(describe_table_sql().contains("table_name = $2"));
    assert!(describe_table_sql().contains("ORDER BY ordinal_position"));
}

#[test]
fn table_data_clause_placement() {
    let sql = table_data_sql(
        "app",
        "events",
        Some("kind = 'click'"),
        Some("created_at DESC"),
        25,
        50,
    )
    .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM \"app\".\"events\" WHERE kind = 'click' \
         ORDER BY created_at DESC LIMIT 25 OFFSET 50"
    );

    // WHERE must precede ORDER BY, which must precede LIMIT/OFFSET
    let where_pos = sql.find("WHERE").unwrap();
    let order_pos = sql.find("ORDER BY").unwrap();
    let limit_pos = sql.find("LIMIT").unwrap();
    assert!(where_pos < order_pos && order_pos < limit_pos);
}

#[test]
fn insert_placeholders_numbered_left_to_right() {
    let columns: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
    let sql = insert_sql("public", "t", &columns, None).unwrap();
    assert!(sql.ends_with("VALUES ($1, $2, $3, $4)"));
    assert_eq!(sql.matches('$').count(), 4);
}

#[test]
fn update_placeholders_match_column_order() {
    let columns: Vec<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
    let sql = update_sql("public", "t", &columns, "id = $3").unwrap();
    assert!(sql.contains("SET \"x\" = $1, \"y\" = $2"));
    // The clause is interpolated as given, after the bound assignments
    assert!(sql.ends_with("WHERE id = $3"));
}

#[test]
fn create_table_column_modifier_order() {
    let mut id = col("id", "BIGSERIAL");
    id.primary_key = true;
    let mut name = col("name", "TEXT");
    name.not_null = true;
    name.default = Some("''".to_string());

    let sql = create_table_sql("public", "t", &[id, name], false).unwrap();
    assert!(sql.starts_with("CREATE TABLE \"public\".\"t\" ("));
    assert!(sql.contains("\"id\" BIGSERIAL PRIMARY KEY"));
    assert!(sql.contains("\"name\" TEXT NOT NULL DEFAULT ''"));
}

#[test]
fn drop_table_flag_combinations() {
    assert_eq!(
        drop_table_sql("s", "t", true, true).unwrap(),
        "DROP TABLE IF EXISTS \"s\".\"t\" CASCADE"
    );
    assert_eq!(
        drop_table_sql("s", "t", false, false).unwrap(),
        "DROP TABLE \"s\".\"t\""
    );
}

#[test]
fn backup_quotes_both_tables() {
    let sql = backup_table_sql("s", "src", "dst").unwrap();
    assert_eq!(
        sql,
        "CREATE TABLE \"s\".\"dst\" AS SELECT * FROM \"s\".\"src\""
    );
}

#[test]
fn hostile_identifiers_rejected_everywhere() {
    let bad = "t\"; DROP TABLE users--";
    assert!(matches!(
        table_data_sql("public", bad, None, None, 10, 0),
        Err(PgError::InvalidInput { .. })
    ));
    assert!(matches!(
        insert_sql("public", "t", &[bad.to_string()], None),
        Err(PgError::InvalidInput { .. })
    ));
    assert!(matches!(
        update_sql(bad, "t", &["a".to_string()], "id = 1"),
        Err(PgError::InvalidInput { .. })
    ));
    assert!(matches!(
        delete_sql("public", bad, "id = 1"),
        Err(PgError::InvalidInput { .. })
    ));
    assert!(matches!(
        create_table_sql("public", "t", &[col(bad, "TEXT")], true),
        Err(PgError::InvalidInput { .. })
    ));
    assert!(matches!(
        backup_table_sql("public", "t", bad),
        Err(PgError::InvalidInput { .. })
    ));
}

#[test]
fn destructive_statements_require_where() {
    assert!(update_sql("public", "t", &["a".to_string()], "").is_err());
    assert!(delete_sql("public", "t", "   ").is_err());
}
