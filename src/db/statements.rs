//! SQL statement assembly.
//!
//! Pure text assembly on top of the executor. Identifiers (schema, table,
//! column names) are validated against an allow-list pattern and
//! double-quoted before interpolation. Clause fragments (WHERE, ORDER BY,
//! column types and defaults, ON CONFLICT) are caller-supplied text and pass
//! through unmodified under the default trusted-caller model; strict mode
//! rejects them at the tool layer before assembly is reached.
//!
//! Row values never appear in the SQL text; they travel as `$n` placeholders
//! bound at execution time.

use crate::error::{PgError, PgResult};
use crate::models::ColumnSpec;

/// Validate an identifier: letters, digits, `_`, `$`, not starting with a
/// digit, non-empty, at most 63 bytes (the PostgreSQL NAMEDATALEN limit).
pub fn validate_ident(ident: &str) -> PgResult<()> {
    if ident.is_empty() {
        return Err(PgError::invalid_input("Identifier must not be empty"));
    }
    if ident.len() > 63 {
        return Err(PgError::invalid_input(format!(
            "Identifier '{}' exceeds 63 bytes",
            ident
        )));
    }
    let mut chars = ident.chars();
    let first = chars.next().unwrap_or('0');
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(PgError::invalid_input(format!(
            "Invalid identifier '{}': must start with a letter or underscore",
            ident
        )));
    }
    for c in ident.chars() {
        if !(c.is_ascii_alphanumeric() || c == '_' || c == '$') {
            return Err(PgError::invalid_input(format!(
                "Invalid identifier '{}': only letters, digits, '_' and '$' are allowed",
                ident
            )));
        }
    }
    Ok(())
}

/// Validate and double-quote an identifier for interpolation into SQL text.
pub fn quote_ident(ident: &str) -> PgResult<String> {
    validate_ident(ident)?;
    Ok(format!("\"{}\"", ident))
}

/// Validate and quote a `schema.table` pair.
pub fn qualified_table(schema: &str, table: &str) -> PgResult<String> {
    Ok(format!("{}.{}", quote_ident(schema)?, quote_ident(table)?))
}

/// Tables in a schema, name and kind, ordered by name. Binds `$1` = schema.
pub fn list_tables_sql() -> &'static str {
    "SELECT table_name, table_type \
     FROM information_schema.tables \
     WHERE table_schema = $1 \
     ORDER BY table_name"
}

/// Column metadata for one table. Binds `$1` = schema, `$2` = table.
pub fn describe_table_sql() -> &'static str {
    "SELECT column_name, data_type, is_nullable, column_default, \
            character_maximum_length, numeric_precision, numeric_scale \
     FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2 \
     ORDER BY ordinal_position"
}

/// `SELECT * FROM schema.table` with optional WHERE / ORDER BY fragments and
/// a LIMIT/OFFSET window.
pub fn table_data_sql(
    schema: &str,
    table: &str,
    where_clause: Option<&str>,
    order_by: Option<&str>,
    limit: u32,
    offset: u64,
) -> PgResult<String> {
    let mut sql = format!("SELECT * FROM {}", qualified_table(schema, table)?);
    if let Some(clause) = where_clause.filter(|c| !c.trim().is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
    if let Some(order) = order_by.filter(|o| !o.trim().is_empty()) {
        sql.push_str(" ORDER BY ");
        sql.push_str(order);
    }
    sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
    Ok(sql)
}

/// `CREATE TABLE [IF NOT EXISTS] schema.table (col defs)`.
///
/// Column names are validated and quoted; each column's type and default
/// expression are interpolated as given.
pub fn create_table_sql(
    schema: &str,
    table: &str,
    columns: &[ColumnSpec],
    if_not_exists: bool,
) -> PgResult<String> {
    if columns.is_empty() {
        return Err(PgError::invalid_input(
            "create_table requires at least one column",
        ));
    }

    let mut defs = Vec::with_capacity(columns.len());
    for col in columns {
        let mut def = format!("{} {}", quote_ident(&col.name)?, col.data_type);
        if col.primary_key {
            def.push_str(" PRIMARY KEY");
        }
        if col.not_null {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &col.default {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }
        defs.push(def);
    }

    let exists_clause = if if_not_exists { "IF NOT EXISTS " } else { "" };
    Ok(format!(
        "CREATE TABLE {}{} ({})",
        exists_clause,
        qualified_table(schema, table)?,
        defs.join(", ")
    ))
}

/// `DROP TABLE [IF EXISTS] schema.table [CASCADE]`.
pub fn drop_table_sql(
    schema: &str,
    table: &str,
    if_exists: bool,
    cascade: bool,
) -> PgResult<String> {
    let exists_clause = if if_exists { "IF EXISTS " } else { "" };
    let cascade_clause = if cascade { " CASCADE" } else { "" };
    Ok(format!(
        "DROP TABLE {}{}{}",
        exists_clause,
        qualified_table(schema, table)?,
        cascade_clause
    ))
}

/// Single-row `INSERT INTO schema.table (cols) VALUES ($1..$n)` with an
/// optional ON CONFLICT fragment. Executed once per row.
pub fn insert_sql(
    schema: &str,
    table: &str,
    columns: &[String],
    on_conflict: Option<&str>,
) -> PgResult<String> {
    if columns.is_empty() {
        return Err(PgError::invalid_input(
            "insert_data requires at least one column",
        ));
    }

    let mut quoted = Vec::with_capacity(columns.len());
    for col in columns {
        quoted.push(quote_ident(col)?);
    }
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        qualified_table(schema, table)?,
        quoted.join(", "),
        placeholders.join(", ")
    );
    if let Some(conflict) = on_conflict.filter(|c| !c.trim().is_empty()) {
        sql.push_str(" ON CONFLICT ");
        sql.push_str(conflict);
    }
    Ok(sql)
}

/// `UPDATE schema.table SET col = $n, ... WHERE clause`.
///
/// SET values are bound; the WHERE clause is interpolated. A missing or
/// blank clause is rejected rather than updating every row.
pub fn update_sql(
    schema: &str,
    table: &str,
    columns: &[String],
    where_clause: &str,
) -> PgResult<String> {
    if columns.is_empty() {
        return Err(PgError::invalid_input(
            "update_data requires at least one column",
        ));
    }
    if where_clause.trim().is_empty() {
        return Err(PgError::invalid_input(
            "update_data requires a WHERE clause",
        ));
    }

    let mut assignments = Vec::with_capacity(columns.len());
    for (i, col) in columns.iter().enumerate() {
        assignments.push(format!("{} = ${}", quote_ident(col)?, i + 1));
    }

    Ok(format!(
        "UPDATE {} SET {} WHERE {}",
        qualified_table(schema, table)?,
        assignments.join(", "),
        where_clause
    ))
}

/// `DELETE FROM schema.table WHERE clause`. A blank clause is rejected.
pub fn delete_sql(schema: &str, table: &str, where_clause: &str) -> PgResult<String> {
    if where_clause.trim().is_empty() {
        return Err(PgError::invalid_input(
            "delete_data requires a WHERE clause",
        ));
    }
    Ok(format!(
        "DELETE FROM {} WHERE {}",
        qualified_table(schema, table)?,
        where_clause
    ))
}

/// `CREATE TABLE schema.backup AS SELECT * FROM schema.source`.
pub fn backup_table_sql(schema: &str, table: &str, backup_table: &str) -> PgResult<String> {
    Ok(format!(
        "CREATE TABLE {} AS SELECT * FROM {}",
        qualified_table(schema, backup_table)?,
        qualified_table(schema, table)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ident_accepts_normal_names() {
        assert!(validate_ident("users").is_ok());
        assert!(validate_ident("_private").is_ok());
        assert!(validate_ident("tab_1$").is_ok());
    }

    #[test]
    fn test_validate_ident_rejects_bad_names() {
        assert!(validate_ident("").is_err());
        assert!(validate_ident("1table").is_err());
        assert!(validate_ident("users; DROP TABLE x").is_err());
        assert!(validate_ident("na me").is_err());
        assert!(validate_ident("tab\"le").is_err());
        assert!(validate_ident(&"x".repeat(64)).is_err());
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("users").unwrap(), "\"users\"");
        assert_eq!(
            qualified_table("public", "users").unwrap(),
            "\"public\".\"users\""
        );
    }

    #[test]
    fn test_table_data_sql_minimal() {
        let sql = table_data_sql("public", "users", None, None, 100, 0).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM \"public\".\"users\" LIMIT 100 OFFSET 0"
        );
    }

    #[test]
    fn test_table_data_sql_with_fragments() {
        let sql = table_data_sql(
            "public",
            "users",
            Some("age > 21"),
            Some("name DESC"),
            50,
            10,
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM \"public\".\"users\" WHERE age > 21 ORDER BY name DESC LIMIT 50 OFFSET 10"
        );
    }

    #[test]
    fn test_table_data_sql_blank_fragments_skipped() {
        let sql = table_data_sql("public", "users", Some("  "), Some(""), 100, 0).unwrap();
        assert!(!sql.contains("WHERE"));
        assert!(!sql.contains("ORDER BY"));
    }

    #[test]
    fn test_create_table_sql() {
        let columns = vec![
            ColumnSpec {
                name: "id".into(),
                data_type: "SERIAL".into(),
                not_null: false,
                default: None,
                primary_key: true,
            },
            ColumnSpec {
                name: "name".into(),
                data_type: "VARCHAR(100)".into(),
                not_null: true,
                default: None,
                primary_key: false,
            },
            ColumnSpec {
                name: "created_at".into(),
                data_type: "TIMESTAMP".into(),
                not_null: false,
                default: Some("NOW()".into()),
                primary_key: false,
            },
        ];
        let sql = create_table_sql("public", "users", &columns, true).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"public\".\"users\" \
             (\"id\" SERIAL PRIMARY KEY, \"name\" VARCHAR(100) NOT NULL, \
             \"created_at\" TIMESTAMP DEFAULT NOW())"
        );
    }

    #[test]
    fn test_create_table_sql_requires_columns() {
        assert!(create_table_sql("public", "users", &[], true).is_err());
    }

    #[test]
    fn test_drop_table_sql_variants() {
        assert_eq!(
            drop_table_sql("public", "users", true, false).unwrap(),
            "DROP TABLE IF EXISTS \"public\".\"users\""
        );
        assert_eq!(
            drop_table_sql("public", "users", false, true).unwrap(),
            "DROP TABLE \"public\".\"users\" CASCADE"
        );
    }

    #[test]
    fn test_insert_sql_placeholders() {
        let columns = vec!["name".to_string(), "email".to_string(), "age".to_string()];
        let sql = insert_sql("public", "users", &columns, None).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"public\".\"users\" (\"name\", \"email\", \"age\") \
             VALUES ($1, $2, $3)"
        );
    }

    #[test]
    fn test_insert_sql_on_conflict() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let sql = insert_sql("public", "users", &columns, Some("(id) DO NOTHING")).unwrap();
        assert!(sql.ends_with("ON CONFLICT (id) DO NOTHING"));
    }

    #[test]
    fn test_update_sql_binds_set_values() {
        let columns = vec!["name".to_string(), "email".to_string()];
        let sql = update_sql("public", "users", &columns, "id = 7").unwrap();
        assert_eq!(
            sql,
            "UPDATE \"public\".\"users\" SET \"name\" = $1, \"email\" = $2 WHERE id = 7"
        );
    }

    #[test]
    fn test_update_sql_requires_where() {
        let columns = vec!["name".to_string()];
        assert!(update_sql("public", "users", &columns, "  ").is_err());
    }

    #[test]
    fn test_delete_sql() {
        assert_eq!(
            delete_sql("public", "users", "id = 1").unwrap(),
            "DELETE FROM \"public\".\"users\" WHERE id = 1"
        );
        assert!(delete_sql("public", "users", "").is_err());
    }

    #[test]
    fn test_backup_table_sql() {
        assert_eq!(
            backup_table_sql("public", "users", "users_backup").unwrap(),
            "CREATE TABLE \"public\".\"users_backup\" AS SELECT * FROM \"public\".\"users\""
        );
    }

    #[test]
    fn test_injection_attempt_in_table_name_rejected() {
        let result = table_data_sql("public", "users; DROP TABLE users--", None, None, 10, 0);
        assert!(matches!(result, Err(PgError::InvalidInput { .. })));
    }
}
