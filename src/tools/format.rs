//! Text rendering for tool responses.
//!
//! Every tool reply is a single text block. The core layers hand back
//! structured results; this module is the only place those are turned into
//! human-readable text, so the rendering rules live in one spot.

use crate::models::TabularResult;
use serde_json::Value as JsonValue;
use unicode_width::UnicodeWidthStr;

/// Format a scalar cell value for display.
pub fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(arr) => serde_json::to_string(arr).unwrap_or_default(),
        JsonValue::Object(obj) => serde_json::to_string(obj).unwrap_or_default(),
    }
}

/// Render a tabular result as an ASCII table.
pub fn format_as_table(result: &TabularResult) -> String {
    if result.columns.is_empty() {
        return "Empty set".to_string();
    }

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.width()).collect();
    for row in &result.rows {
        for (i, value) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(format_value(value).width());
            }
        }
    }

    let mut output = String::new();
    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    output.push_str(&separator);
    let header: String = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!("| {:^width$} ", col, width = w))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);
    output.push_str(&separator);

    for row in &result.rows {
        let row_str: String = row
            .iter()
            .zip(&widths)
            .map(|(value, w)| {
                let formatted = format_value(value);
                // Right-align numbers, left-align everything else
                if matches!(value, JsonValue::Number(_)) {
                    format!("| {:>width$} ", formatted, width = w)
                } else {
                    format!("| {:<width$} ", formatted, width = w)
                }
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&separator);

    let row_count = result.row_count();
    let row_text = if row_count == 1 { "row" } else { "rows" };
    output.push_str(&format!(
        "{} {} in set ({:.2} sec)\n",
        row_count,
        row_text,
        result.execution_time_ms as f64 / 1000.0
    ));

    output
}

/// Render a fetched result with the standard "Query executed successfully"
/// framing and a truncation notice when the limit was hit.
pub fn render_query_result(result: &TabularResult, limit: u32) -> String {
    if result.is_empty() {
        return "Query executed successfully. No rows returned.".to_string();
    }

    let row_count = result.row_count();
    let row_text = if row_count == 1 { "row" } else { "rows" };
    let mut output = format!(
        "Query executed successfully. {} {} returned:\n\n{}",
        row_count,
        row_text,
        format_as_table(result)
    );
    if result.truncated {
        output.push_str(&format!("\n(Results limited to {} rows)", limit));
    }
    output
}

/// Render a rows-affected outcome.
pub fn render_rows_affected(count: u64) -> String {
    let row_text = if count == 1 { "row" } else { "rows" };
    format!("Query executed successfully. {} {} affected.", count, row_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_result(truncated: bool) -> TabularResult {
        TabularResult {
            columns: vec!["id".into(), "name".into()],
            rows: vec![
                vec![json!(1), json!("Alice")],
                vec![json!(2), json!("Bob")],
            ],
            truncated,
            execution_time_ms: 12,
        }
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&JsonValue::Null), "NULL");
        assert_eq!(format_value(&json!(true)), "true");
        assert_eq!(format_value(&json!(3.5)), "3.5");
        assert_eq!(format_value(&json!("text")), "text");
        assert_eq!(format_value(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_format_as_table_layout() {
        let table = format_as_table(&sample_result(false));
        assert!(table.contains("| id |"));
        assert!(table.contains("| Alice |"));
        assert!(table.contains("2 rows in set"));
        // Numbers right-aligned against the column width of "id"
        assert!(table.contains("|  1 |"));
    }

    #[test]
    fn test_format_as_table_empty_columns() {
        let result = TabularResult {
            columns: vec![],
            rows: vec![],
            truncated: false,
            execution_time_ms: 0,
        };
        assert_eq!(format_as_table(&result), "Empty set");
    }

    #[test]
    fn test_render_query_result_no_rows() {
        let result = TabularResult {
            columns: vec!["id".into()],
            rows: vec![],
            truncated: false,
            execution_time_ms: 1,
        };
        assert_eq!(
            render_query_result(&result, 1000),
            "Query executed successfully. No rows returned."
        );
    }

    #[test]
    fn test_render_query_result_truncation_notice() {
        let rendered = render_query_result(&sample_result(true), 2);
        assert!(rendered.starts_with("Query executed successfully. 2 rows returned:"));
        assert!(rendered.ends_with("(Results limited to 2 rows)"));
    }

    #[test]
    fn test_render_rows_affected_pluralization() {
        assert_eq!(
            render_rows_affected(1),
            "Query executed successfully. 1 row affected."
        );
        assert_eq!(
            render_rows_affected(5),
            "Query executed successfully. 5 rows affected."
        );
    }
}
