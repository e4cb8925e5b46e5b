//! Result Presentation
//!
//! Shapes a query result into the text the user sees: an aligned
//! table, a "no results" notice, or an affected-row summary.

use crate::store::QueryResult;
use serde_json::Value;

/// Render a result for terminal display.
pub fn render_result(result: &QueryResult) -> String {
    if result.rows.is_empty() {
        if result.columns.is_empty() && result.rows_affected > 0 {
            return format!("{} row(s) affected.", result.rows_affected);
        }
        return "No results found.".to_string();
    }

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.len()).collect();
    let rendered_rows: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    for row in &rendered_rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() && cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let mut out = String::new();
    let header: Vec<String> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
        .collect();
    out.push_str(&header.join(" | "));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for row in &rendered_rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths.get(i).copied().unwrap_or(0)))
            .collect();
        out.push_str(&line.join(" | "));
        out.push('\n');
    }
    out
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_result_notice() {
        let result = QueryResult::default();
        assert_eq!(render_result(&result), "No results found.");
    }

    #[test]
    fn test_affected_rows_summary() {
        let result = QueryResult {
            rows_affected: 2,
            ..QueryResult::default()
        };
        assert_eq!(render_result(&result), "2 row(s) affected.");
    }

    #[test]
    fn test_table_is_aligned() {
        let result = QueryResult {
            columns: vec!["nombre".to_string(), "salario".to_string()],
            rows: vec![
                vec![json!("Ana"), json!(30000.0)],
                vec![json!("Luis"), json!(45000.0)],
            ],
            rows_affected: 0,
        };
        let text = render_result(&result);
        assert!(text.starts_with("nombre | salario"));
        assert!(text.contains("Ana    | 30000.0"));
    }

    #[test]
    fn test_null_cells_are_labelled() {
        let result = QueryResult {
            columns: vec!["puesto".to_string()],
            rows: vec![vec![Value::Null]],
            rows_affected: 0,
        };
        assert!(render_result(&result).contains("NULL"));
    }
}
