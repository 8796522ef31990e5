//! Terminal rendering for query results.

use sqlagent_core::{
    ExecutionSuccess, FinalReply, MAX_DISPLAY_CELL_LEN, MAX_DISPLAY_ROWS, RequestOutcome, truncate,
};

/// Render a result set as a markdown table, capped at `MAX_DISPLAY_ROWS`
/// rows and `MAX_DISPLAY_CELL_LEN` characters per cell.
pub fn render_table(result: &ExecutionSuccess) -> String {
    if result.columns.is_empty() || result.rows.is_empty() {
        return "(no rows)".to_owned();
    }

    let mut out = String::new();
    out.push('|');
    for column in &result.columns {
        out.push_str(&format!(" {} |", truncate(column, MAX_DISPLAY_CELL_LEN)));
    }
    out.push_str("\n|");
    for _ in &result.columns {
        out.push_str(" --- |");
    }
    out.push('\n');

    for row in result.rows.iter().take(MAX_DISPLAY_ROWS) {
        out.push('|');
        for column in &result.columns {
            let cell = row.get(column).map_or_else(|| "NULL".to_owned(), render_value);
            out.push_str(&format!(" {} |", cell));
        }
        out.push('\n');
    }

    if result.row_count > MAX_DISPLAY_ROWS {
        out.push_str(&format!(
            "... and {} more rows ({} total)\n",
            result.row_count - MAX_DISPLAY_ROWS.min(result.rows.len()),
            result.row_count
        ));
    }
    out
}

fn render_value(value: &serde_json::Value) -> String {
    let text = match value {
        serde_json::Value::Null => "NULL".to_owned(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > MAX_DISPLAY_CELL_LEN {
        format!("{}...", truncate(&text, MAX_DISPLAY_CELL_LEN))
    } else {
        text
    }
}

/// Render a whole request outcome for the terminal.
pub fn render_outcome(outcome: &RequestOutcome) -> String {
    match &outcome.reply {
        FinalReply::Chat { text } | FinalReply::Clarification { text } => text.clone(),
        FinalReply::Query { sql, result, summary } => {
            format!("{summary}\n\nSQL:\n{sql}\n\n{}", render_table(result))
        },
        FinalReply::Error { last_sql, error } => {
            let mut out = String::from("Query failed.\n");
            if let Some(sql) = last_sql {
                out.push_str(&format!("Last SQL:\n{sql}\n"));
            }
            out.push_str(&format!("Error: {error}"));
            if outcome.attempts.len() > 1 {
                out.push_str(&format!("\n({} attempts made)", outcome.attempts.len()));
            }
            out
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(rows: usize) -> ExecutionSuccess {
        let data = (0..rows)
            .map(|i| {
                let mut row = serde_json::Map::new();
                row.insert("id".to_owned(), serde_json::json!(i));
                row.insert("name".to_owned(), serde_json::json!(format!("item-{i}")));
                row
            })
            .collect::<Vec<_>>();
        ExecutionSuccess {
            row_count: data.len(),
            rows: data,
            columns: vec!["id".to_owned(), "name".to_owned()],
        }
    }

    #[test]
    fn test_table_has_header_and_rows() {
        let table = render_table(&success(2));
        assert!(table.starts_with("| id | name |"));
        assert!(table.contains("| --- | --- |"));
        assert!(table.contains("| 0 | item-0 |"));
        assert!(!table.contains("more rows"));
    }

    #[test]
    fn test_table_caps_displayed_rows() {
        let mut result = success(MAX_DISPLAY_ROWS + 5);
        result.row_count = MAX_DISPLAY_ROWS + 5;
        let table = render_table(&result);
        assert_eq!(table.matches("item-").count(), MAX_DISPLAY_ROWS);
        assert!(table.contains("and 5 more rows"));
    }

    #[test]
    fn test_long_cell_is_truncated() {
        let mut row = serde_json::Map::new();
        row.insert("blob".to_owned(), serde_json::json!("x".repeat(200)));
        let result = ExecutionSuccess {
            rows: vec![row],
            row_count: 1,
            columns: vec!["blob".to_owned()],
        };
        let table = render_table(&result);
        assert!(table.contains(&format!("{}...", "x".repeat(MAX_DISPLAY_CELL_LEN))));
        assert!(!table.contains(&"x".repeat(MAX_DISPLAY_CELL_LEN + 1)));
    }

    #[test]
    fn test_missing_column_renders_null() {
        let mut row = serde_json::Map::new();
        row.insert("id".to_owned(), serde_json::json!(1));
        let result = ExecutionSuccess {
            rows: vec![row],
            row_count: 1,
            columns: vec!["id".to_owned(), "name".to_owned()],
        };
        assert!(render_table(&result).contains("| 1 | NULL |"));
    }
}
