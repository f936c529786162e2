//! Turns tool results into chat replies.

use crate::invoker::ToolCallResult;
use serde_json::Value;
use std::collections::BTreeMap;

const MAX_LISTED_FILES: usize = 10;
const MAX_SHOWN_ROWS: usize = 5;
const MAX_FILE_CHARS: usize = 500;

pub fn render_tool_result(
    tool: &str,
    result: &ToolCallResult,
    parameters: &BTreeMap<String, String>,
) -> String {
    if !result.success {
        let error = result.error.as_deref().unwrap_or("Unknown error");
        return format!("Sorry, I couldn't execute that operation. Error: {}", error);
    }
    let payload = result.payload.as_ref().unwrap_or(&Value::Null);
    let param = |name: &str, fallback: &'static str| -> String {
        parameters
            .get(name)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    };

    match tool {
        "list_directory" => {
            let files = strings(&payload["files"]);
            if files.is_empty() {
                return format!("The directory {} is empty.", param("path", "."));
            }
            let mut out = format!("Found {} files in {}:\n", files.len(), param("path", "the directory"));
            out.push_str(&bullets(files.iter().take(MAX_LISTED_FILES)));
            if files.len() > MAX_LISTED_FILES {
                out.push_str(&format!("\n... and {} more files", files.len() - MAX_LISTED_FILES));
            }
            out
        }
        "read_file" => {
            let content = payload["content"].as_str().unwrap_or_default();
            if content.is_empty() {
                return "The file appears to be empty.".to_string();
            }
            let shown = match content.char_indices().nth(MAX_FILE_CHARS) {
                Some((cut, _)) => format!("{}... (truncated)", &content[..cut]),
                None => content.to_string(),
            };
            format!("Here's the content of {}:\n```\n{}\n```", param("path", "the file"), shown)
        }
        "write_file" => format!("Successfully wrote to {}.", param("path", "the file")),
        "list_tables" => {
            let tables = strings(&payload["tables"]);
            if tables.is_empty() {
                "No tables found in the database.".to_string()
            } else {
                format!("Found {} tables in the database:\n{}", tables.len(), bullets(tables.iter()))
            }
        }
        "query_database" | "get_table_data" => match payload["rows"].as_array() {
            Some(rows) if rows.is_empty() => {
                "Query executed successfully, but no rows were returned.".to_string()
            }
            Some(rows) => {
                let mut out = format!("Query executed successfully. Found {} rows:\n", rows.len());
                if let Some(columns) = payload["columns"].as_array() {
                    let names: Vec<String> = columns.iter().map(display).collect();
                    out.push_str(&format!("Columns: {}\n", names.join(", ")));
                }
                for (i, row) in rows.iter().take(MAX_SHOWN_ROWS).enumerate() {
                    out.push_str(&format!("Row {}: {}\n", i + 1, row));
                }
                if rows.len() > MAX_SHOWN_ROWS {
                    out.push_str(&format!("... and {} more rows", rows.len() - MAX_SHOWN_ROWS));
                }
                out.trim_end().to_string()
            }
            None => format!(
                "Query executed: {}",
                payload["message"].as_str().unwrap_or("Success")
            ),
        },
        "describe_table" => match payload["columns"].as_array() {
            Some(columns) => {
                let lines: Vec<String> = columns
                    .iter()
                    .map(|col| {
                        format!(
                            "{} ({})",
                            col["name"].as_str().unwrap_or("?"),
                            col["type"].as_str().filter(|t| !t.is_empty()).unwrap_or("unknown")
                        )
                    })
                    .collect();
                format!(
                    "Table structure for {}:\n{}",
                    param("table_name", "the table"),
                    bullets(lines.iter())
                )
            }
            None => format!(
                "Table information: {}",
                payload["message"].as_str().unwrap_or("Success")
            ),
        },
        "store_memory" => format!(
            "Successfully stored information with key '{}'.",
            param("key", "")
        ),
        "retrieve_memory" => match payload["value"].as_str().filter(|v| !v.is_empty()) {
            Some(value) => format!("Retrieved: {}", value),
            None => "No information found for that key.".to_string(),
        },
        "list_memories" => {
            let memories: Vec<String> = payload["memories"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .map(|m| format!("{}: {}", display(&m["key"]), display(&m["value"])))
                        .collect()
                })
                .unwrap_or_default();
            if memories.is_empty() {
                "No memories stored.".to_string()
            } else {
                format!("Stored memories:\n{}", bullets(memories.iter()))
            }
        }
        _ => format!("Operation completed successfully. Result: {}", display(payload)),
    }
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().map(display).collect())
        .unwrap_or_default()
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "Success".to_string(),
        other => other.to_string(),
    }
}

fn bullets<'a>(items: impl Iterator<Item = &'a String>) -> String {
    items.map(|item| format!("• {}", item)).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn failures_are_labeled() {
        let out = render_tool_result("read_file", &ToolCallResult::failed("boom"), &params(&[]));
        assert_eq!(out, "Sorry, I couldn't execute that operation. Error: boom");
    }

    #[test]
    fn directory_listing_is_truncated() {
        let files: Vec<String> = (0..12).map(|i| format!("f{i:02}.txt")).collect();
        let result = ToolCallResult::ok(json!({ "files": files }));
        let out = render_tool_result("list_directory", &result, &params(&[("path", "src")]));
        assert!(out.starts_with("Found 12 files in src:\n• f00.txt"));
        assert!(out.contains("• f09.txt"));
        assert!(!out.contains("f10.txt"));
        assert!(out.ends_with("... and 2 more files"));
    }

    #[test]
    fn long_files_are_cut_at_500_chars() {
        let result = ToolCallResult::ok(json!({ "content": "é".repeat(600) }));
        let out = render_tool_result("read_file", &result, &params(&[("path", "a.txt")]));
        assert!(out.contains(&format!("{}... (truncated)", "é".repeat(500))));
        assert!(!out.contains(&"é".repeat(501)));
    }

    #[test]
    fn tables_and_rows() {
        let tables = ToolCallResult::ok(json!({ "tables": ["orders", "users"] }));
        assert_eq!(
            render_tool_result("list_tables", &tables, &params(&[])),
            "Found 2 tables in the database:\n• orders\n• users"
        );

        let rows: Vec<Value> = (1..=7).map(|i| json!([i, format!("user{i}")])).collect();
        let query = ToolCallResult::ok(json!({ "columns": ["id", "name"], "rows": rows }));
        let out = render_tool_result("query_database", &query, &params(&[]));
        assert!(out.starts_with("Query executed successfully. Found 7 rows:\nColumns: id, name\nRow 1: [1,\"user1\"]"));
        assert!(out.ends_with("... and 2 more rows"));

        let statement = ToolCallResult::ok(json!({ "rows_affected": 1, "message": "Rows affected: 1" }));
        assert_eq!(
            render_tool_result("query_database", &statement, &params(&[])),
            "Query executed: Rows affected: 1"
        );
    }

    #[test]
    fn memory_results() {
        let missing = ToolCallResult::ok(json!({ "key": "k", "value": null }));
        assert_eq!(
            render_tool_result("retrieve_memory", &missing, &params(&[("key", "k")])),
            "No information found for that key."
        );
        let listed = ToolCallResult::ok(json!({ "memories": [{ "key": "color", "value": "teal" }] }));
        assert_eq!(
            render_tool_result("list_memories", &listed, &params(&[])),
            "Stored memories:\n• color: teal"
        );
    }
}
