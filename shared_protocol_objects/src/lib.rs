use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Role enum for message senders/recipients
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Assistant => "assistant",
            Role::User => "user",
            Role::System => "system",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

impl ToolInfo {
    /// Parameter names declared under `inputSchema.properties`.
    pub fn declared_params(&self) -> Vec<String> {
        self.input_schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Parameter names listed in `inputSchema.required`.
    pub fn required_params(&self) -> Vec<String> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|req| {
                req.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn declares(&self, param: &str) -> bool {
        self.input_schema
            .get("properties")
            .and_then(|props| props.get(param))
            .is_some()
    }
}

/// A tool as advertised by a tool server, qualified by the server that owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub server: String,
    pub tool: ToolInfo,
}

/// A fully resolved tool invocation handed to a tool server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool: String,
    pub server: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl ToolCallRequest {
    /// Arguments as a JSON object of strings, the shape tools receive.
    pub fn to_call_params(&self) -> CallToolParams {
        let arguments: Map<String, Value> = self
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        CallToolParams {
            name: self.tool.clone(),
            arguments: Value::Object(arguments),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl CallToolParams {
    /// String argument lookup. Numbers and booleans are rendered as text.
    pub fn arg_str(&self, key: &str) -> Option<String> {
        match self.arguments.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<ToolResponseContent>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    /// Machine-readable payload alongside the text content.
    #[serde(rename = "structuredContent", skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

impl CallToolResult {
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// All text content blocks joined by newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponseContent {
    #[serde(rename = "type")]
    pub type_: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, Value>>,
}

/// Helper functions
pub fn text_result(text: impl Into<String>, is_error: Option<bool>) -> CallToolResult {
    CallToolResult {
        content: vec![ToolResponseContent {
            type_: "text".into(),
            text: text.into(),
            annotations: None,
        }],
        is_error,
        structured_content: None,
    }
}

pub fn structured_result(value: Value) -> CallToolResult {
    let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    CallToolResult {
        content: vec![ToolResponseContent {
            type_: "text".into(),
            text,
            annotations: None,
        }],
        is_error: None,
        structured_content: Some(value),
    }
}

pub fn error_result(message: impl Into<String>) -> CallToolResult {
    text_result(message, Some(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_tool() -> ToolInfo {
        ToolInfo {
            name: "write_file".into(),
            description: None,
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "content": {"type": "string"}
                },
                "required": ["path", "content"]
            }),
        }
    }

    #[test]
    fn schema_params_are_read_from_input_schema() {
        let tool = sample_tool();
        let mut declared = tool.declared_params();
        declared.sort();
        assert_eq!(declared, vec!["content".to_string(), "path".to_string()]);
        assert_eq!(tool.required_params(), vec!["path".to_string(), "content".to_string()]);
        assert!(tool.declares("path"));
        assert!(!tool.declares("mode"));
    }

    #[test]
    fn request_arguments_are_a_string_object() {
        let mut parameters = BTreeMap::new();
        parameters.insert("path".to_string(), "notes.txt".to_string());
        let request = ToolCallRequest {
            tool: "read_file".into(),
            server: "filesystem".into(),
            parameters,
        };
        let params = request.to_call_params();
        assert_eq!(params.name, "read_file");
        assert_eq!(params.arguments, json!({"path": "notes.txt"}));
        assert_eq!(params.arg_str("path").as_deref(), Some("notes.txt"));
        assert_eq!(params.arg_str("missing"), None);
    }

    #[test]
    fn result_serializes_with_protocol_field_names() {
        let result = error_result("boom");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["isError"], json!(true));
        assert_eq!(value["content"][0]["type"], json!("text"));
        assert!(value.get("structuredContent").is_none());
        assert!(result.is_error());
        assert_eq!(result.text(), "boom");
    }
}
