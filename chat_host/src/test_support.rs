//! Counting stand-ins for the tool service and LLM provider.

use crate::ai_client::{LlmProvider, LlmRequest, LlmResponse};
use crate::invoker::ToolExecutionService;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use shared_protocol_objects::{CallToolResult, CatalogEntry, ToolCallRequest, ToolInfo};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

fn tool(server: &str, name: &str, description: &str, schema: Value) -> CatalogEntry {
    CatalogEntry {
        server: server.into(),
        tool: ToolInfo {
            name: name.into(),
            description: Some(description.into()),
            input_schema: schema,
        },
    }
}

fn props(required: &[&str], optional: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = required
        .iter()
        .chain(optional)
        .map(|name| (name.to_string(), json!({ "type": "string" })))
        .collect();
    json!({ "type": "object", "properties": properties, "required": required })
}

/// Same shape as the local `mcp_tools` catalog.
pub fn sample_catalog() -> Vec<CatalogEntry> {
    vec![
        tool("filesystem", "list_directory", "List files in a directory", props(&[], &["path"])),
        tool("filesystem", "read_file", "Read a file", props(&["path"], &[])),
        tool("filesystem", "write_file", "Write a file", props(&["path", "content"], &[])),
        tool("sqlite", "list_tables", "List database tables", props(&[], &[])),
        tool("sqlite", "query_database", "Run SQL", props(&["query"], &[])),
        tool("sqlite", "describe_table", "Describe a table", props(&["table_name"], &[])),
        tool("sqlite", "get_table_data", "Read table rows", props(&["table_name"], &["limit"])),
        tool("memory", "store_memory", "Store a memory", props(&["key", "value"], &[])),
        tool("memory", "retrieve_memory", "Retrieve a memory", props(&["key"], &[])),
        tool("memory", "list_memories", "List memories", props(&[], &[])),
    ]
}

pub struct MockTools {
    reply: Result<CallToolResult, String>,
    calls: AtomicUsize,
    last: Mutex<Option<ToolCallRequest>>,
}

impl MockTools {
    pub fn replying(result: CallToolResult) -> Self {
        Self::with_reply(Ok(result))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_reply(Err(message.to_string()))
    }

    fn with_reply(reply: Result<CallToolResult, String>) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ToolCallRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutionService for MockTools {
    fn catalog(&self) -> Vec<CatalogEntry> {
        sample_catalog()
    }

    async fn execute(&self, request: ToolCallRequest) -> Result<CallToolResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request);
        self.reply.clone().map_err(|e| anyhow!(e))
    }
}

pub struct MockLlm {
    name: String,
    reply: Result<String, String>,
    calls: AtomicUsize,
    last: Mutex<Option<LlmRequest>>,
}

impl MockLlm {
    pub fn replying(name: &str, text: &str) -> Self {
        Self::with_reply(name, Ok(text.to_string()))
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self::with_reply(name, Err(message.to_string()))
    }

    fn with_reply(name: &str, reply: Result<String, String>) -> Self {
        Self {
            name: name.to_string(),
            reply,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<LlmRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());
        match &self.reply {
            Ok(text) => Ok(LlmResponse {
                text: text.clone(),
                provider: self.name.clone(),
                model: "mock".to_string(),
                tokens_used: None,
                latency_ms: 0,
            }),
            Err(message) => Err(anyhow!("{}", message)),
        }
    }
}
