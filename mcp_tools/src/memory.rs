use crate::tool_trait::{required_arg, Tool};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_protocol_objects::{structured_result, CallToolParams, CallToolResult, ToolInfo};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const SERVER_NAME: &str = "memory";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub key: String,
    pub value: String,
    #[serde(default = "chrono::Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "chrono::Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Key-value memory, optionally persisted as a JSON array after every write.
#[derive(Debug)]
pub struct MemoryStore {
    path: Option<PathBuf>,
    entries: Mutex<Vec<MemoryEntry>>,
}

impl MemoryStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Open the store at `path`, loading existing entries. An unreadable
    /// JSON document is logged and replaced by an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(data) => match serde_json::from_str::<Vec<MemoryEntry>>(&data) {
                Ok(entries) => {
                    debug!("Loaded {} memories from {}", entries.len(), path.display());
                    entries
                }
                Err(e) => {
                    warn!("Failed to parse memory file {}: {}", path.display(), e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(anyhow!("Failed to read memory file {}: {}", path.display(), e));
            }
        };
        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    async fn save(&self, entries: &[MemoryEntry]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| anyhow!("Failed to serialize memories: {}", e))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| anyhow!("Failed to write memory file {}: {}", path.display(), e))
    }

    /// Insert or replace the value stored under `key`. The change is only
    /// committed once it has been persisted.
    pub async fn store(&self, key: &str, value: &str) -> Result<MemoryEntry> {
        let mut entries = self.entries.lock().await;
        let now = Utc::now();
        let mut updated = entries.clone();
        let entry = match updated.iter_mut().find(|e| e.key == key) {
            Some(existing) => {
                existing.value = value.to_string();
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let entry = MemoryEntry {
                    key: key.to_string(),
                    value: value.to_string(),
                    created_at: now,
                    updated_at: now,
                };
                updated.push(entry.clone());
                entry
            }
        };
        self.save(&updated).await?;
        *entries = updated;
        Ok(entry)
    }

    pub async fn retrieve(&self, key: &str) -> Option<MemoryEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .find(|e| e.key == key)
            .cloned()
    }

    /// Newest first; entries created in the same instant keep reverse insertion order.
    pub async fn list(&self) -> Vec<MemoryEntry> {
        let mut entries: Vec<MemoryEntry> = self.entries.lock().await.iter().rev().cloned().collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOp {
    Store,
    Retrieve,
    List,
}

impl MemoryOp {
    pub const ALL: [MemoryOp; 3] = [MemoryOp::Store, MemoryOp::Retrieve, MemoryOp::List];

    pub fn name(&self) -> &'static str {
        match self {
            MemoryOp::Store => "store_memory",
            MemoryOp::Retrieve => "retrieve_memory",
            MemoryOp::List => "list_memories",
        }
    }

    pub fn info(&self) -> ToolInfo {
        let (description, input_schema) = match self {
            MemoryOp::Store => (
                "Store information in memory",
                json!({
                    "type": "object",
                    "properties": {
                        "key": { "type": "string" },
                        "value": { "type": "string" }
                    },
                    "required": ["key", "value"]
                }),
            ),
            MemoryOp::Retrieve => (
                "Retrieve stored information",
                json!({
                    "type": "object",
                    "properties": { "key": { "type": "string" } },
                    "required": ["key"]
                }),
            ),
            MemoryOp::List => (
                "List all stored memories",
                json!({ "type": "object", "properties": {} }),
            ),
        };
        ToolInfo {
            name: self.name().to_string(),
            description: Some(description.to_string()),
            input_schema,
        }
    }
}

#[derive(Debug)]
pub struct MemoryTool {
    op: MemoryOp,
    store: Arc<MemoryStore>,
}

impl MemoryTool {
    pub fn new(op: MemoryOp, store: Arc<MemoryStore>) -> Self {
        Self { op, store }
    }

    pub fn all(store: Arc<MemoryStore>) -> Vec<MemoryTool> {
        MemoryOp::ALL
            .iter()
            .map(|op| MemoryTool::new(*op, Arc::clone(&store)))
            .collect()
    }
}

#[async_trait]
impl Tool for MemoryTool {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn server(&self) -> &str {
        SERVER_NAME
    }

    fn info(&self) -> ToolInfo {
        self.op.info()
    }

    async fn execute(&self, params: CallToolParams) -> Result<CallToolResult> {
        let payload = match self.op {
            MemoryOp::Store => {
                let key = required_arg(&params, "key")?;
                let value = required_arg(&params, "value")?;
                let entry = self.store.store(&key, &value).await?;
                json!({
                    "key": entry.key,
                    "message": format!("Memory stored: {}", entry.key),
                })
            }
            MemoryOp::Retrieve => {
                let key = required_arg(&params, "key")?;
                match self.store.retrieve(&key).await {
                    Some(entry) => json!({ "key": entry.key, "value": entry.value }),
                    None => json!({ "key": key, "value": Value::Null }),
                }
            }
            MemoryOp::List => {
                let memories = self.store.list().await;
                json!({ "memories": memories, "count": memories.len() })
            }
        };
        Ok(structured_result(payload))
    }
}
