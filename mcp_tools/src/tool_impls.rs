use crate::filesystem::{FileSystemRoot, FileSystemTool};
use crate::memory::{MemoryStore, MemoryTool};
use crate::sqlite::{SqliteDatabase, SqliteTool};
use crate::tool_trait::{Tool, ToolError};

use anyhow::Result;
use shared_protocol_objects::{CallToolResult, CatalogEntry, ToolCallRequest};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Where the local tool backends keep their data.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub database_path: PathBuf,
    pub filesystem_root: PathBuf,
    /// `None` keeps memories in process only.
    pub memory_path: Option<PathBuf>,
}

// Registry to manage all available tools, keyed by (server, tool name)
#[derive(Clone, Debug)]
pub struct ToolRegistry {
    tools: Arc<HashMap<(String, String), Arc<dyn Tool>>>,
    order: Arc<Vec<(String, String)>>,
}

impl ToolRegistry {
    pub fn with_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut tool_map = HashMap::new();
        let mut order = Vec::new();
        for tool in tools {
            let key = (tool.server().to_string(), tool.name().to_string());
            if tool_map.insert(key.clone(), tool).is_none() {
                order.push(key);
            }
        }
        Self {
            tools: Arc::new(tool_map),
            order: Arc::new(order),
        }
    }

    pub fn get_tool(&self, server: &str, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .get(&(server.to_string(), name.to_string()))
            .cloned()
    }

    /// Catalog in registration order.
    pub fn list_tools(&self) -> Vec<CatalogEntry> {
        self.order
            .iter()
            .filter_map(|key| self.tools.get(key))
            .map(|tool| tool.catalog_entry())
            .collect()
    }

    pub async fn call(&self, request: &ToolCallRequest) -> Result<CallToolResult> {
        let tool = self
            .get_tool(&request.server, &request.tool)
            .ok_or_else(|| ToolError::UnknownTool {
                server: request.server.clone(),
                tool: request.tool.clone(),
            })?;
        debug!("Executing {}/{} with {:?}", request.server, request.tool, request.parameters);
        tool.execute(request.to_call_params()).await
    }
}

// Factory function to create all available tools
pub async fn create_tools(settings: &ToolSettings) -> Result<Vec<Arc<dyn Tool>>> {
    let mut tools: Vec<Arc<dyn Tool>> = Vec::new();

    let root = Arc::new(FileSystemRoot::new(settings.filesystem_root.clone()));
    info!("Filesystem tools rooted at {}", root.root().display());
    for tool in FileSystemTool::all(root) {
        tools.push(Arc::new(tool));
    }

    let db = Arc::new(SqliteDatabase::new(settings.database_path.clone()));
    info!("SQLite tools using {}", db.path().display());
    for tool in SqliteTool::all(db) {
        tools.push(Arc::new(tool));
    }

    let store = match &settings.memory_path {
        Some(path) => MemoryStore::open(path).await?,
        None => MemoryStore::in_memory(),
    };
    for tool in MemoryTool::all(Arc::new(store)) {
        tools.push(Arc::new(tool));
    }

    Ok(tools)
}
