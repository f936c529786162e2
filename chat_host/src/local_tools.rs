use crate::invoker::ToolExecutionService;
use anyhow::Result;
use async_trait::async_trait;
use mcp_tools::ToolRegistry;
use shared_protocol_objects::{CallToolResult, CatalogEntry, ToolCallRequest};

/// Runs tools in-process through the `mcp_tools` registry.
#[async_trait]
impl ToolExecutionService for ToolRegistry {
    fn catalog(&self) -> Vec<CatalogEntry> {
        self.list_tools()
    }

    async fn execute(&self, request: ToolCallRequest) -> Result<CallToolResult> {
        self.call(&request).await
    }
}
