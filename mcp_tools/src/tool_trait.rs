use anyhow::Result;
use async_trait::async_trait;
use shared_protocol_objects::{CallToolParams, CallToolResult, CatalogEntry, ToolInfo};
use std::fmt::Debug;

/// Trait for implementing local tools
#[async_trait]
pub trait Tool: Send + Sync + Debug {
    /// Get the name of the tool
    fn name(&self) -> &str;

    /// Name of the server this tool is grouped under (`sqlite`, `filesystem`, ...)
    fn server(&self) -> &str;

    /// Get the tool info for registration
    fn info(&self) -> ToolInfo;

    /// Execute the tool with the given parameters.
    ///
    /// Tool-level failures (bad SQL, missing file) come back as a result with
    /// `is_error` set; `Err` is reserved for argument errors and broken backends.
    async fn execute(&self, params: CallToolParams) -> Result<CallToolResult>;

    fn catalog_entry(&self) -> CatalogEntry {
        CatalogEntry {
            server: self.server().to_string(),
            tool: self.info(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Missing required argument: {0}")]
    MissingArgument(String),
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },
    #[error("Path '{0}' is outside the configured root")]
    PathEscapesRoot(String),
    #[error("Tool {tool} not found on server {server}")]
    UnknownTool { server: String, tool: String },
}

/// Fetch a required string argument, treating blank values as missing.
pub fn required_arg(params: &CallToolParams, key: &str) -> Result<String, ToolError> {
    params
        .arg_str(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ToolError::MissingArgument(key.to_string()))
}
