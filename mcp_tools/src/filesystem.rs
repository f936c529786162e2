use crate::tool_trait::{required_arg, Tool, ToolError};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use shared_protocol_objects::{error_result, structured_result, CallToolParams, CallToolResult, ToolInfo};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub const SERVER_NAME: &str = "filesystem";

/// Directory that all filesystem tools are confined to.
#[derive(Debug, Clone)]
pub struct FileSystemRoot {
    root: PathBuf,
}

impl FileSystemRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&root))
                .unwrap_or(root)
        };
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a user supplied path against the root. Parent-directory
    /// components are rejected outright; absolute paths must already live
    /// under the root.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, ToolError> {
        let candidate = Path::new(raw.trim());
        if candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(ToolError::PathEscapesRoot(raw.to_string()));
        }
        if candidate.is_absolute() {
            if candidate.starts_with(&self.root) {
                Ok(candidate.to_path_buf())
            } else {
                Err(ToolError::PathEscapesRoot(raw.to_string()))
            }
        } else {
            Ok(self.root.join(candidate))
        }
    }

    /// Resolve `raw`, then follow symlinks on the deepest existing ancestor
    /// and require the real location to stay under the real root.
    pub async fn resolve_confined(&self, raw: &str) -> Result<PathBuf, ToolError> {
        let path = self.resolve(raw)?;
        let real_root = tokio::fs::canonicalize(&self.root)
            .await
            .unwrap_or_else(|_| self.root.clone());
        let mut existing = Some(path.as_path());
        while let Some(current) = existing {
            if let Ok(real) = tokio::fs::canonicalize(current).await {
                if !real.starts_with(&real_root) {
                    return Err(ToolError::PathEscapesRoot(raw.to_string()));
                }
                break;
            }
            existing = current.parent();
        }
        Ok(path)
    }

    pub async fn read_file(&self, raw: &str) -> Result<Value> {
        let path = self.resolve_confined(raw).await?;
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(json!({ "path": raw, "content": content }))
    }

    pub async fn write_file(&self, raw: &str, content: &str) -> Result<Value> {
        let path = self.resolve_confined(raw).await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        Ok(json!({
            "path": raw,
            "bytes_written": content.len(),
            "message": format!("File written successfully: {}", raw),
        }))
    }

    pub async fn list_directory(&self, raw: &str) -> Result<Value> {
        let path = self.resolve_confined(raw).await?;
        let mut entries = tokio::fs::read_dir(&path).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await?.is_dir() {
                name.push('/');
            }
            files.push(name);
        }
        files.sort();
        Ok(json!({ "path": raw, "files": files, "count": files.len() }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSystemOp {
    ReadFile,
    WriteFile,
    ListDirectory,
}

impl FileSystemOp {
    pub const ALL: [FileSystemOp; 3] = [
        FileSystemOp::ListDirectory,
        FileSystemOp::ReadFile,
        FileSystemOp::WriteFile,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FileSystemOp::ReadFile => "read_file",
            FileSystemOp::WriteFile => "write_file",
            FileSystemOp::ListDirectory => "list_directory",
        }
    }

    pub fn info(&self) -> ToolInfo {
        let (description, input_schema) = match self {
            FileSystemOp::ReadFile => (
                "Read contents of a file",
                json!({
                    "type": "object",
                    "properties": { "path": { "type": "string" } },
                    "required": ["path"]
                }),
            ),
            FileSystemOp::WriteFile => (
                "Write content to a file",
                json!({
                    "type": "object",
                    "properties": {
                        "path": { "type": "string" },
                        "content": { "type": "string" }
                    },
                    "required": ["path", "content"]
                }),
            ),
            FileSystemOp::ListDirectory => (
                "List files in a directory",
                json!({
                    "type": "object",
                    "properties": {
                        "path": { "type": "string", "default": "." }
                    }
                }),
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
pub struct FileSystemTool {
    op: FileSystemOp,
    root: Arc<FileSystemRoot>,
}

impl FileSystemTool {
    pub fn new(op: FileSystemOp, root: Arc<FileSystemRoot>) -> Self {
        Self { op, root }
    }

    pub fn all(root: Arc<FileSystemRoot>) -> Vec<FileSystemTool> {
        FileSystemOp::ALL
            .iter()
            .map(|op| FileSystemTool::new(*op, Arc::clone(&root)))
            .collect()
    }
}

#[async_trait]
impl Tool for FileSystemTool {
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
        let outcome = match self.op {
            FileSystemOp::ReadFile => {
                let path = required_arg(&params, "path")?;
                self.root.read_file(&path).await
            }
            FileSystemOp::WriteFile => {
                let path = required_arg(&params, "path")?;
                let content = params
                    .arg_str("content")
                    .ok_or_else(|| ToolError::MissingArgument("content".into()))?;
                self.root.write_file(&path, &content).await
            }
            FileSystemOp::ListDirectory => {
                let path = params
                    .arg_str("path")
                    .filter(|p| !p.trim().is_empty())
                    .unwrap_or_else(|| ".".to_string());
                self.root.list_directory(&path).await
            }
        };

        Ok(match outcome {
            Ok(value) => {
                debug!("filesystem tool {} succeeded", self.op.name());
                structured_result(value)
            }
            Err(e) => {
                warn!("filesystem tool {} failed: {}", self.op.name(), e);
                error_result(format!("Filesystem tool execution failed: {}", e))
            }
        })
    }
}
