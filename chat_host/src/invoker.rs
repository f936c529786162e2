use crate::error::DispatchError;
use crate::matcher::MatchResult;
use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;
use shared_protocol_objects::{CallToolResult, CatalogEntry, ToolCallRequest};
use std::sync::Arc;

/// Whatever actually runs tools: the local backends, or a remote tool server.
#[async_trait]
pub trait ToolExecutionService: Send + Sync {
    fn catalog(&self) -> Vec<CatalogEntry>;

    async fn execute(&self, request: ToolCallRequest) -> Result<CallToolResult>;
}

/// Outcome of one tool call. Exactly one of `payload` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolCallResult {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.into()),
        }
    }

    fn from_tool_result(result: CallToolResult) -> Self {
        if result.is_error() {
            return Self::failed(result.text());
        }
        let payload = match result.structured_content {
            Some(value) => value,
            None => {
                let text = result.text();
                serde_json::from_str(&text).unwrap_or(Value::String(text))
            }
        };
        Self::ok(payload)
    }
}

pub struct ToolInvoker {
    service: Arc<dyn ToolExecutionService>,
    catalog: Vec<CatalogEntry>,
}

impl ToolInvoker {
    /// Snapshots the service catalog; it is used to vet every request.
    pub fn new(service: Arc<dyn ToolExecutionService>) -> Self {
        let catalog = service.catalog();
        Self { service, catalog }
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    /// Turn a match into a request, checking it against the catalog.
    pub fn request_for(&self, matched: &MatchResult) -> Result<ToolCallRequest, DispatchError> {
        let malformed = |reason: String| DispatchError::MalformedRequest {
            tool: matched.tool.clone(),
            server: matched.server.clone(),
            reason,
        };
        let entry = self
            .catalog
            .iter()
            .find(|e| e.server == matched.server && e.tool.name == matched.tool)
            .ok_or_else(|| malformed("tool is not in the catalog".to_string()))?;

        if let Some(param) = matched.parameters.keys().find(|p| !entry.tool.declares(p)) {
            return Err(malformed(format!("undeclared parameter '{param}'")));
        }
        if let Some(param) = entry
            .tool
            .required_params()
            .into_iter()
            .find(|p| !matched.parameters.contains_key(p))
        {
            return Err(malformed(format!("missing required parameter '{param}'")));
        }

        Ok(ToolCallRequest {
            tool: matched.tool.clone(),
            server: matched.server.clone(),
            parameters: matched.parameters.clone(),
        })
    }

    /// Run the call exactly once. Tool failures come back as an unsuccessful
    /// result; only a request the catalog rejects is an error.
    pub async fn invoke(&self, matched: &MatchResult) -> Result<ToolCallResult, DispatchError> {
        let request = self.request_for(matched)?;
        info!("Invoking {}/{}", request.server, request.tool);
        match self.service.execute(request).await {
            Ok(result) => {
                let outcome = ToolCallResult::from_tool_result(result);
                if let Some(err) = &outcome.error {
                    warn!("Tool {}/{} reported an error: {}", matched.server, matched.tool, err);
                }
                Ok(outcome)
            }
            Err(err) => {
                warn!("Tool {}/{} failed: {:#}", matched.server, matched.tool, err);
                Ok(ToolCallResult::failed(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_catalog, MockTools};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use shared_protocol_objects::{error_result, structured_result, text_result};
    use std::collections::BTreeMap;

    fn matched(tool: &str, server: &str, params: &[(&str, &str)]) -> MatchResult {
        MatchResult {
            rule_id: "test".into(),
            tool: tool.into(),
            server: server.into(),
            parameters: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            confidence: 0.9,
        }
    }

    #[tokio::test]
    async fn structured_content_becomes_the_payload() {
        let tools = Arc::new(MockTools::replying(structured_result(json!({"tables": ["users"]}))));
        let invoker = ToolInvoker::new(tools.clone());
        let result = invoker.invoke(&matched("list_tables", "sqlite", &[])).await.unwrap();
        assert_eq!(result, ToolCallResult::ok(json!({"tables": ["users"]})));
        assert_eq!(tools.calls(), 1);
    }

    #[tokio::test]
    async fn plain_text_is_kept_as_a_string() {
        let tools = Arc::new(MockTools::replying(text_result("hello", None)));
        let invoker = ToolInvoker::new(tools);
        let result = invoker
            .invoke(&matched("read_file", "filesystem", &[("path", "a.txt")]))
            .await
            .unwrap();
        assert_eq!(result.payload, Some(json!("hello")));
    }

    #[tokio::test]
    async fn tool_errors_are_unsuccessful_results() {
        let tools = Arc::new(MockTools::replying(error_result("no such table")));
        let invoker = ToolInvoker::new(tools);
        let result = invoker.invoke(&matched("list_tables", "sqlite", &[])).await.unwrap();
        assert_eq!(result, ToolCallResult::failed("no such table"));

        let failing = Arc::new(MockTools::failing("connection reset"));
        let invoker = ToolInvoker::new(failing.clone());
        let result = invoker.invoke(&matched("list_tables", "sqlite", &[])).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("connection reset"));
        assert_eq!(failing.calls(), 1);
    }

    #[tokio::test]
    async fn requests_outside_the_catalog_are_malformed() {
        let tools = Arc::new(MockTools::replying(text_result("unused", None)));
        let invoker = ToolInvoker::new(tools.clone());

        let unknown = invoker.invoke(&matched("drop_everything", "sqlite", &[])).await;
        assert!(matches!(unknown, Err(DispatchError::MalformedRequest { .. })));

        let missing = invoker.invoke(&matched("read_file", "filesystem", &[])).await;
        assert!(matches!(
            missing,
            Err(DispatchError::MalformedRequest { reason, .. }) if reason.contains("'path'")
        ));
        assert_eq!(tools.calls(), 0);
    }

    #[test]
    fn catalog_is_snapshotted() {
        let invoker = ToolInvoker::new(Arc::new(MockTools::replying(text_result("", None))));
        assert_eq!(invoker.catalog().len(), sample_catalog().len());
    }
}
