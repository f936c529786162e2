use crate::ai_client::{LlmProvider, LlmRequest, LlmResponse};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use shared_protocol_objects::Role;
use std::time::{Duration, Instant};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    name: String,
    api_key: String,
    model: String,
    base_url: String,
    http: Client,
}

impl AnthropicClient {
    pub fn new(
        name: String,
        api_key: String,
        model: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            name,
            api_key,
            model,
            base_url,
            http,
        })
    }

    /// The messages API takes system text as a top-level field.
    fn payload(&self, request: &LlmRequest) -> Value {
        let system: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        let messages: Vec<Value> = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        let mut payload = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": request.config.max_tokens,
            "temperature": request.config.temperature,
        });
        if !system.is_empty() {
            payload["system"] = json!(system.join("\n\n"));
        }
        payload
    }
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let started = Instant::now();
        let url = format!("{}/messages", self.base_url);
        debug!("POST {} ({} messages)", url, request.messages.len());

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.payload(request))
            .send()
            .await
            .with_context(|| format!("{} request failed", self.name))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(anyhow!("Anthropic API error ({}): {}", status, error));
        }

        let response_json = response.json::<Value>().await?;
        let content = response_json["content"][0]["text"]
            .as_str()
            .context("Failed to get response text")?;
        let usage = &response_json["usage"];
        let tokens_used = match (usage["input_tokens"].as_u64(), usage["output_tokens"].as_u64()) {
            (Some(input), Some(output)) => Some((input + output) as u32),
            _ => None,
        };

        Ok(LlmResponse {
            text: content.to_string(),
            provider: self.name.clone(),
            model: response_json["model"]
                .as_str()
                .unwrap_or(&self.model)
                .to_string(),
            tokens_used,
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}
