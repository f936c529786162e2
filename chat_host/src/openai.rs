use crate::ai_client::{LlmProvider, LlmRequest, LlmResponse};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    name: String,
    api_key: String,
    model: String,
    base_url: String,
    http: Client,
}

impl OpenAIClient {
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

    fn payload(&self, request: &LlmRequest) -> Value {
        json!({
            "model": self.model,
            "messages": request.messages.iter().map(|m| {
                json!({ "role": m.role.as_str(), "content": m.content })
            }).collect::<Vec<_>>(),
            "temperature": request.config.temperature,
            "max_tokens": request.config.max_tokens,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAIClient {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let started = Instant::now();
        let url = format!("{}/chat/completions", self.base_url);
        debug!("POST {} ({} messages)", url, request.messages.len());

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.payload(request))
            .send()
            .await
            .with_context(|| format!("{} request failed", self.name))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(anyhow!("{} API error ({}): {}", self.name, status, error));
        }

        let response_json = response.json::<Value>().await?;
        let text = response_json["choices"][0]["message"]["content"]
            .as_str()
            .context("Failed to get response text")?;
        let tokens_used = response_json["usage"]["total_tokens"]
            .as_u64()
            .map(|t| t as u32);
        let model = response_json["model"]
            .as_str()
            .unwrap_or(&self.model)
            .to_string();

        Ok(LlmResponse {
            text: text.to_string(),
            provider: self.name.clone(),
            model,
            tokens_used,
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_client::{GenerationConfig, Message};
    use pretty_assertions::assert_eq;
    use shared_protocol_objects::Role;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenAIClient {
        OpenAIClient::new(
            "openai".into(),
            "sk-test".into(),
            "gpt-4o-mini".into(),
            Some(format!("{}/v1/", server.uri())),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn request() -> LlmRequest {
        LlmRequest {
            messages: vec![
                Message::new(Role::System, "be brief"),
                Message::new(Role::User, "tell me a joke"),
            ],
            provider_hint: None,
            config: GenerationConfig::default(),
        }
    }

    #[tokio::test]
    async fn parses_a_chat_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 2000,
                "messages": [{"role": "system", "content": "be brief"}, {"role": "user", "content": "tell me a joke"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-4o-mini-2024-07-18",
                "choices": [{"message": {"role": "assistant", "content": "Why did the crab cross the road?"}}],
                "usage": {"total_tokens": 42}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server).generate(&request()).await.unwrap();
        assert_eq!(response.text, "Why did the crab cross the road?");
        assert_eq!(response.provider, "openai");
        assert_eq!(response.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(response.tokens_used, Some(42));
    }

    #[tokio::test]
    async fn http_errors_are_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = client(&server).generate(&request()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("429"), "{message}");
        assert!(message.contains("rate limited"), "{message}");
    }

    #[tokio::test]
    async fn missing_content_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        assert!(client(&server).generate(&request()).await.is_err());
    }
}
