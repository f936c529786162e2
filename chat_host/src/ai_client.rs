use crate::anthropic::AnthropicClient;
use crate::config::{ProviderKind, ProviderSettings};
use crate::openai::OpenAIClient;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use shared_protocol_objects::Role;
use std::sync::Arc;
use std::time::Duration;

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Configuration for AI model generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 2000,
        }
    }
}

impl GenerationConfig {
    /// This config with any per-turn values laid over it.
    pub fn with_overrides(&self, overrides: &TurnOverrides) -> Self {
        Self {
            temperature: overrides.temperature.unwrap_or(self.temperature),
            max_tokens: overrides.max_tokens.unwrap_or(self.max_tokens),
        }
    }
}

/// Provider and generation settings a caller may set for a single turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOverrides {
    pub provider: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    /// Preferred provider name; the chain falls back from it on failure.
    pub provider_hint: Option<String>,
    pub config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: Option<u32>,
    pub latency_ms: u64,
}

/// Core trait for LLM backends
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> String;

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Tries the hinted (or default) provider first, then the rest in order.
pub struct ProviderChain {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl ProviderChain {
    /// The first provider is the default.
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn ordered(&self, hint: Option<&str>) -> Vec<&Arc<dyn LlmProvider>> {
        let preferred = hint
            .and_then(|h| self.providers.iter().position(|p| p.name() == h))
            .unwrap_or(0);
        let mut order: Vec<&Arc<dyn LlmProvider>> = self.providers.get(preferred).into_iter().collect();
        order.extend(
            self.providers
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != preferred)
                .map(|(_, p)| p),
        );
        order
    }
}

#[async_trait]
impl LlmProvider for ProviderChain {
    fn name(&self) -> String {
        self.providers
            .first()
            .map(|p| p.name())
            .unwrap_or_else(|| "none".to_string())
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let mut last_error = None;
        for provider in self.ordered(request.provider_hint.as_deref()) {
            match provider.generate(request).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    warn!("LLM provider {} failed: {:#}", provider.name(), err);
                    last_error = Some((provider.name(), err));
                }
            }
        }
        match last_error {
            Some((name, err)) => Err(anyhow!("all LLM providers failed; last error from {}: {:#}", name, err)),
            None => Err(anyhow!("no LLM provider is configured")),
        }
    }
}

/// Build a provider client, reading its API key from the configured variable.
pub fn create_provider(settings: &ProviderSettings, timeout: Duration) -> Result<Arc<dyn LlmProvider>> {
    let api_key = match &settings.api_key_env {
        Some(var) => std::env::var(var)
            .with_context(|| format!("{} API key not provided ({} is not set)", settings.name, var))?,
        None => String::new(),
    };
    info!("Configured LLM provider {} ({})", settings.name, settings.model);
    let provider: Arc<dyn LlmProvider> = match settings.kind {
        ProviderKind::OpenAi => Arc::new(OpenAIClient::new(
            settings.name.clone(),
            api_key,
            settings.model.clone(),
            settings.base_url.clone(),
            timeout,
        )?),
        ProviderKind::Anthropic => Arc::new(AnthropicClient::new(
            settings.name.clone(),
            api_key,
            settings.model.clone(),
            settings.base_url.clone(),
            timeout,
        )?),
    };
    Ok(provider)
}
