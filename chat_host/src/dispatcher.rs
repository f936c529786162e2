use crate::ai_client::{GenerationConfig, LlmProvider, TurnOverrides};
use crate::conversation_state::ConversationContext;
use crate::error::{DispatchError, RegistryError};
use crate::fallback::{system_prompt, FallbackPath};
use crate::invoker::{ToolCallResult, ToolExecutionService, ToolInvoker};
use crate::matcher::{MatchResult, Matcher, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::patterns::{CommandHelp, PatternRegistry};
use crate::render::render_tool_result;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPath {
    Tool,
    Llm,
}

/// Outcome of one chat turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "path", rename_all = "lowercase")]
pub enum ChatTurnResult {
    Tool {
        rule_id: String,
        tool: String,
        server: String,
        parameters: BTreeMap<String, String>,
        confidence: f64,
        result: ToolCallResult,
        rendered: String,
    },
    Llm {
        text: String,
        provider: String,
        model: String,
        tokens_used: Option<u32>,
        latency_ms: u64,
    },
}

impl ChatTurnResult {
    pub fn path(&self) -> TurnPath {
        match self {
            ChatTurnResult::Tool { .. } => TurnPath::Tool,
            ChatTurnResult::Llm { .. } => TurnPath::Llm,
        }
    }

    /// Reply text for the user: rendered tool output or the LLM's answer.
    pub fn text(&self) -> &str {
        match self {
            ChatTurnResult::Tool { rendered, .. } => rendered,
            ChatTurnResult::Llm { text, .. } => text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub confidence_threshold: f64,
    pub provider_hint: Option<String>,
    pub generation: GenerationConfig,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            provider_hint: None,
            generation: GenerationConfig::default(),
        }
    }
}

/// Routes each utterance to a tool or to the LLM, in one hop.
pub struct Dispatcher {
    matcher: Matcher,
    invoker: ToolInvoker,
    fallback: FallbackPath,
}

impl Dispatcher {
    pub fn new(matcher: Matcher, invoker: ToolInvoker, fallback: FallbackPath) -> Self {
        Self {
            matcher,
            invoker,
            fallback,
        }
    }

    /// Wire the collaborators together, rejecting a registry that does not
    /// fit the tool catalog.
    pub fn from_parts(
        registry: Arc<PatternRegistry>,
        tools: Arc<dyn ToolExecutionService>,
        llm: Arc<dyn LlmProvider>,
        settings: DispatchSettings,
    ) -> Result<Self, RegistryError> {
        let invoker = ToolInvoker::new(tools);
        registry.validate(invoker.catalog())?;
        info!(
            "Dispatcher ready: {} patterns over {} tools, threshold {:.2}",
            registry.len(),
            invoker.catalog().len(),
            settings.confidence_threshold
        );
        let fallback = FallbackPath::new(
            llm,
            system_prompt(invoker.catalog()),
            settings.provider_hint,
            settings.generation,
        );
        let matcher = Matcher::with_threshold(registry, settings.confidence_threshold);
        Ok(Self::new(matcher, invoker, fallback))
    }

    pub fn commands(&self) -> Vec<CommandHelp> {
        self.matcher.registry().commands()
    }

    pub fn suggest(&self, utterance: &str) -> Vec<String> {
        self.matcher.registry().suggest(utterance)
    }

    pub async fn dispatch(
        &self,
        utterance: &str,
        context: &ConversationContext,
    ) -> Result<ChatTurnResult, DispatchError> {
        self.dispatch_with(utterance, context, &TurnOverrides::default())
            .await
    }

    /// Dispatch one turn. `overrides` only affect the LLM path.
    pub async fn dispatch_with(
        &self,
        utterance: &str,
        context: &ConversationContext,
        overrides: &TurnOverrides,
    ) -> Result<ChatTurnResult, DispatchError> {
        let report = self.matcher.evaluate(utterance);
        match report.best {
            Some(matched) => self.run_tool(matched).await,
            None => {
                if !report.downgraded.is_empty() {
                    let rules: Vec<&str> = report.downgraded.iter().map(|e| e.rule_id()).collect();
                    info!(
                        "Utterance matched {} but required parameters were missing; using LLM",
                        rules.join(", ")
                    );
                } else if let Some(weak) = &report.below_threshold {
                    info!(
                        "Best rule {} scored {:.2}, below threshold {:.2}; using LLM",
                        weak.rule_id,
                        weak.confidence,
                        self.matcher.threshold()
                    );
                } else {
                    debug!("No pattern matched; using LLM");
                }
                let response = self
                    .fallback
                    .respond(utterance, context, overrides)
                    .await?;
                Ok(ChatTurnResult::Llm {
                    text: response.text,
                    provider: response.provider,
                    model: response.model,
                    tokens_used: response.tokens_used,
                    latency_ms: response.latency_ms,
                })
            }
        }
    }

    async fn run_tool(&self, matched: MatchResult) -> Result<ChatTurnResult, DispatchError> {
        let result = self.invoker.invoke(&matched).await?;
        let rendered = render_tool_result(&matched.tool, &result, &matched.parameters);
        Ok(ChatTurnResult::Tool {
            rule_id: matched.rule_id,
            tool: matched.tool,
            server: matched.server,
            parameters: matched.parameters,
            confidence: matched.confidence,
            result,
            rendered,
        })
    }
}
