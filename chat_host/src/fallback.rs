use crate::ai_client::{GenerationConfig, LlmProvider, LlmRequest, LlmResponse, Message, TurnOverrides};
use crate::conversation_state::ConversationContext;
use crate::error::DispatchError;
use log::{info, warn};
use shared_protocol_objects::{CatalogEntry, Role};
use std::sync::Arc;

/// System prompt listing the tools the host can run.
pub fn system_prompt(catalog: &[CatalogEntry]) -> String {
    let mut prompt = String::from(
        "You are a helpful AI assistant with access to MCP (Model Context Protocol) tools.\n\nAvailable Tools:\n",
    );
    if catalog.is_empty() {
        prompt.push_str("(none)\n");
    }
    for entry in catalog {
        let description = entry.tool.description.as_deref().unwrap_or("No description");
        prompt.push_str(&format!("- {} ({}): {}\n", entry.tool.name, entry.server, description));
    }
    prompt.push_str(
        "\nThe host runs these tools directly when a request clearly names one. \
         Answer everything else conversationally, and suggest a tool phrasing when one would help.",
    );
    prompt
}

/// Sends unmatched utterances to the LLM.
pub struct FallbackPath {
    llm: Arc<dyn LlmProvider>,
    system_prompt: String,
    provider_hint: Option<String>,
    config: GenerationConfig,
}

impl FallbackPath {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        system_prompt: String,
        provider_hint: Option<String>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            llm,
            system_prompt,
            provider_hint,
            config,
        }
    }

    pub fn build_messages(&self, utterance: &str, context: &ConversationContext) -> Vec<Message> {
        let mut messages = Vec::with_capacity(context.len() + 2);
        messages.push(Message::new(Role::System, self.system_prompt.clone()));
        messages.extend(context.messages().iter().cloned());
        messages.push(Message::new(Role::User, utterance));
        messages
    }

    /// One LLM call, no retry. `overrides` replace the provider hint and
    /// generation settings for this turn only.
    pub async fn respond(
        &self,
        utterance: &str,
        context: &ConversationContext,
        overrides: &TurnOverrides,
    ) -> Result<LlmResponse, DispatchError> {
        let request = LlmRequest {
            messages: self.build_messages(utterance, context),
            provider_hint: overrides
                .provider
                .clone()
                .or_else(|| self.provider_hint.clone()),
            config: self.config.with_overrides(overrides),
        };
        match self.llm.generate(&request).await {
            Ok(response) => {
                info!(
                    "LLM response from {} ({}) in {}ms",
                    response.provider, response.model, response.latency_ms
                );
                Ok(response)
            }
            Err(err) => {
                let provider = request
                    .provider_hint
                    .clone()
                    .unwrap_or_else(|| self.llm.name());
                warn!("LLM fallback failed: {:#}", err);
                Err(DispatchError::CollaboratorUnavailable {
                    provider,
                    message: format!("{:#}", err),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_catalog, MockLlm};
    use pretty_assertions::assert_eq;

    fn fallback(llm: Arc<MockLlm>) -> FallbackPath {
        FallbackPath::new(
            llm,
            system_prompt(&sample_catalog()),
            Some("openai".into()),
            GenerationConfig::default(),
        )
    }

    #[test]
    fn prompt_lists_catalog_tools() {
        let prompt = system_prompt(&sample_catalog());
        assert!(prompt.contains("- list_tables (sqlite): List database tables"));
        assert!(prompt.contains("- read_file (filesystem)"));
    }

    #[test]
    fn messages_wrap_history_between_prompt_and_utterance() {
        let path = fallback(Arc::new(MockLlm::replying("openai", "ok")));
        let mut context = ConversationContext::new();
        context.record_turn("hello", "hi there");
        let messages = path.build_messages("tell me a joke", &context);
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(messages[3].content, "tell me a joke");
    }

    #[tokio::test]
    async fn text_is_returned_unchanged() {
        let llm = Arc::new(MockLlm::replying("openai", "  A joke.\n"));
        let response = fallback(llm.clone())
            .respond("tell me a joke", &ConversationContext::new(), &TurnOverrides::default())
            .await
            .unwrap();
        assert_eq!(response.text, "  A joke.\n");
        assert_eq!(llm.calls(), 1);
        let seen = llm.last_request().unwrap();
        assert_eq!(seen.provider_hint.as_deref(), Some("openai"));
        assert_eq!(seen.config.max_tokens, 2000);
    }

    #[tokio::test]
    async fn turn_overrides_replace_hint_and_generation_settings() {
        let llm = Arc::new(MockLlm::replying("openai", "ok"));
        let path = fallback(llm.clone());
        let overrides = TurnOverrides {
            provider: Some("anthropic".into()),
            max_tokens: Some(100),
            temperature: None,
        };
        path.respond("tell me a joke", &ConversationContext::new(), &overrides)
            .await
            .unwrap();
        let seen = llm.last_request().unwrap();
        assert_eq!(seen.provider_hint.as_deref(), Some("anthropic"));
        assert_eq!(
            seen.config,
            GenerationConfig {
                temperature: 0.3,
                max_tokens: 100
            }
        );

        path.respond("again", &ConversationContext::new(), &TurnOverrides::default()).await.unwrap();
        let seen = llm.last_request().unwrap();
        assert_eq!(seen.provider_hint.as_deref(), Some("openai"));
        assert_eq!(seen.config, GenerationConfig::default());
    }

    #[tokio::test]
    async fn failure_names_the_overridden_provider() {
        let llm = Arc::new(MockLlm::failing("chain", "down"));
        let overrides = TurnOverrides {
            provider: Some("anthropic".into()),
            ..TurnOverrides::default()
        };
        let err = fallback(llm)
            .respond("hi", &ConversationContext::new(), &overrides)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::CollaboratorUnavailable { ref provider, .. } if provider == "anthropic"
        ));
    }

    #[tokio::test]
    async fn failures_are_collaborator_unavailable() {
        let llm = Arc::new(MockLlm::failing("openai", "timeout"));
        let err = fallback(llm.clone())
            .respond("tell me a joke", &ConversationContext::new(), &TurnOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::CollaboratorUnavailable { ref provider, ref message }
                if provider == "openai" && message.contains("timeout")
        ));
        assert_eq!(llm.calls(), 1);
    }
}
