use crate::ai_client::Message;
use console::style;
use shared_protocol_objects::Role;

pub fn format_json_output(json_str: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(json_str) {
        Ok(value) => format!(
            "```json\n{}\n```",
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| json_str.to_string())
        ),
        Err(_) => json_str.to_string(),
    }
}

fn format_markdown(text: &str) -> String {
    let mut formatted = String::new();
    for (i, part) in text.split("```").enumerate() {
        if i % 2 == 1 {
            formatted.push_str(&format!("```{}```\n", part));
            continue;
        }
        for line in part.lines() {
            if line.starts_with("# ") {
                formatted.push_str(&format!("{}\n", style(line).cyan().bold()));
            } else if line.starts_with("**") && line.ends_with("**") && line.len() > 4 {
                formatted.push_str(&format!("{}\n", style(&line[2..line.len() - 2]).bold()));
            } else if let Some(item) = line.strip_prefix("• ").or_else(|| line.strip_prefix("- ")) {
                formatted.push_str(&format!("  {} {}\n", style("•").cyan(), item));
            } else {
                formatted.push_str(&format!("{}\n", line));
            }
        }
    }
    formatted
}

/// CLI rendering of a tool turn.
pub fn format_tool_response(tool_name: &str, response: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n", style("Tool Response:").green().bold()));
    output.push_str(&format!("└─ {}\n", style(tool_name).yellow()));
    let trimmed = response.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        output.push_str(&format_json_output(response));
    } else {
        output.push_str(&format_markdown(response));
    }
    output
}

pub fn format_chat_message(role: Role, content: &str) -> String {
    let role_style = match role {
        Role::System => style("System").blue().bold(),
        Role::User => style("User").magenta().bold(),
        Role::Assistant => style("Assistant").cyan().bold(),
    };
    format!("{}: {}", role_style, format_markdown(content))
}

/// Prior turns of one conversation, oldest first. Never includes the
/// system prompt; the fallback path adds that per request.
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    messages: Vec<Message>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn add_user_message(&mut self, content: &str) {
        self.messages.push(Message::new(Role::User, content));
    }

    pub fn add_assistant_message(&mut self, content: &str) {
        self.messages.push(Message::new(Role::Assistant, content));
    }

    /// Record a finished turn.
    pub fn record_turn(&mut self, utterance: &str, reply: &str) {
        self.add_user_message(utterance);
        self.add_assistant_message(reply);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn turns_are_recorded_in_order() {
        let mut context = ConversationContext::new();
        context.record_turn("hi", "hello");
        context.add_user_message("again");
        let roles: Vec<Role> = context.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        context.clear();
        assert!(context.is_empty());
    }

    #[test]
    fn json_responses_are_pretty_printed() {
        let out = format_json_output(r#"{"a":1}"#);
        assert_eq!(out, "```json\n{\n  \"a\": 1\n}\n```");
        assert_eq!(format_json_output("not json"), "not json");
    }
}
