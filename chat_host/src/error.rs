use thiserror::Error;

/// A rule matched the utterance structurally but could not produce its
/// parameters. Never surfaced to callers; the rule is treated as a non-match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternExtractionError {
    #[error("rule {rule_id} matched but its pattern produced no captures")]
    NoCaptures { rule_id: String },
    #[error("rule {rule_id} matched but required parameter '{param}' is missing")]
    MissingParameter { rule_id: String, param: String },
}

impl PatternExtractionError {
    pub fn rule_id(&self) -> &str {
        match self {
            PatternExtractionError::NoCaptures { rule_id } => rule_id,
            PatternExtractionError::MissingParameter { rule_id, .. } => rule_id,
        }
    }
}

/// Problems with a pattern registry, detected when it is built or validated
/// against the tool catalog at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid pattern for rule {rule_id}: {source}")]
    InvalidPattern {
        rule_id: String,
        #[source]
        source: regex::Error,
    },
    #[error("duplicate rule id {0}")]
    DuplicateRule(String),
    #[error("rule {rule_id} has confidence {confidence} outside [0, 1]")]
    InvalidConfidence { rule_id: String, confidence: f64 },
    #[error("rule {rule_id} maps capture group '{group}' that its pattern does not define")]
    UnknownGroup { rule_id: String, group: String },
    #[error("rule {rule_id} targets {server}/{tool}, which the tool service does not provide")]
    UnknownTool {
        rule_id: String,
        server: String,
        tool: String,
    },
    #[error("rule {rule_id} sets parameter '{param}' that {tool} does not declare")]
    UndeclaredParameter {
        rule_id: String,
        tool: String,
        param: String,
    },
    #[error("rule {rule_id} can never supply parameter '{param}' required by {tool}")]
    UnsatisfiableParameter {
        rule_id: String,
        tool: String,
        param: String,
    },
}

/// Errors that end a chat turn.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The LLM provider could not be reached or returned an error.
    #[error("could not get a response from {provider}: {message}")]
    CollaboratorUnavailable { provider: String, message: String },
    /// A matched rule produced a request the tool catalog rejects. The
    /// registry is validated at startup, so this indicates a bug.
    #[error("malformed tool request for {server}/{tool}: {reason}")]
    MalformedRequest {
        tool: String,
        server: String,
        reason: String,
    },
}
