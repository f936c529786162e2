pub mod ai_client;
pub mod anthropic;
pub mod config;
pub mod conversation_state;
pub mod dispatcher;
pub mod error;
pub mod fallback;
pub mod invoker;
pub mod local_tools;
pub mod matcher;
pub mod openai;
pub mod patterns;
pub mod render;
pub mod web_interface;

#[cfg(test)]
mod test_support;

pub use dispatcher::{ChatTurnResult, DispatchSettings, Dispatcher, TurnPath};
pub use error::{DispatchError, PatternExtractionError, RegistryError};
pub use matcher::{MatchResult, Matcher};
pub use patterns::{PatternRegistry, PatternRule};
