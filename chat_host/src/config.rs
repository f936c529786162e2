use crate::ai_client::GenerationConfig;
use crate::matcher::DEFAULT_CONFIDENCE_THRESHOLD;
use mcp_tools::ToolSettings;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_ENV: &str = "CHAT_HOST_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("confidence_threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),
    #[error("default_provider '{0}' is not defined in providers")]
    UnknownProvider(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Any OpenAI-compatible chat completions API.
    #[serde(alias = "openai-compatible")]
    OpenAi,
    Anthropic,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderSettings {
    pub name: String,
    pub kind: ProviderKind,
    #[serde(default)]
    pub base_url: Option<String>,
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub confidence_threshold: f64,
    pub max_tokens: u32,
    pub temperature: f32,
    pub default_provider: String,
    pub fallback_providers: Vec<String>,
    pub providers: Vec<ProviderSettings>,
    pub request_timeout_secs: u64,
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub filesystem_root: PathBuf,
    pub memory_path: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_tokens: 2000,
            temperature: 0.3,
            default_provider: "openai".to_string(),
            fallback_providers: vec!["anthropic".to_string()],
            providers: vec![
                ProviderSettings {
                    name: "openai".to_string(),
                    kind: ProviderKind::OpenAi,
                    base_url: None,
                    model: "gpt-4o-mini".to_string(),
                    api_key_env: Some("OPENAI_API_KEY".to_string()),
                },
                ProviderSettings {
                    name: "anthropic".to_string(),
                    kind: ProviderKind::Anthropic,
                    base_url: None,
                    model: "claude-3-haiku-20240307".to_string(),
                    api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
                },
            ],
            request_timeout_secs: 60,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_path: PathBuf::from("mcp.db"),
            filesystem_root: PathBuf::from("."),
            memory_path: Some(PathBuf::from("memories.json")),
        }
    }
}

impl HostConfig {
    /// Load from `path`, else from `$CHAT_HOST_CONFIG`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                Self::from_json(&raw).map_err(|err| match err {
                    ConfigError::Parse { source, .. } => ConfigError::Parse { path, source },
                    other => other,
                })?
            }
            None => Self::default(),
        };
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::InvalidThreshold(self.confidence_threshold));
        }
        if !self.providers.is_empty() && self.provider(&self.default_provider).is_none() {
            return Err(ConfigError::UnknownProvider(self.default_provider.clone()));
        }
        Ok(())
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderSettings> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Default provider followed by the configured fallbacks, skipping
    /// names with no definition.
    pub fn provider_order(&self) -> Vec<&ProviderSettings> {
        let mut order: Vec<&ProviderSettings> = Vec::new();
        for name in std::iter::once(&self.default_provider).chain(&self.fallback_providers) {
            if let Some(p) = self.provider(name) {
                if !order.iter().any(|o| o.name == p.name) {
                    order.push(p);
                }
            }
        }
        order
    }

    pub fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tool_settings(&self) -> ToolSettings {
        ToolSettings {
            database_path: self.database_path.clone(),
            filesystem_root: self.filesystem_root.clone(),
            memory_path: self.memory_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config = HostConfig::from_json(r#"{"max_tokens": 512}"#).unwrap();
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.confidence_threshold, 0.6);
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.database_path, PathBuf::from("mcp.db"));
        let names: Vec<&str> = config.provider_order().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["openai", "anthropic"]);
    }

    #[test]
    fn threshold_outside_unit_range_is_rejected() {
        assert!(matches!(
            HostConfig::from_json(r#"{"confidence_threshold": 1.2}"#),
            Err(ConfigError::InvalidThreshold(t)) if t == 1.2
        ));
        assert!(HostConfig::from_json(r#"{"confidence_threshold": 0.0}"#).is_ok());
    }

    #[test]
    fn custom_providers_and_unknown_default() {
        let raw = r#"{
            "default_provider": "local",
            "fallback_providers": ["missing"],
            "providers": [
                {"name": "local", "kind": "openai", "base_url": "http://localhost:11434/v1", "model": "llama3"}
            ]
        }"#;
        let config = HostConfig::from_json(raw).unwrap();
        let order = config.provider_order();
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(order[0].api_key_env, None);

        let bad = r#"{"default_provider": "nope"}"#;
        assert!(matches!(
            HostConfig::from_json(bad),
            Err(ConfigError::UnknownProvider(name)) if name == "nope"
        ));
    }

    #[test]
    fn load_reads_an_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"bind_addr": "0.0.0.0:8080", "memory_path": null}}"#).unwrap();
        let config = HostConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.memory_path, None);

        let err = HostConfig::load(Some(Path::new("/definitely/not/here.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
