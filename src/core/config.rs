//! Configuration management for aiagent
//!
//! Supports environment variables (optionally from a `.env` file), a config
//! file and built-in defaults. Loaded once at startup and handed to
//! constructors; nothing below `main` reads the environment.
//!
//! Config file location: ~/.config/aiagent/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{AgentError, Result};

/// Main configuration for aiagent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// OpenRouter connection settings
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
    /// Sampling settings
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Agent persona and behavior
    #[serde(default)]
    pub agent: AgentConfig,
    /// Streaming configuration
    #[serde(default)]
    pub streaming: StreamingConfig,
    /// Trace export to Langfuse
    #[serde(default)]
    pub langfuse: LangfuseConfig,
}

/// OpenRouter server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenRouterConfig {
    /// API key, only ever taken from the environment
    #[serde(skip, default = "api_key_from_env")]
    pub api_key: Option<String>,
    /// API base URL (default: https://openrouter.ai/api/v1)
    pub base_url: String,
    /// Model identifier
    /// Default: z-ai/glm-4.5-air:free
    pub model: String,
    /// Sent as `HTTP-Referer` for OpenRouter attribution
    pub site_url: Option<String>,
    /// Sent as `X-Title` for OpenRouter attribution
    pub site_name: Option<String>,
    /// Limit on establishing the connection, in seconds
    pub connect_timeout_secs: u64,
    /// Longest silence allowed between reads of a response body, in seconds.
    /// Unset means a reply may take as long as the model needs.
    pub read_timeout_secs: Option<u64>,
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Role given to every task agent
    pub role: String,
    /// Goal given to every task agent
    pub goal: String,
    /// Backstory given to every task agent
    pub backstory: String,
    /// Expected output attached to every task
    pub expected_output: String,
    /// System prompt for the chatbot, sent ahead of the history
    pub system_prompt: Option<String>,
    /// Whether to log at debug level
    pub debug: bool,
}

/// Streaming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Whether to stream chatbot replies in real-time
    pub enabled: bool,
}

/// Langfuse tracing configuration
///
/// Traces are exported only when both keys are present. The keys come from
/// the environment and are never written to the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LangfuseConfig {
    #[serde(skip, default = "public_key_from_env")]
    pub public_key: Option<String>,
    #[serde(skip, default = "secret_key_from_env")]
    pub secret_key: Option<String>,
    /// Langfuse host (default: http://localhost:3000)
    pub base_url: String,
}

impl LangfuseConfig {
    /// Public and secret key, when export is configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.public_key.as_deref()?, self.secret_key.as_deref()?))
    }

    /// Langfuse's OTLP/HTTP trace ingestion URL
    pub fn traces_endpoint(&self) -> String {
        format!(
            "{}/api/public/otel/v1/traces",
            self.base_url.trim_end_matches('/')
        )
    }
}

fn secret_from_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn api_key_from_env() -> Option<String> {
    secret_from_env("OPENROUTER_API_KEY")
}

fn public_key_from_env() -> Option<String> {
    secret_from_env("LANGFUSE_PUBLIC_KEY")
}

fn secret_key_from_env() -> Option<String> {
    secret_from_env("LANGFUSE_SECRET_KEY")
}

fn flag_from_env(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: api_key_from_env(),
            base_url: env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            model: env::var("OPENROUTER_MODEL")
                .unwrap_or_else(|_| "z-ai/glm-4.5-air:free".to_string()),
            site_url: env::var("YOUR_SITE_URL").ok().filter(|v| !v.is_empty()),
            site_name: env::var("YOUR_SITE_NAME").ok().filter(|v| !v.is_empty()),
            connect_timeout_secs: 30,
            read_timeout_secs: None,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: env::var("AIAGENT_TEMPERATURE")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(0.2),
            max_tokens: None,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            role: "AI Assistant".to_string(),
            goal: "Complete the user's task effectively".to_string(),
            backstory: "You are a helpful AI assistant capable of performing various tasks."
                .to_string(),
            expected_output: "A clear and helpful response to the task.".to_string(),
            system_prompt: None,
            debug: flag_from_env("AIAGENT_DEBUG", false),
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: flag_from_env("AIAGENT_STREAMING", true),
        }
    }
}

impl Default for LangfuseConfig {
    fn default() -> Self {
        Self {
            public_key: public_key_from_env(),
            secret_key: secret_key_from_env(),
            base_url: env::var("LANGFUSE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aiagent")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: config file > env vars > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(AgentError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| AgentError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text, filling gaps from defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| AgentError::config(format!("Failed to parse config: {}", e)))
    }

    /// The API key, or a config error naming the variable to set
    pub fn require_api_key(&self) -> Result<&str> {
        self.openrouter
            .api_key
            .as_deref()
            .ok_or_else(|| AgentError::config("OPENROUTER_API_KEY is not set"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_agent_persona() {
        let agent = AgentConfig::default();
        assert_eq!(agent.role, "AI Assistant");
        assert_eq!(agent.goal, "Complete the user's task effectively");
        assert_eq!(
            agent.expected_output,
            "A clear and helpful response to the task."
        );
        assert!(agent.system_prompt.is_none());
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config = Config::from_toml(
            r#"
            [openrouter]
            model = "openai/gpt-4o-mini"
            read_timeout_secs = 90

            [agent]
            role = "Researcher"
            "#,
        )
        .unwrap();

        assert_eq!(config.openrouter.model, "openai/gpt-4o-mini");
        assert_eq!(config.openrouter.read_timeout_secs, Some(90));
        assert_eq!(config.openrouter.connect_timeout_secs, 30);
        assert_eq!(config.agent.role, "Researcher");
        assert_eq!(config.agent.goal, "Complete the user's task effectively");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml("[openrouter\nmodel = ").unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let mut config = Config::default();
        config.openrouter.api_key = Some("sk-or-secret".to_string());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("base_url"));
        assert!(!toml_str.contains("sk-or-secret"));
    }

    #[test]
    fn test_require_api_key() {
        let mut config = Config::default();
        config.openrouter.api_key = None;
        assert!(matches!(
            config.require_api_key(),
            Err(AgentError::Config(_))
        ));

        config.openrouter.api_key = Some("sk-or-test".to_string());
        assert_eq!(config.require_api_key().unwrap(), "sk-or-test");
    }

    #[test]
    fn test_reads_are_unbounded_by_default() {
        assert_eq!(OpenRouterConfig::default().read_timeout_secs, None);
    }

    #[test]
    fn test_langfuse_needs_both_keys() {
        let mut langfuse = LangfuseConfig {
            public_key: Some("pk-lf-1".to_string()),
            secret_key: None,
            base_url: "https://cloud.langfuse.com/".to_string(),
        };
        assert!(langfuse.credentials().is_none());

        langfuse.secret_key = Some("sk-lf-1".to_string());
        assert_eq!(langfuse.credentials(), Some(("pk-lf-1", "sk-lf-1")));
        assert_eq!(
            langfuse.traces_endpoint(),
            "https://cloud.langfuse.com/api/public/otel/v1/traces"
        );
    }

    #[test]
    fn test_langfuse_keys_are_never_serialized() {
        let mut config = Config::default();
        config.langfuse.public_key = Some("pk-lf-secret".to_string());
        config.langfuse.secret_key = Some("sk-lf-secret".to_string());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[langfuse]"));
        assert!(!toml_str.contains("lf-secret"));
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("aiagent"));
    }
}
