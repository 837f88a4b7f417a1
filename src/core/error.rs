//! Error types for aiagent
//!
//! One error enum shared by the provider client, the execution unit and the
//! interactive shell.

use thiserror::Error;

/// Main error type for aiagent operations
#[derive(Error, Debug)]
pub enum AgentError {
    /// Provider-side failure (bad status, error payload, malformed reply)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Rejected credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The agent/task/crew execution unit failed
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for aiagent operations
pub type Result<T> = std::result::Result<T, AgentError>;

impl AgentError {
    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create an execution error
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error came out of a model or execution-unit call.
    ///
    /// These are contained to the turn that raised them; everything else
    /// (terminal I/O, configuration) is allowed to end the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Provider(_) | Self::Auth(_) | Self::Execution(_) | Self::Json(_) | Self::Http(_)
        )
    }
}
