//! LLM Provider trait for abstracting different backends
//!
//! The conversation loop and the crew executor only ever see this trait, so a
//! scripted provider can stand in for OpenRouter in tests.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::core::{Message, Result};

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct LLMResponse {
    /// Text content of the response
    pub content: String,
    /// Token usage information
    pub usage: Option<TokenUsage>,
    /// Model that generated the response
    pub model: String,
}

/// Token usage information
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Options for LLM generation
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl GenerateOptions {
    /// Options taken from the configured generation settings
    pub fn from_config(config: &crate::core::config::GenerationConfig) -> Self {
        Self {
            temperature: Some(config.temperature),
            max_tokens: config.max_tokens,
        }
    }
}

/// An item from a streaming response
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// A partial fragment of the reply, for display only
    Delta(String),
    /// The complete assistant message
    Message(Message),
}

impl StreamChunk {
    /// Create a new content fragment
    pub fn delta(text: impl Into<String>) -> Self {
        Self::Delta(text.into())
    }

    /// Create a complete assistant message
    pub fn complete(content: impl Into<String>) -> Self {
        Self::Message(Message::assistant(content))
    }
}

/// Type alias for a boxed stream of chunks
pub type StreamResponse = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// Trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a complete response from messages
    async fn chat(
        &self,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse>;

    /// Start a streaming response.
    ///
    /// Errors that happen before the first byte arrives are returned directly;
    /// later ones come out of the stream. The stream is lazy, finite and
    /// cannot be restarted.
    async fn chat_stream(
        &self,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<StreamResponse>;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;

    /// Get the provider name
    fn name(&self) -> &str;
}
