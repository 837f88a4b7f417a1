//! LLM module - Language Model integrations
//!
//! Provides the provider abstraction, the OpenRouter backend and a scripted
//! provider for tests.

pub mod mock;
pub mod openrouter;
pub mod traits;

pub use mock::{MockProvider, MockTurn};
pub use openrouter::OpenRouterClient;
pub use traits::{
    GenerateOptions, LLMProvider, LLMResponse, StreamChunk, StreamResponse, TokenUsage,
};
