//! aiagent - Interactive LLM Chatbot and Task Agent
//!
//! Two command-line loops over a hosted, OpenAI-compatible LLM provider
//! (OpenRouter): a multi-turn chatbot with streamed replies, and a one-shot
//! task agent that runs each request through a freshly built agent/task/crew.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Provider abstraction with OpenRouter and scripted implementations
//! - **Agent**: Conversation loop, crew execution and the task runner
//! - **CLI**: The shared REPL and logging setup
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aiagent::{Config, ConversationLoop, OpenRouterClient, Repl};
//!
//! #[tokio::main]
//! async fn main() -> aiagent::Result<()> {
//!     let config = Config::load();
//!     let llm = Arc::new(OpenRouterClient::from_config(&config)?);
//!
//!     let mut repl = Repl::new(ConversationLoop::new(llm, &config));
//!     repl.run().await
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;

// Re-export commonly used items
pub use agent::{ConversationLoop, SingleShotTaskRunner, TurnHandler};
pub use cli::Repl;
pub use core::{AgentError, Config, Result};
pub use llm::OpenRouterClient;
