//! Conversation history management
//!
//! Append-only chat history. Messages are never removed or reordered once
//! added; the system prompt lives beside the history, not inside it.

use crate::core::Message;

/// Manages conversation history
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    /// Message history, oldest first
    messages: Vec<Message>,
    /// System prompt (always first in requests)
    system_prompt: Option<String>,
}

impl Conversation {
    /// Create a new, empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the system prompt
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
    }

    /// Add a user message
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Add an assistant message
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Messages to send to the provider: system prompt, then the full history
    pub fn request_messages(&self) -> Vec<Message> {
        let mut result = Vec::with_capacity(self.messages.len() + 1);

        if let Some(ref prompt) = self.system_prompt {
            result.push(Message::system(prompt.clone()));
        }

        result.extend(self.messages.iter().cloned());
        result
    }

    /// The history, without the system prompt
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
