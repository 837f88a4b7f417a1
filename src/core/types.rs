//! Shared types used across aiagent modules
//!
//! Contains the chat message structure and the interpretation of raw input lines.

use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model, never part of conversation history
    System,
    /// The person at the prompt
    User,
    /// The model
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Words that end an interactive session, matched case-insensitively
pub const EXIT_KEYWORDS: [&str; 2] = ["exit", "quit"];

/// What a single line typed at the prompt amounts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput<'a> {
    /// Blank or whitespace-only line
    Empty,
    /// One of the exit keywords
    Exit,
    /// Anything else, trimmed
    Text(&'a str),
}

impl<'a> UserInput<'a> {
    /// Classify a raw input line
    pub fn parse(raw: &'a str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            UserInput::Empty
        } else if EXIT_KEYWORDS
            .iter()
            .any(|keyword| trimmed.eq_ignore_ascii_case(keyword))
        {
            UserInput::Exit
        } else {
            UserInput::Text(trimmed)
        }
    }
}

/// First `max_chars` characters of `text`, for log lines
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
