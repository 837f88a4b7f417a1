//! Streaming multi-turn chatbot
//!
//! Each turn appends the user message, asks the provider for a reply over the
//! whole history, echoes fragments as they arrive and appends the first
//! complete assistant message.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::agent::conversation::Conversation;
use crate::agent::TurnHandler;
use crate::core::{preview, Config, Result, UserInput};
use crate::llm::{GenerateOptions, LLMProvider, StreamChunk, StreamResponse};

/// Shown when a call succeeds but yields no assistant message
pub const NO_RESPONSE_MESSAGE: &str = "AI: Sorry, I couldn't generate a response.";

/// What a submitted line led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing happened
    Ignored,
    /// An exit keyword; nothing happened
    Exit,
    /// The assistant replied with this text
    Replied(String),
    /// The provider produced no message
    NoResponse,
}

/// Chatbot owning the conversation for one session
pub struct ConversationLoop {
    llm: Arc<dyn LLMProvider>,
    conversation: Conversation,
    options: GenerateOptions,
    streaming: bool,
}

impl ConversationLoop {
    /// Create a chatbot over the given provider
    pub fn new(llm: Arc<dyn LLMProvider>, config: &Config) -> Self {
        let mut conversation = Conversation::new();
        if let Some(ref prompt) = config.agent.system_prompt {
            conversation.set_system_prompt(prompt.clone());
        }

        Self {
            llm,
            conversation,
            options: GenerateOptions::from_config(&config.generation),
            streaming: config.streaming.enabled,
        }
    }

    /// The session's history
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Check if streaming is enabled
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Enable or disable streaming
    pub fn set_streaming(&mut self, enabled: bool) {
        self.streaming = enabled;
    }

    /// Run one turn, writing everything the user should see to `out`.
    ///
    /// Provider errors are returned after the user message has been recorded;
    /// no assistant message is added for a failed turn.
    pub async fn submit(
        &mut self,
        input: &str,
        out: &mut (dyn Write + Send),
    ) -> Result<TurnOutcome> {
        let text = match UserInput::parse(input) {
            UserInput::Empty => return Ok(TurnOutcome::Ignored),
            UserInput::Exit => return Ok(TurnOutcome::Exit),
            UserInput::Text(text) => text,
        };

        self.conversation.add_user(text);
        info!(input = %preview(text, 50), "Processing user message");

        let mut stream = self.open_stream().await?;
        let mut fragments_shown = false;
        let mut reply = None;

        while let Some(item) = stream.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    if fragments_shown {
                        writeln!(out)?;
                    }
                    return Err(e);
                }
            };

            match chunk {
                StreamChunk::Delta(fragment) => {
                    if !fragments_shown {
                        write!(out, "AI: ")?;
                        fragments_shown = true;
                    }
                    write!(out, "{}", fragment)?;
                    out.flush()?;
                }
                StreamChunk::Message(message) => {
                    // First complete message wins; the rest of the stream is dropped
                    reply = Some(message);
                    break;
                }
            }
        }
        drop(stream);

        if fragments_shown {
            writeln!(out)?;
        }

        match reply {
            Some(message) => {
                if !fragments_shown {
                    writeln!(out, "AI: {}", message.content)?;
                }
                self.conversation.add_assistant(message.content.clone());
                info!(
                    history = self.conversation.len(),
                    "AI response generated successfully"
                );
                Ok(TurnOutcome::Replied(message.content))
            }
            None => {
                warn!("No response received from AI");
                writeln!(out, "{}", NO_RESPONSE_MESSAGE)?;
                Ok(TurnOutcome::NoResponse)
            }
        }
    }

    /// Ask the provider for a reply to the current history
    async fn open_stream(&self) -> Result<StreamResponse> {
        let messages = self.conversation.request_messages();
        debug!(
            provider = self.llm.name(),
            model = self.llm.model(),
            messages = messages.len(),
            streaming = self.streaming,
            "calling model"
        );

        if self.streaming {
            return self
                .llm
                .chat_stream(&messages, Some(self.options.clone()))
                .await;
        }

        let response = self
            .llm
            .chat(&messages, Some(self.options.clone()))
            .await?;
        let chunks = if response.content.is_empty() {
            Vec::new()
        } else {
            vec![Ok(StreamChunk::complete(response.content))]
        };
        Ok(Box::pin(stream::iter(chunks)))
    }
}

#[async_trait]
impl TurnHandler for ConversationLoop {
    fn greeting(&self) -> &str {
        "Chat with the AI agent! Type 'exit' or 'quit' to end."
    }

    fn prompt(&self) -> &str {
        "You: "
    }

    async fn handle_turn(&mut self, input: &str, out: &mut (dyn Write + Send)) -> Result<()> {
        self.submit(input, out).await.map(|_| ())
    }
}
