//! Scripted provider for tests and offline runs
//!
//! Each call to `chat` or `chat_stream` consumes the next scripted turn and
//! records the messages it was given.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::{AgentError, Message, Result};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, StreamChunk, StreamResponse};

/// One scripted provider call
#[derive(Debug, Clone)]
pub enum MockTurn {
    /// A complete reply with no fragments before it
    Reply(String),
    /// Exactly these stream items
    Chunks(Vec<StreamChunk>),
    /// The call itself fails
    Fail(String),
    /// The stream yields these items and then fails
    BrokenStream(Vec<StreamChunk>, String),
}

/// Provider double that replays a script
#[derive(Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<MockTurn>>,
    calls: Mutex<Vec<Vec<Message>>>,
    polled: Arc<AtomicUsize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProvider {
    /// Create a provider with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider from a list of turns
    pub fn with_script(turns: impl IntoIterator<Item = MockTurn>) -> Self {
        Self {
            script: Mutex::new(turns.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Queue a complete reply
    pub fn reply(self, content: impl Into<String>) -> Self {
        self.push(MockTurn::Reply(content.into()))
    }

    /// Queue a reply streamed as the given fragments, then the full message
    pub fn streamed(self, fragments: &[&str]) -> Self {
        let mut chunks: Vec<StreamChunk> =
            fragments.iter().map(|f| StreamChunk::delta(*f)).collect();
        chunks.push(StreamChunk::complete(fragments.concat()));
        self.push(MockTurn::Chunks(chunks))
    }

    /// Queue exact stream items
    pub fn chunks(self, chunks: Vec<StreamChunk>) -> Self {
        self.push(MockTurn::Chunks(chunks))
    }

    /// Queue a call that produces nothing
    pub fn empty(self) -> Self {
        self.push(MockTurn::Chunks(Vec::new()))
    }

    /// Queue a failing call
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(MockTurn::Fail(message.into()))
    }

    fn push(self, turn: MockTurn) -> Self {
        lock(&self.script).push_back(turn);
        self
    }

    /// Messages sent on every call so far, oldest first
    pub fn calls(&self) -> Vec<Vec<Message>> {
        lock(&self.calls).clone()
    }

    /// Number of calls made
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of stream items handed out across all streams
    pub fn items_polled(&self) -> usize {
        self.polled.load(Ordering::SeqCst)
    }

    fn next_turn(&self, messages: &[Message]) -> Result<MockTurn> {
        lock(&self.calls).push(messages.to_vec());
        lock(&self.script)
            .pop_front()
            .ok_or_else(|| AgentError::provider("mock script exhausted"))
    }

    fn counted(&self, items: Vec<Result<StreamChunk>>) -> StreamResponse {
        let polled = Arc::clone(&self.polled);
        Box::pin(stream::iter(items).inspect(move |_| {
            polled.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    async fn chat(
        &self,
        messages: &[Message],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let content = match self.next_turn(messages)? {
            MockTurn::Reply(content) => content,
            MockTurn::Chunks(chunks) => chunks
                .into_iter()
                .find_map(|chunk| match chunk {
                    StreamChunk::Message(message) => Some(message.content),
                    StreamChunk::Delta(_) => None,
                })
                .unwrap_or_default(),
            MockTurn::Fail(message) | MockTurn::BrokenStream(_, message) => {
                return Err(AgentError::provider(message))
            }
        };

        Ok(LLMResponse {
            content,
            usage: None,
            model: self.model().to_string(),
        })
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        _options: Option<GenerateOptions>,
    ) -> Result<StreamResponse> {
        let items = match self.next_turn(messages)? {
            MockTurn::Reply(content) => vec![Ok(StreamChunk::complete(content))],
            MockTurn::Chunks(chunks) => chunks.into_iter().map(Ok).collect(),
            MockTurn::Fail(message) => return Err(AgentError::provider(message)),
            MockTurn::BrokenStream(chunks, message) => chunks
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(AgentError::provider(message))))
                .collect(),
        };

        Ok(self.counted(items))
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "mock"
    }
}
