//! Agent module - the chatbot, the task agent and their execution unit
//!
//! Both interactive components implement [`TurnHandler`] so the same shell
//! can drive either one.

pub mod chatbot;
pub mod conversation;
pub mod crew;
pub mod task;

use async_trait::async_trait;
use std::io::Write;

use crate::core::Result;

pub use chatbot::{ConversationLoop, TurnOutcome, NO_RESPONSE_MESSAGE};
pub use conversation::Conversation;
pub use crew::{AgentProfile, Crew, CrewExecutor, LlmCrewExecutor, Task};
pub use task::SingleShotTaskRunner;

/// A component the interactive shell hands each input line to
#[async_trait]
pub trait TurnHandler: Send {
    /// Printed once when the session starts
    fn greeting(&self) -> &str;

    /// Printed before reading each line
    fn prompt(&self) -> &str;

    /// Handle one non-blank, non-exit line, writing user-facing output to `out`
    async fn handle_turn(&mut self, input: &str, out: &mut (dyn Write + Send)) -> Result<()>;
}
