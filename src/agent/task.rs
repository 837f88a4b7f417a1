//! One-shot task agent
//!
//! Every description gets its own agent, task and crew; nothing carries over
//! between calls.

use async_trait::async_trait;
use std::io::Write;
use tracing::info;

use crate::agent::crew::{AgentProfile, Crew, CrewExecutor, Task};
use crate::agent::TurnHandler;
use crate::core::config::AgentConfig;
use crate::core::{preview, AgentError, Result};

/// Runs each task description through a freshly built crew
pub struct SingleShotTaskRunner<E: CrewExecutor> {
    executor: E,
    agent: AgentConfig,
}

impl<E: CrewExecutor> SingleShotTaskRunner<E> {
    /// Create a runner; `agent` supplies the persona and expected output
    pub fn new(executor: E, agent: &AgentConfig) -> Self {
        Self {
            executor,
            agent: agent.clone(),
        }
    }

    /// A new crew holding one agent and one task for `description`
    pub fn build_crew(&self, description: &str) -> Crew {
        let agent = AgentProfile::from_config(&self.agent);
        let task = Task::new(description, &self.agent.expected_output, agent.clone());
        Crew::new(vec![agent], vec![task])
    }

    /// Execute one task description and return the crew's result
    pub async fn run(&self, description: &str) -> Result<String> {
        let crew = self.build_crew(description);
        self.executor.kickoff(&crew).await.map_err(|e| match e {
            AgentError::Execution(_) => e,
            other => AgentError::execution(other.to_string()),
        })
    }
}

#[async_trait]
impl<E: CrewExecutor> TurnHandler for SingleShotTaskRunner<E> {
    fn greeting(&self) -> &str {
        "AI Agent Assistant! Describe a task for the agent to perform. Type 'exit' or 'quit' to end."
    }

    fn prompt(&self) -> &str {
        "Task: "
    }

    async fn handle_turn(&mut self, input: &str, out: &mut (dyn Write + Send)) -> Result<()> {
        info!(task = %preview(input, 50), "Processing task");
        let result = self.run(input).await?;
        writeln!(out, "Agent Result: {}", result)?;
        info!("Task completed successfully");
        Ok(())
    }
}
