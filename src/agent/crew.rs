//! Agents, tasks and crews
//!
//! A crew is a list of agent profiles and the tasks assigned to them. The
//! executor runs the tasks in order, feeding each task the previous output.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info_span, Instrument};

use crate::core::config::AgentConfig;
use crate::core::{AgentError, Config, Message, Result};
use crate::llm::{GenerateOptions, LLMProvider};

/// Who the agent is and what it is trying to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl AgentProfile {
    /// Create a profile
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
        }
    }

    /// Profile described by the agent configuration
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(&config.role, &config.goal, &config.backstory)
    }

    /// System prompt establishing the persona
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }
}

/// A unit of work bound to one agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub description: String,
    pub expected_output: String,
    pub agent: AgentProfile,
}

impl Task {
    /// Create a task for `agent`
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: AgentProfile,
    ) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent,
        }
    }

    /// The user prompt for this task, with the previous task's output if any
    pub fn prompt(&self, context: Option<&str>) -> String {
        let mut prompt = format!(
            "Current task: {}\n\nYour final answer must be: {}\n\
             Respond with the complete answer itself, not a description of it.",
            self.description, self.expected_output
        );

        if let Some(context) = context {
            prompt.push_str("\n\nContext from the previous task:\n");
            prompt.push_str(context);
        }

        prompt
    }
}

/// Agents plus the ordered tasks they carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crew {
    agents: Vec<AgentProfile>,
    tasks: Vec<Task>,
}

impl Crew {
    /// Create a crew
    pub fn new(agents: Vec<AgentProfile>, tasks: Vec<Task>) -> Self {
        Self { agents, tasks }
    }

    pub fn agents(&self) -> &[AgentProfile] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }
}

/// Something that can run a crew to completion
#[async_trait]
pub trait CrewExecutor: Send + Sync {
    /// Run every task and return the final task's output
    async fn kickoff(&self, crew: &Crew) -> Result<String>;
}

/// Runs crews by prompting an LLM once per task
pub struct LlmCrewExecutor {
    llm: Arc<dyn LLMProvider>,
    options: GenerateOptions,
}

impl LlmCrewExecutor {
    /// Create an executor over the given provider
    pub fn new(llm: Arc<dyn LLMProvider>, config: &Config) -> Self {
        Self {
            llm,
            options: GenerateOptions::from_config(&config.generation),
        }
    }
}

#[async_trait]
impl CrewExecutor for LlmCrewExecutor {
    async fn kickoff(&self, crew: &Crew) -> Result<String> {
        if let Some(task) = crew
            .tasks()
            .iter()
            .find(|task| !crew.agents().contains(&task.agent))
        {
            return Err(AgentError::execution(format!(
                "Task '{}' is assigned to {}, who is not part of the crew",
                task.description, task.agent.role
            )));
        }

        let mut output: Option<String> = None;

        for (i, task) in crew.tasks().iter().enumerate() {
            debug!(task = i + 1, role = %task.agent.role, "running task");

            let messages = vec![
                Message::system(task.agent.system_prompt()),
                Message::user(task.prompt(output.as_deref())),
            ];

            let span = info_span!("crew_task", task = i + 1, role = %task.agent.role);
            let response = self
                .llm
                .chat(&messages, Some(self.options.clone()))
                .instrument(span)
                .await
                .map_err(|e| {
                    AgentError::execution(format!("{} failed: {}", task.agent.role, e))
                })?;

            let answer = response.content.trim();
            if answer.is_empty() {
                return Err(AgentError::execution(format!(
                    "{} returned an empty result",
                    task.agent.role
                )));
            }
            output = Some(answer.to_string());
        }

        output.ok_or_else(|| AgentError::execution("Crew has no tasks"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;
    use crate::llm::MockProvider;

    fn assistant() -> AgentProfile {
        AgentProfile::from_config(&AgentConfig::default())
    }

    fn executor(provider: &Arc<MockProvider>) -> LlmCrewExecutor {
        LlmCrewExecutor::new(
            Arc::clone(provider) as Arc<dyn LLMProvider>,
            &Config::default(),
        )
    }

    #[test]
    fn test_persona_prompt() {
        let prompt = assistant().system_prompt();
        assert!(prompt.starts_with("You are AI Assistant."));
        assert!(prompt.contains("Complete the user's task effectively"));
    }

    #[test]
    fn test_task_prompt_context() {
        let task = Task::new("summarize X", "A short summary", assistant());
        let plain = task.prompt(None);
        assert!(plain.contains("summarize X"));
        assert!(plain.contains("A short summary"));
        assert!(!plain.contains("Context"));

        let with_context = task.prompt(Some("X is a thing"));
        assert!(with_context.ends_with("X is a thing"));
    }

    #[tokio::test]
    async fn test_single_task_crew() {
        let provider = Arc::new(MockProvider::new().reply("  Summary: X is a thing.\n"));
        let agent = assistant();
        let crew = Crew::new(
            vec![agent.clone()],
            vec![Task::new("summarize X", "A summary", agent)],
        );

        let result = executor(&provider).kickoff(&crew).await.unwrap();

        assert_eq!(result, "Summary: X is a thing.");
        let sent = &provider.calls()[0];
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, Role::System);
        assert!(sent[1].content.contains("summarize X"));
    }

    #[tokio::test]
    async fn test_tasks_chain_outputs() {
        let provider = Arc::new(MockProvider::new().reply("draft").reply("final"));
        let writer = assistant();
        let editor = AgentProfile::new("Editor", "Polish drafts", "You edit text.");
        let crew = Crew::new(
            vec![writer.clone(), editor.clone()],
            vec![
                Task::new("write", "A draft", writer),
                Task::new("edit", "A polished text", editor),
            ],
        );

        let result = executor(&provider).kickoff(&crew).await.unwrap();

        assert_eq!(result, "final");
        let calls = provider.calls();
        assert!(calls[1][0].content.starts_with("You are Editor."));
        assert!(calls[1][1].content.ends_with("draft"));
    }

    #[tokio::test]
    async fn test_failures_become_execution_errors() {
        let provider = Arc::new(MockProvider::new().fail("rate limited").reply("   "));
        let agent = assistant();
        let crew = Crew::new(
            vec![agent.clone()],
            vec![Task::new("anything", "anything", agent)],
        );
        let executor = executor(&provider);

        let err = executor.kickoff(&crew).await.unwrap_err();
        assert!(matches!(err, AgentError::Execution(ref m) if m.contains("rate limited")));

        let err = executor.kickoff(&crew).await.unwrap_err();
        assert!(matches!(err, AgentError::Execution(ref m) if m.contains("empty result")));

        let empty = Crew::new(Vec::new(), Vec::new());
        assert!(matches!(
            executor.kickoff(&empty).await,
            Err(AgentError::Execution(_))
        ));
    }

    #[tokio::test]
    async fn test_task_agent_must_belong_to_crew() {
        let provider = Arc::new(MockProvider::new().reply("never sent"));
        let outsider = AgentProfile::new("Editor", "Polish drafts", "You edit text.");
        let crew = Crew::new(
            vec![assistant()],
            vec![Task::new("edit", "A polished text", outsider)],
        );

        let err = executor(&provider).kickoff(&crew).await.unwrap_err();

        assert!(matches!(err, AgentError::Execution(ref m) if m.contains("Editor")));
        assert_eq!(provider.call_count(), 0);
    }
}
