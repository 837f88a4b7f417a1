//! aiagent - Interactive LLM Chatbot and Task Agent
//!
//! Main entry point for the CLI application.

use std::sync::Arc;

use aiagent::agent::LlmCrewExecutor;
use aiagent::cli::init_logging;
use aiagent::llm::LLMProvider;
use aiagent::{Config, ConversationLoop, OpenRouterClient, Repl, SingleShotTaskRunner};
use clap::{Parser, Subcommand};

/// aiagent - chat with an LLM or hand it one-off tasks
#[derive(Parser, Debug)]
#[command(name = "aiagent")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Mode {
    /// Multi-turn conversation with streamed replies (default)
    #[default]
    Chat,
    /// Describe a task, get the agent's result
    Task,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load();
    let _telemetry = init_logging(config.agent.debug, &config.langfuse)?;

    let llm: Arc<dyn LLMProvider> = Arc::new(OpenRouterClient::from_config(&config)?);

    match args.mode.unwrap_or_default() {
        Mode::Chat => {
            let mut repl = Repl::new(ConversationLoop::new(llm, &config));
            repl.run().await?;
        }
        Mode::Task => {
            let executor = LlmCrewExecutor::new(llm, &config);
            let mut repl = Repl::new(SingleShotTaskRunner::new(executor, &config.agent));
            repl.run().await?;
        }
    }

    Ok(())
}
