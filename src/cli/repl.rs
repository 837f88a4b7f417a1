//! Interactive REPL for aiagent
//!
//! Provides the main user interaction loop shared by the chatbot and the task
//! agent: prompt, read a line, stop on an exit keyword, EOF or Ctrl-C, and
//! otherwise hand the line to the turn handler. Failures from the model are
//! reported and the loop carries on.

use std::future::Future;
use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, info_span, warn, Instrument};

use crate::agent::TurnHandler;
use crate::core::{Result, UserInput};

/// What ended a wait for input
enum InputEvent {
    Line(String),
    Eof,
    Interrupted,
}

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl<H: TurnHandler> {
    handler: H,
}

impl<H: TurnHandler> Repl<H> {
    /// Create a REPL around a turn handler
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    /// The wrapped handler
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Run against the terminal until exit, EOF or Ctrl-C
    pub async fn run(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = io::stdout();

        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Unable to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };

        self.run_with(stdin, &mut stdout, interrupt).await
    }

    /// Run with explicit input, output and interrupt signal
    pub async fn run_with<R, I>(
        &mut self,
        input: R,
        out: &mut (dyn Write + Send),
        interrupt: I,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        I: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        let mut lines = input.lines();
        let mut turns = 0usize;

        info!("Starting session");
        writeln!(out, "{}", self.handler.greeting())?;

        loop {
            write!(out, "{}", self.handler.prompt())?;
            out.flush()?;

            let event = tokio::select! {
                biased;
                _ = &mut interrupt => InputEvent::Interrupted,
                line = lines.next_line() => match line? {
                    Some(line) => InputEvent::Line(line),
                    None => InputEvent::Eof,
                },
            };

            let line = match event {
                InputEvent::Line(line) => line,
                InputEvent::Eof => {
                    info!("Input closed");
                    writeln!(out, "\nGoodbye!")?;
                    break;
                }
                InputEvent::Interrupted => {
                    info!("Session interrupted by user");
                    writeln!(out, "\nGoodbye!")?;
                    break;
                }
            };

            let text = match UserInput::parse(&line) {
                UserInput::Empty => continue,
                UserInput::Exit => {
                    info!("User ended the session");
                    writeln!(out, "Goodbye!")?;
                    break;
                }
                UserInput::Text(text) => text,
            };

            turns += 1;
            let span = info_span!("turn", n = turns);

            let result = tokio::select! {
                biased;
                _ = &mut interrupt => None,
                result = self.handler.handle_turn(text, out).instrument(span) => Some(result),
            };

            match result {
                Some(Ok(())) => {}
                Some(Err(e)) if e.is_recoverable() => {
                    error!(error = %e, "Error during turn");
                    writeln!(out, "An error occurred: {}", e)?;
                    writeln!(out, "Please try again.")?;
                }
                Some(Err(e)) => return Err(e),
                None => {
                    info!("Session interrupted by user");
                    writeln!(out, "\nGoodbye!")?;
                    break;
                }
            }
        }

        info!(turns, "Session ended");
        Ok(())
    }
}
