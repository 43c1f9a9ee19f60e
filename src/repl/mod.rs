//! Interactive console front end
//!
//! This module provides:
//! - Line editing with reedline, history and grammar-driven completion
//! - The console session: parse a line, submit it to the dispatcher, format
//!   the result
//! - The interactive loop and the batch mode used by `--execute`

mod completer;
mod engine;
mod hinter;
mod prompt;

pub use completer::{Candidate, ConsoleCompleter};
pub use engine::ReplEngine;
pub use hinter::ConsoleHinter;
pub use prompt::ConsolePrompt;

use std::sync::Arc;
use tracing::{debug, warn};

use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::formatter::Formatter;
use crate::parser::{Command, CommandParser};

/// What a line produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Blank line, nothing ran
    Empty,
    /// Formatted result of a command
    Output(String),
    /// The quit command ran; the session is over
    Quit(String),
}

/// One console session: parser, dispatcher and formatter
pub struct Session {
    parser: CommandParser,
    dispatcher: Arc<Dispatcher>,
    formatter: Formatter,
}

impl Session {
    /// Create a session over a started dispatcher
    pub fn new(parser: CommandParser, dispatcher: Arc<Dispatcher>, formatter: Formatter) -> Self {
        Self {
            parser,
            dispatcher,
            formatter,
        }
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Parse, execute and format one line
    ///
    /// Parse errors never reach the dispatcher. Execution errors belong to
    /// this line only; the dispatcher keeps running.
    ///
    /// # Arguments
    /// * `line` - The line as typed
    ///
    /// # Returns
    /// * `Result<LineOutcome>` - What to show, or the line's error
    pub async fn execute_line(&self, line: &str) -> Result<LineOutcome> {
        if line.trim().is_empty() {
            return Ok(LineOutcome::Empty);
        }

        let command = self.parser.parse(line)?;
        debug!("Parsed '{}' as {}", line.trim(), command.name());
        let quit = matches!(command, Command::Quit);

        let result = self.dispatcher.submit(command).await?;
        let output = self.formatter.format(&result)?;
        if quit {
            Ok(LineOutcome::Quit(output))
        } else {
            Ok(LineOutcome::Output(output))
        }
    }

    /// Run lines in order, stopping at quit or at the first error
    ///
    /// # Arguments
    /// * `lines` - Command lines from `--execute`
    ///
    /// # Returns
    /// * `Result<()>` - The first failing line's error
    pub async fn run_batch(&self, lines: &[String]) -> Result<()> {
        for line in lines {
            match self.execute_line(line).await? {
                LineOutcome::Empty => {}
                LineOutcome::Output(output) => print_output(&output),
                LineOutcome::Quit(output) => {
                    print_output(&output);
                    break;
                }
            }
        }
        Ok(())
    }

    /// Interactive loop until quit or end of input
    ///
    /// # Arguments
    /// * `engine` - Line editor
    ///
    /// # Returns
    /// * `Result<()>` - Error only when the terminal fails
    pub async fn run_interactive(&self, engine: &mut ReplEngine) -> Result<()> {
        while let Some(line) = engine.read_line()? {
            match self.execute_line(&line).await {
                Ok(LineOutcome::Empty) => {}
                Ok(LineOutcome::Output(output)) => print_output(&output),
                Ok(LineOutcome::Quit(output)) => {
                    print_output(&output);
                    break;
                }
                Err(e) => {
                    warn!("'{}' failed: {}", line.trim(), e);
                    eprintln!("{}", self.formatter.format_error(&e));
                }
            }
        }
        Ok(())
    }

    /// Stop the dispatcher and wait for the running command, if any
    pub async fn shutdown(&self) {
        self.dispatcher.stop().await;
    }
}

fn print_output(output: &str) {
    if !output.is_empty() {
        println!("{output}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::config::{DisplayConfig, OutputFormat};
    use crate::device::{ClassCode, Eoj, Epc, IpAndEoj, Property};
    use crate::error::{ConsoleError, ExecutionError, ParseError};
    use crate::executor::CommandRouter;
    use crate::grammar::Grammar;
    use tokio_util::sync::CancellationToken;

    async fn create_test_session(format: OutputFormat) -> Session {
        let device = IpAndEoj::new(
            "192.168.0.3".parse().unwrap(),
            Eoj::new(ClassCode::HOME_AIR_CONDITIONER, 1),
        );
        let backend = Arc::new(MemoryBackend::new().with_device(
            device,
            vec![
                Property::new(Epc(0x80), vec![0x30]),
                Property::new(Epc(0xB0), vec![0x42]),
            ],
        ));
        let grammar = Arc::new(Grammar::new());
        let parser = CommandParser::new(
            grammar.clone(),
            backend.clone(),
            backend.clone(),
            backend.clone(),
        );
        let router = Arc::new(CommandRouter::new(backend.clone(), backend, grammar));
        let dispatcher = Arc::new(Dispatcher::new(router, &CancellationToken::new()));
        dispatcher.start().await.unwrap();

        let display = DisplayConfig {
            format,
            show_timing: false,
            ..Default::default()
        };
        Session::new(parser, dispatcher, Formatter::from_config(&display, false))
    }

    #[tokio::test]
    async fn test_blank_line() {
        let session = create_test_session(OutputFormat::Table).await;
        assert_eq!(session.execute_line("   ").await.unwrap(), LineOutcome::Empty);
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_discover_then_list() {
        let session = create_test_session(OutputFormat::Compact).await;
        assert_eq!(
            session.execute_line("discover").await.unwrap(),
            LineOutcome::Output("1 device(s) found".to_string())
        );
        let LineOutcome::Output(output) = session.execute_line("devices 0130").await.unwrap()
        else {
            panic!("expected output");
        };
        assert!(output.starts_with("192.168.0.3 0130:1"));
        assert!(output.contains("B0=cooling"));
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_errors_do_not_end_session() {
        let session = create_test_session(OutputFormat::Table).await;
        let err = session.execute_line("discover now").await.unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Parse(ParseError::GrammarMismatch { position: 9, .. })
        ));

        let err = session.execute_line("get 0130 80").await.unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Execution(ExecutionError::DeviceNotFound(_))
        ));

        assert!(matches!(
            session.execute_line("discover").await.unwrap(),
            LineOutcome::Output(_)
        ));
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_quit_ends_session() {
        let session = create_test_session(OutputFormat::Table).await;
        assert_eq!(
            session.execute_line("quit").await.unwrap(),
            LineOutcome::Quit("Bye".to_string())
        );
        session.shutdown().await;
        let err = session.execute_line("discover").await.unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Execution(ExecutionError::DispatcherStopped)
        ));
    }

    #[tokio::test]
    async fn test_batch_stops_at_first_error() {
        let session = create_test_session(OutputFormat::Table).await;
        let lines = vec!["discover".to_string(), "set 0130 80:zz".to_string()];
        assert!(session.run_batch(&lines).await.is_err());
        session.shutdown().await;
    }
}
