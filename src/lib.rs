//! ECHONET Lite command console library
//!
//! The console turns typed lines into device commands through a declarative
//! command grammar that drives both parsing and tab completion, and executes
//! the commands one at a time on a single dispatcher worker.
//!
//! # Modules
//!
//! - `backend`: Lookup and device handler traits, in-memory backend
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `device`: Device addresses, properties and specifiers
//! - `dispatcher`: Single-worker command execution
//! - `error`: Error types and handling
//! - `executor`: Command routing and results
//! - `formatter`: Output formatting and display
//! - `grammar`: Tokenizer, grammar combinators and completion candidates
//! - `parser`: Lines to resolved commands
//! - `repl`: Interactive console
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use echonet_console::backend::MemoryBackend;
//! use echonet_console::dispatcher::Dispatcher;
//! use echonet_console::executor::CommandRouter;
//! use echonet_console::grammar::Grammar;
//! use echonet_console::parser::CommandParser;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = Arc::new(MemoryBackend::new());
//!     let grammar = Arc::new(Grammar::new());
//!     let parser = CommandParser::new(grammar.clone(), backend.clone(), backend.clone(), backend.clone());
//!     let router = Arc::new(CommandRouter::new(backend.clone(), backend, grammar));
//!
//!     let dispatcher = Dispatcher::new(router, &CancellationToken::new());
//!     dispatcher.start().await?;
//!     let result = dispatcher.submit(parser.parse("discover")?).await?;
//!     println!("{:?}", result.data);
//!     dispatcher.stop().await;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod grammar;
pub mod parser;
pub mod repl;

// Re-export commonly used types
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::{ConsoleError, Result};
pub use executor::{CommandRouter, ExecutionResult};
pub use formatter::Formatter;
pub use grammar::Grammar;
pub use parser::{Command, CommandParser};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}
