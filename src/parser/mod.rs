//! Command line parser for the console
//!
//! Parsing runs in two steps:
//! - the [`Grammar`] matches the tokenized line (grammar mismatches)
//! - the match is built into a [`Command`], validating values and resolving
//!   aliases, groups and property aliases (semantic and lookup failures)
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use echonet_console::backend::{MemoryBackend, PropertyTable};
//! use echonet_console::grammar::Grammar;
//! use echonet_console::parser::CommandParser;
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let parser = CommandParser::new(
//!     Arc::new(Grammar::new()),
//!     backend.clone(),
//!     backend.clone(),
//!     Arc::new(PropertyTable::new()),
//! );
//! let command = parser.parse("devices 0130 -all").unwrap();
//! ```

mod builder;
mod command;

pub use command::*;

use std::sync::Arc;
use tracing::debug;

use crate::backend::{AliasManager, GroupManager, PropertyDescriptionProvider};
use crate::error::Result;
use crate::grammar::{Grammar, tokenize};
use builder::Resolver;

/// Parser from command lines to resolved commands
#[derive(Clone)]
pub struct CommandParser {
    grammar: Arc<Grammar>,
    aliases: Arc<dyn AliasManager>,
    groups: Arc<dyn GroupManager>,
    properties: Arc<dyn PropertyDescriptionProvider>,
}

impl CommandParser {
    pub fn new(
        grammar: Arc<Grammar>,
        aliases: Arc<dyn AliasManager>,
        groups: Arc<dyn GroupManager>,
        properties: Arc<dyn PropertyDescriptionProvider>,
    ) -> Self {
        Self {
            grammar,
            aliases,
            groups,
            properties,
        }
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    /// Parse one input line into a Command
    ///
    /// # Arguments
    /// * `line` - The line as typed
    ///
    /// # Returns
    /// * `Result<Command>` - The command, or a parse error that never reaches the dispatcher
    pub fn parse(&self, line: &str) -> Result<Command> {
        let tokens = tokenize(line);
        let matched = self.grammar.parse_tokens(&tokens)?;
        let resolver = Resolver {
            aliases: self.aliases.as_ref(),
            groups: self.groups.as_ref(),
            properties: self.properties.as_ref(),
        };
        let command = resolver.build(matched)?;
        debug!("Parsed {:?}", command);
        Ok(command)
    }
}
