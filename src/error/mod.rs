//! Error handling for the console.
//!
//! Parsing, execution, configuration and grammar failures each have their own
//! enum; [`ConsoleError`] wraps them so the whole crate can use one
//! [`Result`] alias.

pub mod kinds;

pub use kinds::{
    ConfigError, ConsoleError, ExecutionError, GrammarError, ParseError, Result,
};
