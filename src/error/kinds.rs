use std::{fmt, io};

/// Crate-wide `Result` type using [`ConsoleError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ConsoleError>;

/// Top-level error type for console operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum ConsoleError {
    /// Command line parsing errors.
    Parse(ParseError),

    /// Command execution errors.
    Execution(ExecutionError),

    /// Configuration errors.
    Config(ConfigError),

    /// Grammar definition errors.
    Grammar(GrammarError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Errors detected before a command exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The grammar does not accept the input.
    GrammarMismatch {
        /// Rune offset of the first token that could not be consumed.
        position: usize,
        /// Text found at that position, empty at end of input.
        found: String,
        /// Names of the node kinds that could have followed.
        expected: Vec<String>,
    },

    /// The input matched but a value was rejected.
    SemanticValidation(String),

    /// A name did not resolve to a device, group or property.
    LookupFailure(String),
}

/// Errors raised while a dispatched command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// No device matches the specifier.
    DeviceNotFound(String),

    /// More than one device matches where exactly one is required.
    AmbiguousDevice { specifier: String, count: usize },

    /// The handler reported a failure.
    Failed(String),

    /// The dispatcher is not accepting commands.
    DispatcherStopped,
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// Anything else.
    Generic(String),
}

/// Inconsistencies in the grammar tree itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A node of the requested kind carries no label.
    MissingLabel(String),
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::Parse(e) => write!(f, "{e}"),
            ConsoleError::Execution(e) => write!(f, "Execution error: {e}"),
            ConsoleError::Config(e) => write!(f, "Configuration error: {e}"),
            ConsoleError::Grammar(e) => write!(f, "Grammar error: {e}"),
            ConsoleError::Io(e) => write!(f, "I/O error: {e}"),
            ConsoleError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::GrammarMismatch {
                position,
                found,
                expected,
            } => {
                if found.is_empty() {
                    write!(f, "Unexpected end of input at {position}")?;
                } else {
                    write!(f, "Unexpected '{found}' at {position}")?;
                }
                if !expected.is_empty() {
                    write!(f, ", expected one of: {}", expected.join(", "))?;
                }
                Ok(())
            }
            ParseError::SemanticValidation(msg) => write!(f, "Invalid value: {msg}"),
            ParseError::LookupFailure(msg) => write!(f, "Not found: {msg}"),
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::DeviceNotFound(spec) => write!(f, "No device matches {spec}"),
            ExecutionError::AmbiguousDevice { specifier, count } => {
                write!(f, "{count} devices match {specifier}, specify exactly one")
            }
            ExecutionError::Failed(msg) => write!(f, "{msg}"),
            ExecutionError::DispatcherStopped => write!(f, "Command dispatcher is stopped"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::MissingLabel(kind) => write!(f, "{kind} node without a label"),
        }
    }
}

impl std::error::Error for ConsoleError {}
impl std::error::Error for ParseError {}
impl std::error::Error for ExecutionError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for GrammarError {}

/* ========================= Conversions to ConsoleError ========================= */

impl From<io::Error> for ConsoleError {
    fn from(err: io::Error) -> Self {
        ConsoleError::Io(err)
    }
}

impl From<ParseError> for ConsoleError {
    fn from(err: ParseError) -> Self {
        ConsoleError::Parse(err)
    }
}

impl From<ExecutionError> for ConsoleError {
    fn from(err: ExecutionError) -> Self {
        ConsoleError::Execution(err)
    }
}

impl From<ConfigError> for ConsoleError {
    fn from(err: ConfigError) -> Self {
        ConsoleError::Config(err)
    }
}

impl From<GrammarError> for ConsoleError {
    fn from(err: GrammarError) -> Self {
        ConsoleError::Grammar(err)
    }
}

impl From<String> for ConsoleError {
    fn from(msg: String) -> Self {
        ConsoleError::Generic(msg)
    }
}

impl From<&str> for ConsoleError {
    fn from(msg: &str) -> Self {
        ConsoleError::Generic(msg.to_owned())
    }
}

impl From<reedline::ReedlineError> for ConsoleError {
    fn from(err: reedline::ReedlineError) -> Self {
        ConsoleError::Generic(format!("Line editor error: {err}"))
    }
}

impl From<toml::de::Error> for ConsoleError {
    fn from(err: toml::de::Error) -> Self {
        ConsoleError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<toml::ser::Error> for ConsoleError {
    fn from(err: toml::ser::Error) -> Self {
        ConsoleError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::Generic(format!("JSON error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_mismatch_display() {
        let err = ParseError::GrammarMismatch {
            position: 9,
            found: "8".to_string(),
            expected: vec!["EPC".to_string()],
        };
        assert_eq!(err.to_string(), "Unexpected '8' at 9, expected one of: EPC");
    }

    #[test]
    fn test_grammar_mismatch_at_end() {
        let err = ParseError::GrammarMismatch {
            position: 4,
            found: String::new(),
            expected: vec![],
        };
        assert_eq!(err.to_string(), "Unexpected end of input at 4");
    }

    #[test]
    fn test_conversions() {
        let err: ConsoleError = ExecutionError::DispatcherStopped.into();
        assert!(matches!(
            err,
            ConsoleError::Execution(ExecutionError::DispatcherStopped)
        ));

        let err: ConsoleError = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }
}
