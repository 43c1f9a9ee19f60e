//! Configuration management for the console
//!
//! This module handles loading, validating and saving the TOML configuration:
//! - `[display]`: output format, colors, table style
//! - `[history]`: line history persistence
//! - `[logging]`: default log level
//! - `[console]`: prompt and initial debug mode
//! - `[[devices]]`: devices on the simulated network
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use toml_edit::DocumentMut;

use crate::device::{Eoj, Epc, parse_edt};
use crate::error::{ConfigError, Result};
use crate::formatter::TableStyle;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,

    /// History configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Console behavior
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Devices answering on the simulated network
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// Display and output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Output format (table, json, json-pretty, compact)
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Enable colored output
    #[serde(default = "default_color_output")]
    pub color_output: bool,

    /// Border style of tables
    #[serde(default = "default_table_style")]
    pub table_style: TableStyle,

    /// Show execution time and device counts
    #[serde(default = "default_show_timing")]
    pub show_timing: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// One row per device, one column per property
    Table,

    /// Compact JSON format (single-line)
    Json,

    /// Pretty-printed JSON format (multi-line)
    JsonPretty,

    /// One line per device
    Compact,
}

/// Command history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of history entries
    #[serde(default = "default_max_history_size")]
    pub max_size: usize,

    /// Path to history file
    #[serde(default = "default_history_file")]
    pub file_path: PathBuf,

    /// Enable history persistence
    #[serde(default = "default_persist_history")]
    pub persist: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Interactive console settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Prompt shown before each line
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Start with debug mode on
    #[serde(default)]
    pub debug: bool,
}

/// One simulated device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// IP address
    pub ip: String,

    /// Object identifier, `cccc` or `cccc:i`
    pub eoj: String,

    /// Initial property values as `EPC:EDT` hex strings
    #[serde(default)]
    pub properties: Vec<String>,
}

// Default value functions
fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_color_output() -> bool {
    true
}

fn default_table_style() -> TableStyle {
    TableStyle::Modern
}

fn default_show_timing() -> bool {
    true
}

fn default_max_history_size() -> usize {
    1000
}

fn default_history_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".echonet_console_history")
}

fn default_persist_history() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    false
}

fn default_prompt() -> String {
    "echonet> ".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            color_output: default_color_output(),
            table_style: default_table_style(),
            show_timing: default_show_timing(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_history_size(),
            file_path: default_history_file(),
            persist: default_persist_history(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - `<config dir>/echonet-console/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("echonet-console")
            .join("config.toml")
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Load the explicit file, or the default file when it exists, or defaults
    ///
    /// # Arguments
    /// * `path` - File named on the command line, if any
    ///
    /// # Returns
    /// * `Result<(Config, Option<PathBuf>)>` - Configuration and the file it came from
    pub fn load(path: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        match path {
            Some(path) => Ok((Self::load_from_file(path)?, Some(path.to_path_buf()))),
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Ok((Self::load_from_file(&default)?, Some(default)))
                } else {
                    Ok((Self::default(), None))
                }
            }
        }
    }

    /// Save configuration to a file, creating parent directories
    ///
    /// # Arguments
    /// * `path` - Path where to save the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_with_comments()?)?;
        Ok(())
    }

    /// Serialize to TOML with a comment above each section
    pub fn to_toml_with_comments(&self) -> Result<String> {
        let plain = toml::to_string(self)?;
        let mut doc: DocumentMut = plain
            .parse()
            .map_err(|e: toml_edit::TomlError| ConfigError::InvalidFormat(e.to_string()))?;

        let comments = [
            ("display", "# Output format: table, json, json-pretty or compact\n"),
            ("history", "\n# Line history\n"),
            ("logging", "\n# Log level: error, warn, info, debug or trace\n"),
            ("console", "\n# Interactive console\n"),
        ];
        for (section, comment) in comments {
            if let Some(table) = doc.get_mut(section).and_then(|item| item.as_table_mut()) {
                table.decor_mut().set_prefix(comment);
            }
        }
        if let Some(devices) = doc
            .get_mut("devices")
            .and_then(|item| item.as_array_of_tables_mut())
            && let Some(first) = devices.iter_mut().next()
        {
            first
                .decor_mut()
                .set_prefix("\n# Simulated devices; properties are \"EPC:EDT\" in hex\n");
        }
        Ok(doc.to_string())
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, the first invalid field otherwise
    pub fn validate(&self) -> Result<()> {
        if self.history.max_size == 0 {
            return Err(invalid("history.max_size", "0"));
        }
        if self.console.prompt.is_empty() {
            return Err(invalid("console.prompt", ""));
        }
        for device in &self.devices {
            if device.ip.parse::<IpAddr>().is_err() {
                return Err(invalid("devices.ip", &device.ip));
            }
            if device.eoj.parse::<Eoj>().is_err() {
                return Err(invalid("devices.eoj", &device.eoj));
            }
            for property in &device.properties {
                let valid = property
                    .split_once(':')
                    .is_some_and(|(epc, edt)| Epc::parse_hex(epc).is_some() && parse_edt(edt).is_some());
                if !valid {
                    return Err(invalid("devices.properties", property));
                }
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, value: &str) -> crate::error::ConsoleError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl OutputFormat {
    /// Check if format is JSON-based
    pub fn is_json(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::JsonPretty)
    }
}
