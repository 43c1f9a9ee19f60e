//! Output formatting and colorization
//!
//! This module turns execution results and errors into terminal text:
//! - Table formatting for device, alias and group listings
//! - JSON formatting (compact and pretty-printed)
//! - Compact formatting for minimal output
//! - Color highlighting for status and error lines

mod colorizer;
mod json;
mod stats;
mod table;

pub use colorizer::Colorizer;
pub use json::JsonFormatter;
pub use stats::StatsFormatter;
pub use table::{TableFormatter, TableStyle};

use crate::config::{DisplayConfig, OutputFormat};
use crate::error::{ConsoleError, Result};
use crate::executor::{ExecutionResult, ResultData};

/// Main formatter for execution results
pub struct Formatter {
    /// Output format type
    format_type: OutputFormat,

    /// Style used by table output
    table_style: TableStyle,

    /// Colorizer for output highlighting
    colorizer: Colorizer,

    /// Enable colored output
    use_colors: bool,

    /// Append timing and device counts
    show_stats: bool,
}

impl Formatter {
    /// Create a new formatter
    ///
    /// # Arguments
    /// * `format_type` - Output format type
    /// * `use_colors` - Enable colored output
    ///
    /// # Returns
    /// * `Self` - New formatter instance
    pub fn new(format_type: OutputFormat, use_colors: bool) -> Self {
        Self {
            format_type,
            table_style: TableStyle::Modern,
            colorizer: Colorizer::new(use_colors),
            use_colors,
            show_stats: true,
        }
    }

    /// Formatter configured from the `[display]` section
    pub fn from_config(display: &DisplayConfig, use_colors: bool) -> Self {
        let mut formatter = Self::new(display.format, use_colors);
        formatter.table_style = display.table_style;
        formatter.show_stats = display.show_timing;
        formatter
    }

    /// Format execution result according to configured format
    ///
    /// # Arguments
    /// * `result` - Execution result to format
    ///
    /// # Returns
    /// * `Result<String>` - Formatted output or error
    pub fn format(&self, result: &ExecutionResult) -> Result<String> {
        let output = match self.format_type {
            OutputFormat::Table => TableFormatter::new()
                .with_style(self.table_style)
                .with_colors(self.use_colors)
                .format(&result.data)?,
            OutputFormat::Json => JsonFormatter::new(false, false, 2).format(&result.data)?,
            OutputFormat::JsonPretty => {
                JsonFormatter::new(true, self.use_colors, 2).format(&result.data)?
            }
            OutputFormat::Compact => self.format_compact(&result.data),
        };

        if !self.show_stats || self.format_type.is_json() {
            return Ok(output);
        }
        let stats = StatsFormatter::new(true, true).format(result);
        if stats.is_empty() {
            Ok(output)
        } else {
            Ok(format!("{}\n{}", output, self.colorizer.dim(&stats)))
        }
    }

    /// Format result data in compact form, one line per entry
    ///
    /// # Arguments
    /// * `data` - Result data to format
    ///
    /// # Returns
    /// * `String` - Compact text
    pub fn format_compact(&self, data: &ResultData) -> String {
        match data {
            ResultData::Devices(rows) => rows
                .iter()
                .map(|row| {
                    let values: Vec<String> = row
                        .properties
                        .iter()
                        .map(|p| format!("{}={}", p.epc, p.value))
                        .collect();
                    format!("{} {}", row.device, values.join(" "))
                })
                .collect::<Vec<_>>()
                .join("\n"),
            ResultData::GroupedDevices { groups, .. } => groups
                .iter()
                .map(|(key, rows)| format!("{key}: {} device(s)", rows.len()))
                .collect::<Vec<_>>()
                .join("\n"),
            ResultData::Aliases(aliases) => aliases
                .iter()
                .map(|(alias, device)| format!("{alias} = {device}"))
                .collect::<Vec<_>>()
                .join("\n"),
            ResultData::Groups(groups) => groups
                .iter()
                .map(|(name, members)| format!("{name}: {} device(s)", members.len()))
                .collect::<Vec<_>>()
                .join("\n"),
            ResultData::Message(msg) => msg.clone(),
            ResultData::None => String::new(),
        }
    }

    /// Format an error for the console
    pub fn format_error(&self, error: &ConsoleError) -> String {
        self.colorizer.error(&error.to_string())
    }

    /// Set output format
    ///
    /// # Arguments
    /// * `format_type` - New output format
    pub fn set_format(&mut self, format_type: OutputFormat) {
        self.format_type = format_type;
    }

    /// Enable or disable colors
    ///
    /// # Arguments
    /// * `enabled` - Whether to enable colors
    pub fn set_colors(&mut self, enabled: bool) {
        self.use_colors = enabled;
        self.colorizer.set_enabled(enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutionError;

    #[test]
    fn test_message_passthrough() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format(&ExecutionResult::message("3 device(s) found")).unwrap();
        assert_eq!(output, "3 device(s) found");
    }

    #[test]
    fn test_format_error() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let err = ConsoleError::from(ExecutionError::DeviceNotFound("0130".to_string()));
        assert_eq!(formatter.format_error(&err), "Error: Execution error: No device matches 0130");
    }

    #[test]
    fn test_json_has_no_stats() {
        let mut formatter = Formatter::new(OutputFormat::Table, false);
        formatter.set_format(OutputFormat::Json);
        let output = formatter.format(&ExecutionResult::message("hi")).unwrap();
        assert_eq!(output, "\"hi\"");
    }
}
