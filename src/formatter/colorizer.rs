//! Color output support for terminal formatting
//!
//! Applies nu-ansi-term styles to status lines and can be switched off for
//! `--no-color` or non-terminal output.

use nu_ansi_term::{Color, Style};

/// Color scheme for output highlighting
#[derive(Debug, Clone, Copy)]
pub struct Colorizer {
    /// Enable colors
    enabled: bool,
}

impl Colorizer {
    /// Create a new colorizer
    ///
    /// # Arguments
    /// * `enabled` - Enable color output
    ///
    /// # Returns
    /// * `Self` - New colorizer
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Enable or disable colors
    ///
    /// # Arguments
    /// * `enabled` - Whether to enable colors
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.enabled {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Colorize text as success (green)
    ///
    /// # Arguments
    /// * `text` - Text to colorize
    ///
    /// # Returns
    /// * `String` - Colorized text
    pub fn success(&self, text: &str) -> String {
        self.paint(Color::Green.normal(), text)
    }

    /// Error line, always prefixed with `Error:`
    ///
    /// # Arguments
    /// * `text` - Error message
    ///
    /// # Returns
    /// * `String` - Colorized error line
    pub fn error(&self, text: &str) -> String {
        self.paint(Color::Red.normal(), &format!("Error: {text}"))
    }

    /// Dimmed text for statistics
    pub fn dim(&self, text: &str) -> String {
        self.paint(Style::new().dimmed(), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_colorizer_is_plain() {
        let colorizer = Colorizer::new(false);
        assert_eq!(colorizer.success("ok"), "ok");
        assert_eq!(colorizer.error("bad"), "Error: bad");
    }

    #[test]
    fn test_enabled_colorizer_adds_escapes() {
        let colorizer = Colorizer::new(true);
        let text = colorizer.error("bad");
        assert!(text.contains("\x1b["));
        assert!(text.contains("Error: bad"));
    }
}
