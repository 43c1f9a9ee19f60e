//! Hinter for reedline - inline hints from the grammar and history

use std::sync::Arc;

use nu_ansi_term::{Color, Style};
use reedline::{Hinter, History};

use crate::grammar::{Grammar, split_last_word, tokenize};

/// Console hinter for reedline
///
/// A keyword that is the only possible continuation of the word being typed
/// is hinted first; otherwise the most recent history line with the same
/// prefix is.
pub struct ConsoleHinter {
    /// Grammar used for keyword hints
    grammar: Arc<Grammar>,
    /// Style for hints
    style: Style,
    /// Current hint text
    current_hint: String,
}

impl ConsoleHinter {
    /// Create a new hinter with default style
    ///
    /// # Arguments
    /// * `grammar` - Shared command grammar
    ///
    /// # Returns
    /// * `Self` - New hinter
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self {
            grammar,
            style: Style::new().italic().fg(Color::DarkGray),
            current_hint: String::new(),
        }
    }

    /// Rest of the single keyword that can complete the last word
    fn keyword_hint(&self, line: &str) -> Option<String> {
        let (tokens, word) = split_last_word(tokenize(line));
        if word.is_empty() {
            return None;
        }
        let (_, expected) = self.grammar.candidates(&tokens);
        let mut labels = expected
            .iter()
            .filter_map(|e| e.label)
            .filter(|label| label.starts_with(&word) && label.len() > word.len());
        match (labels.next(), labels.next()) {
            (Some(label), None) => Some(label[word.len()..].to_string()),
            _ => None,
        }
    }

    fn history_hint(line: &str, history: &dyn History) -> Option<String> {
        let item = history
            .search(reedline::SearchQuery::last_with_prefix(line.to_string(), None))
            .ok()
            .and_then(|results| results.into_iter().next())?;
        let history_line = item.command_line.as_str();
        (history_line.len() > line.len() && history_line.starts_with(line))
            .then(|| history_line[line.len()..].to_string())
    }
}

impl Hinter for ConsoleHinter {
    /// Provide a hint for the current line
    ///
    /// # Arguments
    /// * `line` - The current input line
    /// * `pos` - Cursor position
    /// * `history` - Command history
    /// * `use_ansi_coloring` - Whether to use ANSI colors
    /// * `_cwd` - Current working directory (unused)
    ///
    /// # Returns
    /// * `String` - Hint text to display after the cursor
    fn handle(
        &mut self,
        line: &str,
        pos: usize,
        history: &dyn History,
        use_ansi_coloring: bool,
        _cwd: &str,
    ) -> String {
        self.current_hint.clear();

        if pos != line.len() || line.trim().is_empty() {
            return String::new();
        }

        let Some(hint) = self
            .keyword_hint(line)
            .or_else(|| Self::history_hint(line, history))
        else {
            return String::new();
        };

        self.current_hint = hint;
        if use_ansi_coloring {
            self.style.paint(self.current_hint.as_str()).to_string()
        } else {
            self.current_hint.clone()
        }
    }

    /// Return the next hint token
    ///
    /// # Returns
    /// * `String` - First word of the hint
    fn next_hint_token(&self) -> String {
        let trimmed = self.current_hint.trim_start();
        let leading = self.current_hint.len() - trimmed.len();
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        self.current_hint[..leading + end].to_string()
    }

    /// Return the complete hint
    ///
    /// # Returns
    /// * `String` - Complete hint text
    fn complete_hint(&self) -> String {
        self.current_hint.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reedline::FileBackedHistory;

    fn create_test_history() -> Box<dyn History> {
        Box::new(FileBackedHistory::new(100).expect("Failed to create history"))
    }

    fn create_test_hinter() -> ConsoleHinter {
        ConsoleHinter::new(Arc::new(Grammar::new()))
    }

    #[test]
    fn test_empty_line_no_hint() {
        let mut hinter = create_test_hinter();
        let history = create_test_history();
        assert_eq!(hinter.handle("", 0, history.as_ref(), false, "/tmp"), "");
    }

    #[test]
    fn test_cursor_not_at_end_no_hint() {
        let mut hinter = create_test_hinter();
        let history = create_test_history();
        assert_eq!(hinter.handle("disc", 2, history.as_ref(), false, "/tmp"), "");
    }

    #[test]
    fn test_unique_keyword_hint() {
        let mut hinter = create_test_hinter();
        let history = create_test_history();
        assert_eq!(hinter.handle("disc", 4, history.as_ref(), false, "/tmp"), "over");
        assert_eq!(hinter.complete_hint(), "over");
        assert_eq!(hinter.next_hint_token(), "over");
    }

    #[test]
    fn test_ambiguous_keyword_no_hint() {
        let mut hinter = create_test_hinter();
        let history = create_test_history();
        assert_eq!(hinter.handle("de", 2, history.as_ref(), false, "/tmp"), "");
    }

    #[test]
    fn test_option_hint() {
        let mut hinter = create_test_hinter();
        let history = create_test_history();
        assert_eq!(
            hinter.handle("get 0130 -sk", 12, history.as_ref(), false, "/tmp"),
            "ip-validation"
        );
    }
}
