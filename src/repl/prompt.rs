//! Console prompt for the reedline editor

use std::borrow::Cow;

use reedline::{Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};

/// Prompt showing the configured text and the debug mode
pub struct ConsolePrompt {
    /// Prompt text, e.g. `echonet> `
    text: String,
    /// Whether debug mode is on
    debug: bool,
}

impl ConsolePrompt {
    /// Create a new prompt
    ///
    /// # Arguments
    /// * `text` - Configured prompt text
    /// * `debug` - Whether debug mode is on
    ///
    /// # Returns
    /// * `Self` - New prompt
    pub fn new(text: impl Into<String>, debug: bool) -> Self {
        Self {
            text: text.into(),
            debug,
        }
    }
}

impl Prompt for ConsolePrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        if self.debug {
            format!("[debug] {}", self.text).into()
        } else {
            Cow::Borrowed(&self.text)
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        "".into()
    }

    /// The indicator is part of the configured text
    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> Cow<'_, str> {
        "".into()
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        "... ".into()
    }

    /// Render the history search prompt
    ///
    /// # Arguments
    /// * `history_search` - History search state
    ///
    /// # Returns
    /// * `Cow<str>` - History search prompt
    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };

        format!("({}reverse-search: {}) ", prefix, history_search.term).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_prompt() {
        let prompt = ConsolePrompt::new("echonet> ", false);
        assert_eq!(prompt.render_prompt_left(), "echonet> ");
        assert_eq!(prompt.render_prompt_right(), "");
    }

    #[test]
    fn test_debug_prompt() {
        let prompt = ConsolePrompt::new("echonet> ", true);
        assert_eq!(prompt.render_prompt_left(), "[debug] echonet> ");
    }

    #[test]
    fn test_indicators() {
        let prompt = ConsolePrompt::new("> ", false);
        assert_eq!(prompt.render_prompt_indicator(PromptEditMode::Default), "");
        assert_eq!(prompt.render_prompt_multiline_indicator(), "... ");
    }
}
