use std::sync::Arc;

use reedline::{
    ColumnarMenu, Emacs, FileBackedHistory, KeyCode, KeyModifiers, Keybindings, MenuBuilder,
    Reedline, ReedlineEvent, ReedlineMenu, Signal, default_emacs_keybindings,
};
use tracing::debug;

use crate::backend::DeviceHandler;
use crate::config::HistoryConfig;
use crate::error::Result;

use super::completer::ConsoleCompleter;
use super::hinter::ConsoleHinter;
use super::prompt::ConsolePrompt;

const COMPLETION_MENU: &str = "completion_menu";

/// Line editor for the interactive console
pub struct ReplEngine {
    /// Line editor for command input
    editor: Reedline,

    /// Configured prompt text
    prompt: String,

    /// Source of the debug flag shown in the prompt
    handler: Arc<dyn DeviceHandler>,
}

impl ReplEngine {
    /// Create a new REPL engine
    ///
    /// # Arguments
    /// * `completer` - Grammar-driven completer
    /// * `hinter` - Inline hinter
    /// * `history_config` - History configuration
    /// * `prompt` - Prompt text
    /// * `handler` - Device handler, read for the debug flag
    /// * `use_colors` - Enable ANSI colors in the editor
    ///
    /// # Returns
    /// * `Result<Self>` - New REPL engine or error
    pub fn new(
        completer: ConsoleCompleter,
        hinter: ConsoleHinter,
        history_config: &HistoryConfig,
        prompt: String,
        handler: Arc<dyn DeviceHandler>,
        use_colors: bool,
    ) -> Result<Self> {
        let history = if history_config.persist {
            debug!("History file: {}", history_config.file_path.display());
            FileBackedHistory::with_file(history_config.max_size, history_config.file_path.clone())?
        } else {
            FileBackedHistory::new(history_config.max_size)?
        };

        let mut keybindings = default_emacs_keybindings();
        add_completion_keybindings(&mut keybindings);

        let menu = ColumnarMenu::default().with_name(COMPLETION_MENU);
        let editor = Reedline::create()
            .with_history(Box::new(history))
            .with_completer(Box::new(completer))
            .with_hinter(Box::new(hinter))
            .with_menu(ReedlineMenu::EngineCompleter(Box::new(menu)))
            .with_edit_mode(Box::new(Emacs::new(keybindings)))
            .with_quick_completions(true)
            .with_ansi_colors(use_colors);

        Ok(Self {
            editor,
            prompt,
            handler,
        })
    }

    /// Read a single line of input
    ///
    /// # Returns
    /// * `Result<Option<String>>` - Input line, empty after Ctrl-C, None on Ctrl-D
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let prompt = ConsolePrompt::new(self.prompt.as_str(), self.handler.is_debug());
        match self.editor.read_line(&prompt)? {
            Signal::Success(line) => Ok(Some(line)),
            Signal::CtrlD => Ok(None),
            _ => Ok(Some(String::new())),
        }
    }
}

/// Tab opens the completion menu and cycles through it
fn add_completion_keybindings(keybindings: &mut Keybindings) {
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
    keybindings.add_binding(
        KeyModifiers::SHIFT,
        KeyCode::BackTab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
            ReedlineEvent::MenuPrevious,
        ]),
    );
}
