//! Shell completion generation for echonet-console
//!
//! Produces bash, zsh and fish scripts from the clap definition. The
//! `--execute` flag additionally completes the console's command words.

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::CliArgs;
use crate::error::{ConfigError, ConsoleError, Result};
use crate::grammar::Grammar;

const BIN_NAME: &str = "echonet-console";

/// Generate shell completion script on stdout
///
/// # Arguments
/// * `shell_name` - Shell type (bash, zsh, fish)
///
/// # Returns
/// * `Result<()>` - Success or error
pub fn generate_completion(shell_name: &str) -> Result<()> {
    let shell = parse_shell(shell_name)?;
    print!("{}", completion_script(shell)?);
    Ok(())
}

/// Parse shell name string to Shell enum
fn parse_shell(shell_name: &str) -> Result<Shell> {
    match shell_name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        _ => Err(ConsoleError::Config(ConfigError::Generic(format!(
            "Unsupported shell: {shell_name}. Supported shells: bash, zsh, fish"
        )))),
    }
}

/// Clap-generated script followed by command-word completion for `-e`
fn completion_script(shell: Shell) -> Result<String> {
    let mut cmd = CliArgs::command();
    let mut buffer = Vec::new();
    generate(shell, &mut cmd, BIN_NAME, &mut buffer);
    let basic = String::from_utf8_lossy(&buffer);

    let words = Grammar::new().command_names()?.join(" ");
    let extra = match shell {
        Shell::Bash => format!(
            r#"
# Console command words for -e/--execute
_echonet_console_enhanced() {{
    local cur prev words cword
    _init_completion || return

    if [[ "$prev" == "-e" || "$prev" == "--execute" ]]; then
        COMPREPLY=($(compgen -W "{words}" -- "$cur"))
        return 0
    fi

    _echonet-console "$@"
}}

complete -F _echonet_console_enhanced {BIN_NAME}
"#
        ),
        Shell::Zsh => format!(
            r#"
# Console command words for -e/--execute
_echonet_console_enhanced() {{
    if [[ ${{words[CURRENT-1]}} == "-e" || ${{words[CURRENT-1]}} == "--execute" ]]; then
        local -a commands
        commands=({words})
        _describe 'commands' commands
        return 0
    fi

    _echonet-console "$@"
}}

compdef _echonet_console_enhanced {BIN_NAME}
"#
        ),
        _ => format!(
            r#"
# Console command words for -e/--execute
complete -c {BIN_NAME} -s e -l execute -f -a "{words}" -d "Console command"
"#
        ),
    };

    Ok(format!("{basic}{extra}"))
}
