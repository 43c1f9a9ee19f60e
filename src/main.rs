//! ECHONET Lite command console
//!
//! An interactive console that turns typed lines into device commands,
//! completes them from the command grammar, and executes them one at a time.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode
//! echonet-console
//!
//! # Run commands and exit
//! echonet-console -e discover -e "devices -all"
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use echonet_console::backend::{DeviceHandler, MemoryBackend};
use echonet_console::cli::CliInterface;
use echonet_console::dispatcher::Dispatcher;
use echonet_console::error::Result;
use echonet_console::executor::CommandRouter;
use echonet_console::formatter::Formatter;
use echonet_console::grammar::Grammar;
use echonet_console::parser::CommandParser;
use echonet_console::repl::{ConsoleCompleter, ConsoleHinter, ReplEngine, Session};

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Main application logic
///
/// This function orchestrates the application startup:
/// 1. Parse command-line arguments
/// 2. Load configuration
/// 3. Initialize logging
/// 4. Handle subcommands or run the console
///
/// # Returns
/// * `Result<()>` - Success or error
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    if cli.handle_subcommand().await? {
        return Ok(());
    }

    let backend = Arc::new(MemoryBackend::from_config(&cli.config().devices)?);
    backend.set_debug(cli.config().console.debug);
    let grammar = Arc::new(Grammar::new());

    let parser = CommandParser::new(
        grammar.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
    );
    let router = Arc::new(CommandRouter::new(
        backend.clone(),
        backend.clone(),
        grammar.clone(),
    ));

    let session_token = CancellationToken::new();
    let dispatcher = Arc::new(Dispatcher::new(router, &session_token));
    dispatcher.start().await?;

    let formatter = Formatter::from_config(&cli.config().display, use_colors(&cli));
    let session = Session::new(parser, dispatcher, formatter);

    let result = if cli.args().execute.is_empty() {
        run_interactive_mode(&cli, &session, grammar, backend).await
    } else {
        debug!("Executing {} line(s)", cli.args().execute.len());
        session.run_batch(&cli.args().execute).await
    };

    session.shutdown().await;
    result
}

/// Run the console in interactive mode
async fn run_interactive_mode(
    cli: &CliInterface,
    session: &Session,
    grammar: Arc<Grammar>,
    backend: Arc<MemoryBackend>,
) -> Result<()> {
    let config = cli.config();
    let completer = ConsoleCompleter::new(
        grammar.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
    );
    let mut engine = ReplEngine::new(
        completer,
        ConsoleHinter::new(grammar),
        &config.history,
        config.console.prompt.clone(),
        backend,
        use_colors(cli),
    )?;

    cli.print_banner();
    info!("Interactive session started");
    session.run_interactive(&mut engine).await?;

    if !cli.args().quiet {
        println!("Goodbye!");
    }
    Ok(())
}

/// Colors are used when configured and stdout is a terminal
fn use_colors(cli: &CliInterface) -> bool {
    use std::io::IsTerminal;
    cli.config().display.color_output && std::io::stdout().is_terminal()
}

/// Initialize logging system based on verbosity level
///
/// `RUST_LOG` takes precedence over the configured level when set.
///
/// # Arguments
/// * `cli` - CLI interface with the effective logging configuration
fn initialize_logging(cli: &CliInterface) {
    let level = cli.config().logging.level.to_tracing_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
