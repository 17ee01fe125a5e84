//! snowball - terminal chat client for the SnowballShop journey

mod commands;
mod config;
mod console;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use snowball_agent::{
    ChatSession, HttpTransport, PhaseRouter, ProgressBoard, ProgressStore, Role, TurnOutcome,
};

use crate::console::{ConsoleHandler, ConsoleProgress, render_phase_header};

/// snowball - shop from the terminal
#[derive(Parser, Debug)]
#[command(name = "snowball")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Gateway endpoint (default: http://localhost:8081/v1/responses)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Config file (default: ~/.config/snowball/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds without data before a request is abandoned (0 disables)
    #[arg(long)]
    idle_timeout: Option<u64>,

    /// Run a single search turn non-interactively
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Do not echo progress stages while a request streams
    #[arg(short, long)]
    quiet: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("snowball=debug"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config_path = args.config.clone().unwrap_or_else(config::Config::config_path);

    // Initialize config and exit
    if args.init_config {
        match config::Config::init(&config_path) {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let cfg = config::Config::load_from(&config_path);

    // Merge config with CLI args (CLI takes precedence)
    let endpoint = args.endpoint.clone().unwrap_or_else(|| cfg.endpoint());
    let idle_timeout = match args.idle_timeout {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => cfg.idle_timeout(),
    };

    let transport = HttpTransport::new(endpoint);
    tracing::debug!(endpoint = transport.endpoint(), ?idle_timeout, "Starting snowball");

    let board = ProgressBoard::new();
    let progress = ConsoleProgress::new(board.clone(), !args.quiet);
    let router = PhaseRouter::new(Arc::new(transport), Arc::new(progress))
        .with_operations(cfg.operations())
        .with_config(cfg.router_config())
        .with_idle_timeout(idle_timeout);

    let mut session = ChatSession::new();

    // Ctrl-C cancels a streaming request; when idle it exits
    let handle = router.handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if handle.is_running() {
                handle.abort();
            } else {
                std::process::exit(130);
            }
        }
    });

    // Non-interactive mode
    if let Some(command) = args.command {
        return run_command(&router, &mut session, &command).await;
    }

    run_interactive(&router, &mut session, &board).await
}

async fn run_command(
    router: &PhaseRouter,
    session: &mut ChatSession,
    command: &str,
) -> anyhow::Result<()> {
    println!("snowball> {}", command);
    println!();

    match run_turn(router, session, command).await? {
        TurnOutcome::Failed { .. } => std::process::exit(1),
        _ => Ok(()),
    }
}

async fn run_turn(
    router: &PhaseRouter,
    session: &mut ChatSession,
    input: &str,
) -> anyhow::Result<TurnOutcome> {
    let mut handler = ConsoleHandler::new();
    let outcome = router.handle_input(session, input, &mut handler).await?;
    if let TurnOutcome::Canned(message) = &outcome {
        println!("{}", message);
    }
    Ok(outcome)
}

async fn run_interactive(
    router: &PhaseRouter,
    session: &mut ChatSession,
    board: &ProgressBoard,
) -> anyhow::Result<()> {
    use std::io::{self, Write};

    // Show header and welcome (only if TTY)
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!("{}", render_phase_header(session));
        eprintln!();
    }
    print_last_assistant(session);

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        // Handle slash commands
        if let Some(result) = commands::execute_command(input, session, board) {
            match result {
                commands::CommandResult::Restart => {
                    session.start_over();
                    board.clear_stages();
                    print_last_assistant(session);
                }
                commands::CommandResult::Exit => {
                    break;
                }
                commands::CommandResult::Message(msg) => {
                    println!("{}", msg);
                }
                commands::CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
            }
            println!();
            continue;
        }

        println!();

        let phase_before = session.phase();
        let seen = session.messages().len();
        match run_turn(router, session, input).await {
            Ok(_) => {
                // The user message and the reply were already shown
                for message in session.messages().iter().skip(seen + 2) {
                    println!("\n{}", message.content);
                }
                if session.phase() != phase_before {
                    eprintln!("\n{}", render_phase_header(session));
                }
            }
            Err(e) => eprintln!("Error: {}", e),
        }
        println!();
    }

    Ok(())
}

fn print_last_assistant(session: &ChatSession) {
    if let Some(message) = session.last_message() {
        if message.role == Role::Assistant {
            println!("{}", message.content);
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_flag() {
        let args = Args::try_parse_from(["snowball", "-q", "-c", "desk lamp"]).unwrap();
        assert!(args.quiet);
        assert_eq!(args.command.as_deref(), Some("desk lamp"));

        let args = Args::try_parse_from(["snowball"]).unwrap();
        assert!(!args.quiet);
    }
}
