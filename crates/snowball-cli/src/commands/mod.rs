//! Slash commands for interactive mode

mod phase;
mod stages;

pub use phase::PhaseCommand;
pub use stages::StagesCommand;

use snowball_agent::{ChatSession, ProgressBoard};

/// Result of executing a slash command
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Start the journey over
    Restart,
    /// Show a message to the user (not sent upstream)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(
    input: &str,
    session: &ChatSession,
    board: &ProgressBoard,
) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let command = rest.split_whitespace().next().unwrap_or("").to_lowercase();

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "phase" | "p" => PhaseCommand::execute(session),

        "stages" | "s" => StagesCommand::execute(board),

        "restart" | "r" => CommandResult::Restart,

        "quit" | "exit" | "q" => CommandResult::Exit,

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /phase, /p           Show where you are in the journey
  /stages, /s          Show progress stages of the last request
  /restart, /r         Start over from search
  /quit, /exit, /q     Exit snowball

Press Ctrl-C while a response is streaming to cancel it."#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_input_is_not_a_command() {
        let session = ChatSession::new();
        let board = ProgressBoard::new();
        assert_eq!(execute_command("laser printer", &session, &board), None);
    }

    #[test]
    fn test_known_commands() {
        let session = ChatSession::new();
        let board = ProgressBoard::new();
        assert_eq!(
            execute_command("/restart", &session, &board),
            Some(CommandResult::Restart)
        );
        assert_eq!(
            execute_command(" /Q ", &session, &board),
            Some(CommandResult::Exit)
        );
        assert!(matches!(
            execute_command("/help", &session, &board),
            Some(CommandResult::Message(m)) if m.contains("/stages")
        ));
    }

    #[test]
    fn test_unknown_command() {
        let session = ChatSession::new();
        let board = ProgressBoard::new();
        assert_eq!(
            execute_command("/checkout now", &session, &board),
            Some(CommandResult::Unknown("checkout".into()))
        );
    }
}
