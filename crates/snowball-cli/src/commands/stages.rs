//! /stages command - show the progress panel

use super::CommandResult;
use crate::console::render_stages;
use snowball_agent::ProgressBoard;

pub struct StagesCommand;

impl StagesCommand {
    pub fn execute(board: &ProgressBoard) -> CommandResult {
        CommandResult::Message(render_stages(&board.snapshot()))
    }
}
