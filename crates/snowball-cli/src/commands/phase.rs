//! /phase command - show the journey header

use super::CommandResult;
use crate::console::render_phase_header;
use snowball_agent::{ChatSession, Phase};

pub struct PhaseCommand;

impl PhaseCommand {
    pub fn execute(session: &ChatSession) -> CommandResult {
        let mut output = render_phase_header(session);
        output.push_str("\n\n");
        output.push_str(next_step_hint(session.phase()));
        CommandResult::Message(output)
    }
}

fn next_step_hint(phase: Phase) -> &'static str {
    match phase {
        Phase::Search => "Describe the product you are looking for.",
        Phase::Select => "Describe where you would use it to see it in a scene.",
        Phase::Pay => "Complete the payment and paste the payment ID (starting with \"pay_\").",
        Phase::Confirm => "Your order is confirmed. Use /restart to shop again.",
    }
}
