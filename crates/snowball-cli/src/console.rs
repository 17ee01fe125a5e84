//! Terminal rendering of streamed text, progress stages and the phase header

use std::io::{self, Write};

use snowball_agent::{
    CallHandler, ChatSession, OperationResult, PhaseStatus, ProgressBoard, ProgressStage,
    ProgressStore, StageStatus,
};

/// Prints call output as it streams.
///
/// Deltas carry the full text so far; only the new characters are printed.
#[derive(Debug, Default)]
pub struct ConsoleHandler {
    printed_chars: usize,
}

impl ConsoleHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Characters of `text` past the first `printed` ones
fn unseen(text: &str, printed: usize) -> &str {
    match text.char_indices().nth(printed) {
        Some((offset, _)) => &text[offset..],
        None => "",
    }
}

impl CallHandler for ConsoleHandler {
    fn on_delta(&mut self, text: &str) {
        let new_text = unseen(text, self.printed_chars);
        if new_text.is_empty() {
            return;
        }
        print!("{}", new_text);
        io::stdout().flush().ok();
        self.printed_chars += new_text.chars().count();
    }

    fn on_complete(&mut self, result: &OperationResult, _correlation_id: Option<&str>) {
        // Scene results never stream
        if let OperationResult::Scene {
            situation_description,
            image_url,
            ..
        } = result
        {
            println!("{}\n\n![Scene]({})", situation_description, image_url);
        } else {
            println!();
        }
        self.printed_chars = 0;
    }

    fn on_error(&mut self, message: &str) {
        if self.printed_chars > 0 {
            println!();
        }
        eprintln!("{}", message);
        self.printed_chars = 0;
    }
}

/// Progress store that echoes stage changes to stderr unless quiet
#[derive(Debug, Clone)]
pub struct ConsoleProgress {
    board: ProgressBoard,
    echo: bool,
}

impl ConsoleProgress {
    pub fn new(board: ProgressBoard, echo: bool) -> Self {
        Self { board, echo }
    }
}

impl ProgressStore for ConsoleProgress {
    fn add_stage(&self, name: &str) {
        self.board.add_stage(name);
    }

    fn update_stage_status(&self, name: &str, status: StageStatus) {
        let before = self.board.status(name);
        self.board.update_stage_status(name, status);
        let after = self.board.status(name);
        if !self.echo {
            return;
        }
        if let Some(line) = stage_change(name, before, after) {
            eprintln!("{}", line);
        }
    }

    fn clear_stages(&self) {
        self.board.clear_stages();
    }
}

/// Echo line for a stage whose status moved
fn stage_change(
    name: &str,
    before: Option<StageStatus>,
    after: Option<StageStatus>,
) -> Option<String> {
    let status = after.filter(|status| Some(*status) != before)?;
    Some(format!("  {} {}", stage_marker(status), name))
}

fn stage_marker(status: StageStatus) -> &'static str {
    match status {
        StageStatus::Pending => "○",
        StageStatus::InProgress => "◐",
        StageStatus::Completed => "●",
    }
}

/// Progress panel for `/stages`
pub fn render_stages(stages: &[ProgressStage]) -> String {
    if stages.is_empty() {
        return "No progress stages yet.".to_string();
    }

    let mut output = String::from("Progress:\n");
    for stage in stages {
        output.push_str(&format!(
            "  {} {:<28} {:<12} {}\n",
            stage_marker(stage.status),
            stage.name,
            stage.status.as_str(),
            stage.timestamp.format("%H:%M:%S")
        ));
    }
    output.pop();
    output
}

/// Phase header, e.g. `SnowballShop  [Search] ▸ Select ▸ Pay ▸ Confirm`
pub fn render_phase_header(session: &ChatSession) -> String {
    let steps: Vec<String> = session
        .phase_header()
        .into_iter()
        .map(|(phase, status)| match status {
            PhaseStatus::Completed => format!("✓ {}", phase.label()),
            PhaseStatus::Active => format!("[{}]", phase.label()),
            PhaseStatus::Upcoming => phase.label().to_string(),
        })
        .collect();
    format!("SnowballShop  {}", steps.join(" ▸ "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen() {
        assert_eq!(unseen("Found a", 0), "Found a");
        assert_eq!(unseen("Found a", 5), " a");
        assert_eq!(unseen("Found a", 7), "");
        assert_eq!(unseen("café ☕", 4), " ☕");
    }

    #[test]
    fn test_render_phase_header() {
        let session = ChatSession::new();
        assert_eq!(
            render_phase_header(&session),
            "SnowballShop  [Search] ▸ Select ▸ Pay ▸ Confirm"
        );
    }

    #[test]
    fn test_render_stages() {
        let board = ProgressBoard::new();
        assert_eq!(render_stages(&board.snapshot()), "No progress stages yet.");

        board.add_stage("Planning");
        board.update_stage_status("Planning", StageStatus::Completed);
        board.add_stage("search_shop_catalog");
        let rendered = render_stages(&board.snapshot());
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("● Planning"));
        assert!(lines[1].contains("completed"));
        assert!(lines[2].contains("○ search_shop_catalog"));
    }

    #[test]
    fn test_stage_change_only_on_movement() {
        assert_eq!(
            stage_change("Planning", None, Some(StageStatus::InProgress)).as_deref(),
            Some("  ◐ Planning")
        );
        assert_eq!(
            stage_change(
                "Planning",
                Some(StageStatus::InProgress),
                Some(StageStatus::Completed)
            )
            .as_deref(),
            Some("  ● Planning")
        );
        assert_eq!(
            stage_change(
                "Planning",
                Some(StageStatus::Completed),
                Some(StageStatus::Completed)
            ),
            None
        );
        assert_eq!(stage_change("missing", None, None), None);
    }

    #[test]
    fn test_console_progress_writes_through() {
        let board = ProgressBoard::new();
        let progress = ConsoleProgress::new(board.clone(), false);
        progress.add_stage("fetch_order");
        progress.update_stage_status("fetch_order", StageStatus::InProgress);
        assert_eq!(board.status("fetch_order"), Some(StageStatus::InProgress));
        progress.clear_stages();
        assert!(board.is_empty());
    }
}
