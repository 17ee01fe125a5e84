//! Derives progress stages from the event stream of one call

use std::collections::HashSet;

use snowball_ai::{EventType, StreamEvent, ToolPhase};

use crate::{
    operation::FinalizePolicy,
    progress::{FINALIZING, PLANNING, PROCESSING, ProgressStore, StageStatus},
};

/// Call-scoped stage tracker.
///
/// Tool transitions may arrive twice (once from the `event:` line and once
/// from its `data:` line); both paths go through the same idempotent store
/// and the finished-tool set, so duplicates count once.
pub struct StageTracker<'a> {
    store: &'a dyn ProgressStore,
    policy: FinalizePolicy,
    finished_tools: HashSet<String>,
    closing_added: bool,
}

impl<'a> StageTracker<'a> {
    pub fn new(store: &'a dyn ProgressStore, policy: FinalizePolicy) -> Self {
        Self {
            store,
            policy,
            finished_tools: HashSet::new(),
            closing_added: false,
        }
    }

    /// Name of the stage that closes this call
    pub fn closing_stage(&self) -> &'static str {
        match self.policy {
            FinalizePolicy::AfterTools(_) => FINALIZING,
            FinalizePolicy::OnTextDone => PROCESSING,
        }
    }

    /// Number of distinct tools that reported completion
    pub fn finished_tools(&self) -> usize {
        self.finished_tools.len()
    }

    /// Handle an `event:` announcement. Only tool transitions count.
    pub fn observe_announce(&mut self, event_type: &EventType) {
        if let Some((name, phase)) = event_type.tool() {
            self.tool(name, phase);
        }
    }

    /// Handle a decoded `data:` event
    pub fn observe(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Created => {
                self.store.add_stage(PLANNING);
                self.store.update_stage_status(PLANNING, StageStatus::InProgress);
            }
            StreamEvent::OutputItemAdded => {
                self.store.update_stage_status(PLANNING, StageStatus::Completed);
            }
            StreamEvent::Tool { name, phase } => self.tool(name, *phase),
            StreamEvent::TextDelta { .. } => {
                if let FinalizePolicy::AfterTools(expected) = self.policy {
                    if self.finished_tools.len() >= expected {
                        self.open_closing_stage();
                    }
                }
            }
            StreamEvent::TextDone { .. } => {
                if self.policy == FinalizePolicy::OnTextDone {
                    self.open_closing_stage();
                }
            }
            StreamEvent::Completed { .. } => {
                self.store.update_stage_status(PLANNING, StageStatus::Completed);
                self.open_closing_stage();
                self.store
                    .update_stage_status(self.closing_stage(), StageStatus::Completed);
            }
            StreamEvent::InProgress | StreamEvent::Other { .. } => {}
        }
    }

    fn tool(&mut self, name: &str, phase: ToolPhase) {
        if phase.is_running() {
            self.store.add_stage(name);
            self.store.update_stage_status(name, StageStatus::InProgress);
        } else {
            self.store.update_stage_status(name, StageStatus::Completed);
            if self.finished_tools.insert(name.to_string()) {
                tracing::debug!("Tool '{}' finished", name);
            }
        }
    }

    fn open_closing_stage(&mut self) {
        if self.closing_added {
            return;
        }
        let stage = self.closing_stage();
        self.store.add_stage(stage);
        self.store.update_stage_status(stage, StageStatus::InProgress);
        self.closing_added = true;
    }
}
