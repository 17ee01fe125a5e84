//! Progress stages shown beside the chat while a call streams

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stage name for the model's planning step
pub const PLANNING: &str = "Planning";
/// Stage name for text generation after tools have run
pub const FINALIZING: &str = "Finalizing Response";
/// Stage name for structured payload handling
pub const PROCESSING: &str = "Processing Response";

/// Status of a stage. Ordered: a stage only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    InProgress,
    Completed,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::InProgress => "in_progress",
            StageStatus::Completed => "completed",
        }
    }
}

/// One named step of the current call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStage {
    pub id: Uuid,
    pub name: String,
    pub status: StageStatus,
    /// Last time the status changed
    pub timestamp: DateTime<Utc>,
}

impl ProgressStage {
    fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: StageStatus::Pending,
            timestamp: Utc::now(),
        }
    }
}

/// Sink for stage updates.
///
/// Implementations must make `add_stage` idempotent: adding a name that
/// already exists leaves its status untouched.
pub trait ProgressStore: Send + Sync {
    fn add_stage(&self, name: &str);
    fn update_stage_status(&self, name: &str, status: StageStatus);
    fn clear_stages(&self);
}

/// In-memory stage board shared between the router and a renderer.
///
/// Cloning is cheap; all clones see the same stages.
#[derive(Debug, Clone, Default)]
pub struct ProgressBoard {
    stages: Arc<Mutex<Vec<ProgressStage>>>,
}

impl ProgressBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current stages in insertion order
    pub fn snapshot(&self) -> Vec<ProgressStage> {
        self.stages.lock().clone()
    }

    /// Status of a named stage
    pub fn status(&self, name: &str) -> Option<StageStatus> {
        self.stages
            .lock()
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.status)
    }

    pub fn is_empty(&self) -> bool {
        self.stages.lock().is_empty()
    }
}

impl ProgressStore for ProgressBoard {
    fn add_stage(&self, name: &str) {
        let mut stages = self.stages.lock();
        if stages.iter().any(|s| s.name == name) {
            return;
        }
        stages.push(ProgressStage::new(name));
    }

    fn update_stage_status(&self, name: &str, status: StageStatus) {
        let mut stages = self.stages.lock();
        let Some(stage) = stages.iter_mut().find(|s| s.name == name) else {
            tracing::debug!("Status update for unknown stage '{}'", name);
            return;
        };
        if status <= stage.status {
            return;
        }
        stage.status = status;
        stage.timestamp = Utc::now();
    }

    fn clear_stages(&self) {
        self.stages.lock().clear();
    }
}
