//! snowball-agent: shopping journey runtime
//!
//! This crate drives one streamed gateway call at a time, derives progress
//! stages from its events, assembles the result and moves the chat through
//! the search → select → pay → confirm phases.

pub mod accumulator;
pub mod call;
pub mod error;
pub mod handle;
pub mod image;
pub mod operation;
pub mod progress;
pub mod router;
pub mod session;
pub mod tracker;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use accumulator::ResponseAccumulator;
pub use call::{CallDriver, CallHandler, CallOutcome, DEFAULT_IDLE_TIMEOUT};
pub use error::{Error, Result};
pub use handle::RouterHandle;
pub use operation::{OperationKind, OperationResult, OperationSpec, Operations, ScenePayload};
pub use progress::{ProgressBoard, ProgressStage, ProgressStore, StageStatus};
pub use router::{PhaseRouter, RouterConfig, TurnOutcome};
pub use session::{ChatMessage, ChatSession, Phase, PhaseStatus, Role};
pub use tracker::StageTracker;
pub use transport::{HttpTransport, Transport};
