//! snowball-ai: streaming wire layer for the responses gateway
//!
//! This crate turns the raw `text/event-stream` body returned by an
//! OpenAI "responses"-style gateway into typed events. It knows nothing about
//! shopping phases or progress panels; that lives in `snowball-agent`.

pub mod error;
pub mod event;
pub mod framer;
pub mod providers;
pub mod stream;
pub mod types;

pub use error::{Error, Result};
pub use event::{EventType, StreamEvent, ToolPhase};
pub use framer::LineFramer;
pub use stream::{ChunkStream, Frame, FrameStream, SseLine};
pub use types::*;
