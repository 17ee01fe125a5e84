//! Line classification and the chunk → frame pipeline

use std::{pin::Pin, time::Duration};

use async_stream::stream;
use bytes::Bytes;
use futures::StreamExt;
use tokio_stream::Stream;

use crate::{
    error::{Error, Result},
    event::{EventType, StreamEvent},
    framer::LineFramer,
};

/// Raw body chunks as the network delivers them
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Decoded frames; an `Err` item ends the stream
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame>> + Send>>;

/// What a single SSE line carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// `event:` announcement with its bare type string
    Event(&'a str),
    /// `data:` payload
    Data(&'a str),
    /// Blank lines, `:` comments, unknown fields
    Ignored,
}

impl<'a> SseLine<'a> {
    /// Classify one complete line
    pub fn classify(line: &'a str) -> Self {
        if let Some(rest) = line.strip_prefix("event:") {
            return SseLine::Event(rest.trim());
        }
        if let Some(rest) = line.strip_prefix("data:") {
            return SseLine::Data(rest.strip_prefix(' ').unwrap_or(rest));
        }
        SseLine::Ignored
    }
}

/// One decoded unit of the event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Type announced on an `event:` line. Only tool lifecycle
    /// transitions are acted on; the paired `data:` line may repeat them.
    Announce(EventType),
    /// A well-formed `data:` payload
    Event(StreamEvent),
}

/// Decode one complete line into a frame.
///
/// Malformed `data:` payloads are logged and dropped; they never end the
/// stream.
pub fn decode_line(line: &str) -> Option<Frame> {
    match SseLine::classify(line) {
        SseLine::Event(event_type) if !event_type.is_empty() => {
            Some(Frame::Announce(EventType::parse(event_type)))
        }
        SseLine::Data(payload) => {
            let payload = payload.trim_end();
            if payload.is_empty() || payload == "[DONE]" {
                return None;
            }
            match StreamEvent::decode(payload) {
                Ok(event) => Some(Frame::Event(event)),
                Err(e) => {
                    tracing::warn!("Skipping malformed data frame: {}", e);
                    None
                }
            }
        }
        _ => None,
    }
}

/// Turn a chunk stream into a frame stream.
///
/// With `idle_timeout` set, waiting longer than that for the next chunk ends
/// the stream with [`Error::IdleTimeout`]. A chunk error is forwarded and ends
/// the stream.
pub fn frames(mut chunks: ChunkStream, idle_timeout: Option<Duration>) -> FrameStream {
    Box::pin(stream! {
        let mut framer = LineFramer::new();

        loop {
            let next = match idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, chunks.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        yield Err(Error::IdleTimeout(limit));
                        return;
                    }
                },
                None => chunks.next().await,
            };

            let Some(chunk) = next else { break };

            match chunk {
                Ok(bytes) => {
                    for line in framer.push(&bytes) {
                        if let Some(frame) = decode_line(&line) {
                            yield Ok(frame);
                        }
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        if let Some(line) = framer.finish() {
            if let Some(frame) = decode_line(&line) {
                yield Ok(frame);
            }
        }
    })
}
