//! Scripted transports and recording handlers for unit tests

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use snowball_ai::{ChunkStream, ResponsesRequest};

use crate::{
    call::CallHandler,
    operation::OperationResult,
    transport::Transport,
};

/// Format one `data:` frame
pub(crate) fn sse(json: &str) -> String {
    format!("data: {}\n\n", json)
}

/// What the scripted gateway does for one call
pub(crate) enum Reply {
    /// Send these chunks, then end the body
    Chunks(Vec<String>),
    /// Send these chunks, then stall forever
    Hang(Vec<String>),
    /// Reject the call with this status
    Status(u16),
}

impl Reply {
    pub(crate) fn chunks(chunks: Vec<String>) -> Self {
        Reply::Chunks(chunks)
    }

    pub(crate) fn hang(chunks: Vec<String>) -> Self {
        Reply::Hang(chunks)
    }
}

fn body(chunks: Vec<String>) -> impl futures::Stream<Item = snowball_ai::Result<Bytes>> + Send {
    futures::stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from(c))))
}

/// Transport that replays canned replies and records every request
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<(ResponsesRequest, Option<String>)>>,
}

impl ScriptedTransport {
    pub(crate) fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, with the API key each was sent with
    pub(crate) fn requests(&self) -> Vec<(ResponsesRequest, Option<String>)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(
        &self,
        request: &ResponsesRequest,
        api_key: Option<&str>,
    ) -> snowball_ai::Result<ChunkStream> {
        self.requests
            .lock()
            .push((request.clone(), api_key.map(str::to_string)));

        let reply = self.replies.lock().pop_front();
        match reply {
            Some(Reply::Chunks(chunks)) => Ok(Box::pin(body(chunks))),
            Some(Reply::Hang(chunks)) => Ok(Box::pin(body(chunks).chain(futures::stream::pending()))),
            Some(Reply::Status(status)) => Err(snowball_ai::Error::Status {
                status,
                body: String::new(),
            }),
            None => Err(snowball_ai::Error::MissingBody),
        }
    }
}

/// Handler that keeps everything it is told
#[derive(Default)]
pub(crate) struct RecordingHandler {
    pub(crate) deltas: Vec<String>,
    pub(crate) completes: Vec<(OperationResult, Option<String>)>,
    pub(crate) errors: Vec<String>,
}

impl CallHandler for RecordingHandler {
    fn on_delta(&mut self, text: &str) {
        self.deltas.push(text.to_string());
    }

    fn on_complete(&mut self, result: &OperationResult, correlation_id: Option<&str>) {
        self.completes
            .push((result.clone(), correlation_id.map(str::to_string)));
    }

    fn on_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}
