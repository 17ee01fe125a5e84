//! Drives one streamed call from request to terminal result

use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use snowball_ai::{Frame, StreamEvent, stream::frames};
use tokio_util::sync::CancellationToken;

use crate::{
    accumulator::ResponseAccumulator,
    error::{Error, Result},
    operation::{OperationResult, OperationSpec},
    progress::ProgressStore,
    tracker::StageTracker,
    transport::Transport,
};

/// Default wait for the next body chunk before a call counts as stalled
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Receives the visible output of a call.
///
/// Exactly one of `on_complete` and `on_error` is called per call, after
/// any number of `on_delta` calls.
pub trait CallHandler: Send {
    /// Full text so far (not just the new piece)
    fn on_delta(&mut self, text: &str);
    fn on_complete(&mut self, result: &OperationResult, correlation_id: Option<&str>);
    fn on_error(&mut self, message: &str);
}

/// Successful end of a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    pub result: OperationResult,
    /// Id from `response.completed`, if the gateway sent one
    pub correlation_id: Option<String>,
}

/// Runs calls against a transport, reporting stages to a store
#[derive(Clone)]
pub struct CallDriver {
    transport: Arc<dyn Transport>,
    store: Arc<dyn ProgressStore>,
    idle_timeout: Option<Duration>,
}

impl CallDriver {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn ProgressStore>) -> Self {
        Self {
            transport,
            store,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
        }
    }

    /// Set the idle timeout; `None` waits forever
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn ProgressStore> {
        &self.store
    }

    /// Run one call and notify `handler` of its outcome.
    ///
    /// Stages from the previous call are cleared first. The outcome is also
    /// returned so the caller can update session state.
    pub async fn run(
        &self,
        spec: &OperationSpec,
        input: &str,
        previous_response_id: Option<&str>,
        handler: &mut dyn CallHandler,
        cancel: CancellationToken,
    ) -> Result<CallOutcome> {
        self.store.clear_stages();

        let outcome = self
            .drive(spec, input, previous_response_id, handler, &cancel)
            .await;

        match &outcome {
            Ok(outcome) => {
                tracing::debug!(
                    operation = spec.kind.as_str(),
                    correlation_id = ?outcome.correlation_id,
                    "Call completed"
                );
                handler.on_complete(&outcome.result, outcome.correlation_id.as_deref());
            }
            Err(e) => {
                tracing::warn!(operation = spec.kind.as_str(), "Call failed: {}", e);
                handler.on_error(&e.user_message(spec));
            }
        }

        outcome
    }

    async fn drive(
        &self,
        spec: &OperationSpec,
        input: &str,
        previous_response_id: Option<&str>,
        handler: &mut dyn CallHandler,
        cancel: &CancellationToken,
    ) -> Result<CallOutcome> {
        let request = spec.build_request(input, previous_response_id);

        let chunks = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(snowball_ai::Error::Aborted.into()),
            opened = self.transport.open(&request, spec.api_key.as_deref()) => opened?,
        };

        let mut frames = frames(chunks, self.idle_timeout);
        let mut tracker = StageTracker::new(self.store.as_ref(), spec.finalize);
        let mut accumulator = ResponseAccumulator::new(spec);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(snowball_ai::Error::Aborted.into()),
                next = frames.next() => next,
            };

            let Some(frame) = next else {
                return Err(snowball_ai::Error::UnexpectedEnd.into());
            };

            let event = match frame? {
                Frame::Announce(event_type) => {
                    tracker.observe_announce(&event_type);
                    continue;
                }
                Frame::Event(event) => event,
            };

            tracing::debug!(?event, "Stream event");
            tracker.observe(&event);

            match event {
                StreamEvent::TextDelta { delta } => {
                    if let Some(text) = accumulator.push_delta(&delta) {
                        handler.on_delta(&text);
                    }
                }
                StreamEvent::TextDone { text } => {
                    if let Some(text) = accumulator.push_done(&text)? {
                        handler.on_delta(&text);
                    }
                }
                StreamEvent::Completed { response_id } => {
                    let (result, final_text) = accumulator.finish()?;
                    if let Some(text) = final_text {
                        handler.on_delta(&text);
                    }
                    return Ok(CallOutcome {
                        result,
                        correlation_id: response_id,
                    });
                }
                _ => {}
            }
        }
    }
}
