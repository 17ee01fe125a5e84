//! Phase router: picks the operation for a turn and moves the journey forward

use std::sync::Arc;

use crate::{
    call::{CallDriver, CallHandler},
    error::{Error, Result},
    handle::RouterHandle,
    image::FALLBACK_IMAGE_URL,
    operation::{OperationKind, OperationResult, Operations},
    progress::ProgressStore,
    session::{ChatSession, Phase, Role},
    transport::Transport,
};

/// Reply in the pay phase when the input does not look like a payment id
pub const PAYMENT_PROMPT: &str = "Please complete your payment and paste the payment ID (starting with \"pay_\") here to confirm your order.";

/// Reply once the order is confirmed
pub const THANK_YOU_MESSAGE: &str =
    "Thank you for shopping with SnowballShop! Is there anything else I can help you find today?";

/// Reply when a scene call ends without reaching the select stage
pub const SCENE_NOT_READY_MESSAGE: &str =
    "I couldn't finish the scene this time. Try describing the setting another way.";

/// Default length above which pay-phase input is treated as a payment id
pub const DEFAULT_TRANSACTION_THRESHOLD: usize = 20;

/// Default checkout link shown after a scene is ready
pub const DEFAULT_CHECKOUT_URL: &str = "https://checkout.razorpay.com/demo";

/// Router settings that are not part of an operation
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Pay-phase input longer than this many characters is sent upstream
    pub transaction_threshold: usize,
    pub checkout_url: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            transaction_threshold: DEFAULT_TRANSACTION_THRESHOLD,
            checkout_url: DEFAULT_CHECKOUT_URL.to_string(),
        }
    }
}

/// What a turn did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// An upstream call completed
    Completed {
        operation: OperationKind,
        result: OperationResult,
        /// Phase entered because of this result
        advanced_to: Option<Phase>,
    },
    /// Answered locally without an upstream call
    Canned(String),
    /// The upstream call failed; the message was shown to the user
    Failed {
        operation: OperationKind,
        message: String,
    },
}

/// Whether pay-phase input should be sent for payment lookup
pub fn looks_like_payment(input: &str, threshold: usize) -> bool {
    let lower = input.to_lowercase();
    lower.contains("pay") || lower.contains("transaction") || input.chars().count() > threshold
}

/// Input for the scene call
pub fn scene_input(input: &str, image_url: &str) -> String {
    format!("{} append image of object: {}", input, image_url)
}

/// Follow-up message offering checkout
pub fn payment_call_to_action(checkout_url: &str) -> String {
    format!(
        "Ready to proceed with payment?\n\n[**Pay Now**]({}) 💳\n\n{}",
        checkout_url, PAYMENT_PROMPT
    )
}

/// Forwards call output to the caller while mirroring it into the session
struct SessionMirror<'a> {
    session: &'a mut ChatSession,
    inner: &'a mut dyn CallHandler,
}

impl CallHandler for SessionMirror<'_> {
    fn on_delta(&mut self, text: &str) {
        self.session.stream_to_last(text);
        self.inner.on_delta(text);
    }

    fn on_complete(&mut self, result: &OperationResult, correlation_id: Option<&str>) {
        self.inner.on_complete(result, correlation_id);
    }

    fn on_error(&mut self, message: &str) {
        self.session.update_last_message(message);
        self.inner.on_error(message);
    }
}

/// Routes user turns to upstream operations according to the session phase
pub struct PhaseRouter {
    driver: CallDriver,
    operations: Operations,
    config: RouterConfig,
    handle: RouterHandle,
}

impl PhaseRouter {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn ProgressStore>) -> Self {
        Self {
            driver: CallDriver::new(transport, store),
            operations: Operations::default(),
            config: RouterConfig::default(),
            handle: RouterHandle::new(),
        }
    }

    pub fn with_operations(mut self, operations: Operations) -> Self {
        self.operations = operations;
        self
    }

    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Option<std::time::Duration>) -> Self {
        self.driver = self.driver.with_idle_timeout(idle_timeout);
        self
    }

    /// Handle for aborting the active call from elsewhere
    pub fn handle(&self) -> RouterHandle {
        self.handle.clone()
    }

    pub fn operations(&self) -> &Operations {
        &self.operations
    }

    pub fn store(&self) -> &Arc<dyn ProgressStore> {
        self.driver.store()
    }

    /// Handle one user turn.
    ///
    /// Records the user message, then either answers locally or runs the
    /// phase's operation. Call failures are reported through `handler` and
    /// returned as [`TurnOutcome::Failed`]; only a busy session is an `Err`.
    pub async fn handle_input(
        &self,
        session: &mut ChatSession,
        input: &str,
        handler: &mut dyn CallHandler,
    ) -> Result<TurnOutcome> {
        if session.is_in_flight() {
            return Err(Error::Busy);
        }
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::Other("Input is empty".to_string()));
        }

        session.add_message(Role::User, input);

        let (kind, call_input) = match session.phase() {
            Phase::Search => (OperationKind::Search, input.to_string()),
            Phase::Select => {
                let image_url = session.image_url().unwrap_or(FALLBACK_IMAGE_URL);
                (OperationKind::Scene, scene_input(input, image_url))
            }
            Phase::Pay => {
                if !looks_like_payment(input, self.config.transaction_threshold) {
                    return Ok(Self::canned(session, PAYMENT_PROMPT));
                }
                (OperationKind::Payment, input.to_string())
            }
            Phase::Confirm => return Ok(Self::canned(session, THANK_YOU_MESSAGE)),
        };

        self.run_operation(session, kind, &call_input, handler).await
    }

    fn canned(session: &mut ChatSession, message: &str) -> TurnOutcome {
        session.add_message(Role::Assistant, message);
        TurnOutcome::Canned(message.to_string())
    }

    async fn run_operation(
        &self,
        session: &mut ChatSession,
        kind: OperationKind,
        input: &str,
        handler: &mut dyn CallHandler,
    ) -> Result<TurnOutcome> {
        let spec = self.operations.get(kind);
        let previous = session.correlation_id().map(str::to_string);

        session.begin_call()?;
        session.begin_assistant_message();
        let cancel = self.handle.begin();

        tracing::debug!(
            operation = kind.as_str(),
            phase = session.phase().as_str(),
            "Starting call"
        );

        let outcome = {
            let mut mirror = SessionMirror {
                session: &mut *session,
                inner: &mut *handler,
            };
            self.driver
                .run(spec, input, previous.as_deref(), &mut mirror, cancel)
                .await
        };

        self.handle.finish();
        session.end_call();

        match outcome {
            Ok(outcome) => {
                session.set_correlation_id(outcome.correlation_id);
                let advanced_to = self.apply_result(session, &outcome.result);
                Ok(TurnOutcome::Completed {
                    operation: kind,
                    result: outcome.result,
                    advanced_to,
                })
            }
            Err(e) => Ok(TurnOutcome::Failed {
                operation: kind,
                message: e.user_message(spec),
            }),
        }
    }

    /// Write the result into the session and advance the phase when its
    /// gate is met. A mismatch leaves the phase as it is.
    fn apply_result(&self, session: &mut ChatSession, result: &OperationResult) -> Option<Phase> {
        match result {
            OperationResult::Search {
                details, image_url, ..
            } => {
                session.update_last_message(details.as_str());
                session.set_image_url(image_url.as_str());
            }
            OperationResult::Scene {
                situation_description,
                image_url,
                ..
            } => {
                session.update_last_message(format!(
                    "{}\n\n![Scene]({})",
                    situation_description, image_url
                ));
            }
            OperationResult::Payment { order_details, .. } => {
                session.update_last_message(order_details.as_str());
            }
        }

        let (gate, next) = session.phase().transition()?;
        if result.completed_stage() != gate {
            tracing::info!(
                "Stage '{}' does not unlock {}, staying in {}",
                result.completed_stage(),
                next.as_str(),
                session.phase().as_str()
            );
            if matches!(result, OperationResult::Scene { .. }) {
                session.add_message(Role::Assistant, SCENE_NOT_READY_MESSAGE);
            }
            return None;
        }

        session.advance_to(next);
        if next == Phase::Pay {
            session.add_message(
                Role::Assistant,
                payment_call_to_action(&self.config.checkout_url),
            );
        }
        Some(next)
    }
}
