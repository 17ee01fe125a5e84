//! Chat session state: messages, phase, correlation id

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

pub const WELCOME_MESSAGE: &str = "Welcome to **SnowballShop**! 🛍️ I'm here to help you find the perfect product. What are you looking for today?";
pub const WELCOME_BACK_MESSAGE: &str =
    "Welcome back to **SnowballShop**! 🛍️ What would you like to find today?";

/// Step of the shopping journey
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Search,
    Select,
    Pay,
    Confirm,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Search, Phase::Select, Phase::Pay, Phase::Confirm];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Search => "search",
            Phase::Select => "select",
            Phase::Pay => "pay",
            Phase::Confirm => "confirm",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Search => "Search",
            Phase::Select => "Select",
            Phase::Pay => "Pay",
            Phase::Confirm => "Confirm",
        }
    }

    /// Next phase and the `completedStage` value that unlocks it
    pub fn transition(&self) -> Option<(&'static str, Phase)> {
        match self {
            Phase::Search => Some(("search", Phase::Select)),
            Phase::Select => Some(("select", Phase::Pay)),
            Phase::Pay => Some(("confirm", Phase::Confirm)),
            Phase::Confirm => None,
        }
    }
}

/// How a phase relates to the current one in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    Completed,
    Active,
    Upcoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Still receiving deltas
    #[serde(default)]
    pub streaming: bool,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            streaming: false,
        }
    }
}

/// In-memory state of one shopping conversation
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    phase: Phase,
    correlation_id: Option<String>,
    image_url: Option<String>,
    in_flight: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// New session seeded with the welcome message
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(Role::Assistant, WELCOME_MESSAGE)],
            phase: Phase::Search,
            correlation_id: None,
            image_url: None,
            in_flight: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Image of the product picked during search
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Append a message and return its id
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) -> Uuid {
        let message = ChatMessage::new(role, content);
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// Append an empty assistant message that deltas will fill
    pub fn begin_assistant_message(&mut self) -> Uuid {
        let mut message = ChatMessage::new(Role::Assistant, String::new());
        message.streaming = true;
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// Replace the content of the last message if it is from the assistant.
    /// The message stops streaming.
    pub fn update_last_message(&mut self, content: impl Into<String>) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => {
                last.content = content.into();
                last.streaming = false;
                true
            }
            _ => false,
        }
    }

    /// Show partial text in the last assistant message while it streams
    pub(crate) fn stream_to_last(&mut self, content: &str) {
        if let Some(last) = self.messages.last_mut() {
            if last.role == Role::Assistant && last.streaming {
                last.content.clear();
                last.content.push_str(content);
            }
        }
    }

    /// Header entries: every phase with its status relative to the current one
    pub fn phase_header(&self) -> Vec<(Phase, PhaseStatus)> {
        Phase::ALL
            .iter()
            .map(|&phase| {
                let status = match phase.cmp(&self.phase) {
                    std::cmp::Ordering::Less => PhaseStatus::Completed,
                    std::cmp::Ordering::Equal => PhaseStatus::Active,
                    std::cmp::Ordering::Greater => PhaseStatus::Upcoming,
                };
                (phase, status)
            })
            .collect()
    }

    /// Reset to a fresh journey
    pub fn start_over(&mut self) {
        self.messages = vec![ChatMessage::new(Role::Assistant, WELCOME_BACK_MESSAGE)];
        self.phase = Phase::Search;
        self.correlation_id = None;
        self.image_url = None;
        self.in_flight = false;
    }

    pub(crate) fn begin_call(&mut self) -> Result<()> {
        if self.in_flight {
            return Err(Error::Busy);
        }
        self.in_flight = true;
        Ok(())
    }

    pub(crate) fn end_call(&mut self) {
        self.in_flight = false;
    }

    /// Advance one phase forward. Only the router moves phases.
    pub(crate) fn advance_to(&mut self, phase: Phase) {
        if phase > self.phase {
            tracing::info!("Phase {} -> {}", self.phase.as_str(), phase.as_str());
            self.phase = phase;
        }
    }

    pub(crate) fn set_correlation_id(&mut self, id: Option<String>) {
        if let Some(id) = id {
            self.correlation_id = Some(id);
        }
    }

    pub(crate) fn set_image_url(&mut self, url: impl Into<String>) {
        self.image_url = Some(url.into());
    }
}
