//! Gateway event vocabulary and `data:` payload decoding

use serde::Deserialize;

use crate::error::Result;

/// Segments that name gateway lifecycle events and can never be a tool name.
const RESERVED_SEGMENTS: &[&str] = &["created", "output_item", "output_text", "completed"];

/// Lifecycle step of a tool call as announced by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolPhase {
    /// `response.<tool>.in_progress`
    Started,
    /// `response.<tool>.executing`
    Executing,
    /// `response.<tool>.completed`
    Finished,
}

impl ToolPhase {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "in_progress" => Some(ToolPhase::Started),
            "executing" => Some(ToolPhase::Executing),
            "completed" => Some(ToolPhase::Finished),
            _ => None,
        }
    }

    /// Whether the tool is still running
    pub fn is_running(&self) -> bool {
        matches!(self, ToolPhase::Started | ToolPhase::Executing)
    }
}

/// Structured form of a dot-delimited event type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    /// `response.created`
    Created,
    /// `response.in_progress`
    InProgress,
    /// `response.output_item.added`
    OutputItemAdded,
    /// `response.output_text.delta`
    OutputTextDelta,
    /// `response.output_text.done`
    OutputTextDone,
    /// `response.completed` (terminal)
    Completed,
    /// `response.<name>.(in_progress|executing|completed)`
    Tool { name: String, phase: ToolPhase },
    /// Anything else, kept verbatim
    Other(String),
}

impl EventType {
    /// Decode an event type string.
    ///
    /// The terminal `response.completed` is matched before the generic
    /// three-segment tool pattern, so it is never read as a tool named
    /// "completed".
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let segments: Vec<&str> = raw.split('.').collect();

        match segments.as_slice() {
            ["response", "created"] => EventType::Created,
            ["response", "in_progress"] => EventType::InProgress,
            ["response", "completed"] => EventType::Completed,
            ["response", "output_item", "added"] => EventType::OutputItemAdded,
            ["response", "output_text", "delta"] => EventType::OutputTextDelta,
            ["response", "output_text", "done"] => EventType::OutputTextDone,
            ["response", name, suffix]
                if !name.is_empty() && !RESERVED_SEGMENTS.contains(name) =>
            {
                match ToolPhase::from_suffix(suffix) {
                    Some(phase) => EventType::Tool {
                        name: (*name).to_string(),
                        phase,
                    },
                    None => EventType::Other(raw.to_string()),
                }
            }
            _ => EventType::Other(raw.to_string()),
        }
    }

    /// Tool name and phase, if this is a tool lifecycle event
    pub fn tool(&self) -> Option<(&str, ToolPhase)> {
        match self {
            EventType::Tool { name, phase } => Some((name.as_str(), *phase)),
            _ => None,
        }
    }

    /// Check if this is the terminal event
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventType::Completed)
    }
}

/// A decoded `data:` frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The gateway accepted the request
    Created,
    /// The gateway is working on the response
    InProgress,
    /// First output item was added (planning is over)
    OutputItemAdded,
    /// Incremental output text
    TextDelta { delta: String },
    /// A finished output text segment
    TextDone { text: String },
    /// Tool lifecycle transition
    Tool { name: String, phase: ToolPhase },
    /// Terminal event; carries the correlation id when present
    Completed { response_id: Option<String> },
    /// Recognised JSON with a type we do not act on
    Other { event_type: String },
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    delta: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    response: Option<RawResponse>,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    id: Option<String>,
}

impl StreamEvent {
    /// Decode the JSON payload of a `data:` line.
    ///
    /// Fails on invalid JSON and on documents without a string `type`;
    /// callers skip such frames.
    pub fn decode(data: &str) -> Result<Self> {
        let raw: RawEvent = serde_json::from_str(data)?;

        Ok(match EventType::parse(&raw.event_type) {
            EventType::Created => StreamEvent::Created,
            EventType::InProgress => StreamEvent::InProgress,
            EventType::OutputItemAdded => StreamEvent::OutputItemAdded,
            EventType::OutputTextDelta => StreamEvent::TextDelta {
                delta: raw.delta.unwrap_or_default(),
            },
            EventType::OutputTextDone => StreamEvent::TextDone {
                text: raw.text.unwrap_or_default(),
            },
            EventType::Completed => StreamEvent::Completed {
                response_id: raw.response.and_then(|r| r.id),
            },
            EventType::Tool { name, phase } => StreamEvent::Tool { name, phase },
            EventType::Other(event_type) => StreamEvent::Other { event_type },
        })
    }

    /// Check if this is the terminal event
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lifecycle_types() {
        assert_eq!(EventType::parse("response.created"), EventType::Created);
        assert_eq!(EventType::parse("response.in_progress"), EventType::InProgress);
        assert_eq!(
            EventType::parse("response.output_item.added"),
            EventType::OutputItemAdded
        );
        assert_eq!(
            EventType::parse("response.output_text.delta"),
            EventType::OutputTextDelta
        );
        assert_eq!(
            EventType::parse("response.output_text.done"),
            EventType::OutputTextDone
        );
        assert_eq!(EventType::parse(" response.completed "), EventType::Completed);
    }

    #[test]
    fn test_completed_is_never_a_tool() {
        let parsed = EventType::parse("response.completed");
        assert!(parsed.is_terminal());
        assert_eq!(parsed.tool(), None);
    }

    #[test]
    fn test_parse_tool_phases() {
        assert_eq!(
            EventType::parse("response.shopify_search_shop_catalog.in_progress").tool(),
            Some(("shopify_search_shop_catalog", ToolPhase::Started))
        );
        assert_eq!(
            EventType::parse("response.razorpay_fetch_payment.executing").tool(),
            Some(("razorpay_fetch_payment", ToolPhase::Executing))
        );
        assert_eq!(
            EventType::parse("response.razorpay_fetch_order.completed").tool(),
            Some(("razorpay_fetch_order", ToolPhase::Finished))
        );
    }

    #[test]
    fn test_reserved_segments_are_not_tools() {
        for raw in [
            "response.created.completed",
            "response.output_item.in_progress",
            "response.output_text.completed",
            "response.completed.executing",
        ] {
            assert_eq!(EventType::parse(raw), EventType::Other(raw.to_string()), "{}", raw);
        }
    }

    #[test]
    fn test_unknown_shapes_are_other() {
        for raw in [
            "response.output_item.done",
            "response.mcp_call.arguments.delta",
            "response..completed",
            "session.created",
            "",
        ] {
            assert!(matches!(EventType::parse(raw), EventType::Other(_)), "{}", raw);
        }
    }

    #[test]
    fn test_decode_delta() {
        let event = StreamEvent::decode(
            r#"{"type":"response.output_text.delta","delta":"Found ","item_id":"msg_1","output_index":0}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            StreamEvent::TextDelta {
                delta: "Found ".into()
            }
        );
    }

    #[test]
    fn test_decode_done() {
        let event =
            StreamEvent::decode(r#"{"type":"response.output_text.done","text":"{\"a\":1}"}"#)
                .unwrap();
        assert_eq!(
            event,
            StreamEvent::TextDone {
                text: r#"{"a":1}"#.into()
            }
        );
    }

    #[test]
    fn test_decode_completed_with_id() {
        let event = StreamEvent::decode(
            r#"{"type":"response.completed","response":{"id":"resp_1","status":"completed"}}"#,
        )
        .unwrap();
        assert!(event.is_terminal());
        assert_eq!(
            event,
            StreamEvent::Completed {
                response_id: Some("resp_1".into())
            }
        );
    }

    #[test]
    fn test_decode_completed_without_response() {
        let event = StreamEvent::decode(r#"{"type":"response.completed"}"#).unwrap();
        assert_eq!(event, StreamEvent::Completed { response_id: None });
    }

    #[test]
    fn test_decode_tool_event() {
        let event =
            StreamEvent::decode(r#"{"type":"response.img_scene_generator.completed"}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Tool {
                name: "img_scene_generator".into(),
                phase: ToolPhase::Finished
            }
        );
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(StreamEvent::decode(r#"{"type":"response.output_text.delta","delta":"#).is_err());
        assert!(StreamEvent::decode("[DONE]").is_err());
    }

    #[test]
    fn test_decode_rejects_missing_type() {
        assert!(StreamEvent::decode(r#"{"delta":"orphan"}"#).is_err());
        assert!(StreamEvent::decode(r#"{"type":42}"#).is_err());
    }
}
