use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// What produced a conversation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    User,
    Assistant,
    /// The assistant invoked a tool. `content` holds the primary argument.
    ToolUse,
    /// Output captured from a tool run.
    ToolResult,
}

impl EventKind {
    pub fn is_tool(&self) -> bool {
        matches!(self, EventKind::ToolUse | EventKind::ToolResult)
    }
}

/// One atomic occurrence in a session transcript.
///
/// Events are built once by the transcript parser and never mutated afterwards;
/// the aggregator produces redacted copies via [`Event::map_content`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
    pub kind: EventKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Event {
    pub fn user(timestamp: Option<OffsetDateTime>, content: impl Into<String>) -> Self {
        Self {
            timestamp,
            kind: EventKind::User,
            content: content.into(),
            tool_name: None,
        }
    }

    pub fn assistant(timestamp: Option<OffsetDateTime>, content: impl Into<String>) -> Self {
        Self {
            timestamp,
            kind: EventKind::Assistant,
            content: content.into(),
            tool_name: None,
        }
    }

    pub fn tool_use(
        timestamp: Option<OffsetDateTime>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            kind: EventKind::ToolUse,
            content: content.into(),
            tool_name: Some(tool_name.into()),
        }
    }

    pub fn tool_result(
        timestamp: Option<OffsetDateTime>,
        tool_name: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            kind: EventKind::ToolResult,
            content: content.into(),
            tool_name,
        }
    }

    /// Return a copy with `content` transformed, all other fields unchanged.
    pub fn map_content(&self, f: impl FnOnce(&str) -> String) -> Self {
        Self {
            content: f(&self.content),
            ..self.clone()
        }
    }
}

/// Stable chronological sort. Events without a timestamp sort first; ties keep
/// their original order.
pub fn sort_chronologically(events: &mut [Event]) {
    events.sort_by_key(|e| e.timestamp);
}
