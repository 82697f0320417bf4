//! Serde shapes for one line of a Claude Code session transcript.
//!
//! Fields whose type varies between transcript versions are kept as raw
//! [`Value`]s so a surprising shape drops one field instead of the record.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum TranscriptRecord {
    User(MessageRecord),
    Assistant(MessageRecord),
    ToolResult(ToolResultRecord),
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageRecord {
    #[serde(default, rename = "sessionId", alias = "session_id")]
    pub session_id: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    #[serde(default)]
    pub content: Option<MessageContent>,
    #[serde(default)]
    pub model: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MessageContent {
    Text(String),
    Blocks(Vec<Value>),
    Other(Value),
}

/// A block within a message's content array. Blocks are decoded one at a time
/// so that one odd block does not discard its siblings.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ContentBlock {
    Text {
        #[serde(default)]
        text: Option<String>,
    },
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        input: Option<Value>,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: Option<String>,
        #[serde(default)]
        content: Option<Value>,
    },
    #[serde(other)]
    Other,
}

impl ContentBlock {
    pub fn decode(raw: &Value) -> Option<Self> {
        Self::deserialize(raw).ok()
    }
}

/// Standalone tool-result record written by older transcript formats.
#[derive(Debug, Deserialize)]
pub(crate) struct ToolResultRecord {
    #[serde(default, rename = "sessionId", alias = "session_id")]
    pub session_id: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub tool_name: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
}

impl ToolResultRecord {
    /// `result.stdout`, falling back to `result.output`.
    pub fn output(&self) -> Option<&str> {
        let result = self.result.as_ref()?;
        result
            .get("stdout")
            .and_then(Value::as_str)
            .or_else(|| result.get("output").and_then(Value::as_str))
    }
}
