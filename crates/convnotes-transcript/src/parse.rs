use std::collections::HashMap;

use convnotes_core::{parse_rfc3339, Event};
use serde_json::Value;
use time::OffsetDateTime;

use crate::record::{ContentBlock, Message, MessageContent, MessageRecord, ToolResultRecord, TranscriptRecord};

/// Text Claude Code writes into the transcript when the user hits Escape.
pub const INTERRUPTION_MARKER: &str = "[Request interrupted by user";

/// Placeholder model name on synthetic assistant messages; not a real version.
const SYNTHETIC_MODEL: &str = "<synthetic>";

/// The model named by an assistant record, and when it was seen.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSighting {
    pub at: Option<OffsetDateTime>,
    pub model: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedTranscript {
    /// Events in file order.
    pub events: Vec<Event>,
    /// Latest parseable timestamp among records that passed the filters.
    pub last_event_time: Option<OffsetDateTime>,
    /// Most recent model name on an assistant record that passed the filters.
    pub model: Option<ModelSighting>,
}

/// Parse one JSONL transcript.
///
/// Lines that are not JSON objects with a recognised `type` are skipped.
/// Records carrying a session id other than `session_filter` are skipped.
/// Records timestamped strictly before `since` are skipped; records with a
/// missing or unparseable timestamp are kept.
pub fn parse_transcript(
    content: &str,
    session_filter: Option<&str>,
    since: Option<OffsetDateTime>,
) -> ParsedTranscript {
    let mut parser = Parser {
        session_filter: session_filter.filter(|s| !s.is_empty()),
        since,
        out: ParsedTranscript::default(),
        tool_names: HashMap::new(),
    };
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<TranscriptRecord>(line) {
            Ok(record) => parser.record(record),
            Err(e) => tracing::trace!(error = %e, "skipping unparseable transcript line"),
        }
    }
    parser.out
}

struct Parser<'a> {
    session_filter: Option<&'a str>,
    since: Option<OffsetDateTime>,
    out: ParsedTranscript,
    /// tool_use id -> tool name, for naming results in later user records.
    tool_names: HashMap<String, String>,
}

impl Parser<'_> {
    fn record(&mut self, record: TranscriptRecord) {
        match record {
            TranscriptRecord::User(m) => {
                if let Some(ts) = self.admit(&m.session_id, &m.timestamp) {
                    self.user(ts, m.message);
                }
            }
            TranscriptRecord::Assistant(m) => {
                if let Some(ts) = self.admit(&m.session_id, &m.timestamp) {
                    self.assistant(ts, m);
                }
            }
            TranscriptRecord::ToolResult(r) => {
                if let Some(ts) = self.admit(&r.session_id, &r.timestamp) {
                    self.standalone_result(ts, r);
                }
            }
            TranscriptRecord::Unrecognized => {}
        }
    }

    /// Apply the session and time filters. `None` means skip the record;
    /// `Some(ts)` carries the record's timestamp, itself possibly absent.
    fn admit(
        &mut self,
        session_id: &Option<Value>,
        timestamp: &Option<Value>,
    ) -> Option<Option<OffsetDateTime>> {
        if let Some(filter) = self.session_filter {
            if let Some(id) = session_id.as_ref().and_then(Value::as_str) {
                if id != filter {
                    return None;
                }
            }
        }
        let ts = timestamp
            .as_ref()
            .and_then(Value::as_str)
            .and_then(parse_rfc3339);
        if let (Some(ts), Some(since)) = (ts, self.since) {
            if ts < since {
                return None;
            }
        }
        if let Some(ts) = ts {
            if self.out.last_event_time.map_or(true, |last| ts > last) {
                self.out.last_event_time = Some(ts);
            }
        }
        Some(ts)
    }

    fn user(&mut self, ts: Option<OffsetDateTime>, message: Option<Message>) {
        let Some(content) = message.and_then(|m| m.content) else {
            return;
        };
        match content {
            MessageContent::Text(text) => self.user_text(ts, &text),
            MessageContent::Blocks(blocks) => {
                for raw in &blocks {
                    match ContentBlock::decode(raw) {
                        Some(ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                        }) => {
                            let name = tool_use_id.and_then(|id| self.tool_names.get(&id).cloned());
                            let text = content.as_ref().map(result_text).unwrap_or_default();
                            if !text.is_empty() {
                                self.out.events.push(Event::tool_result(ts, name, text));
                            }
                        }
                        _ => {
                            if let Some(text) = raw.get("text").and_then(Value::as_str) {
                                self.user_text(ts, text);
                            }
                        }
                    }
                }
            }
            MessageContent::Other(_) => {}
        }
    }

    fn user_text(&mut self, ts: Option<OffsetDateTime>, text: &str) {
        if text.is_empty() || text.contains(INTERRUPTION_MARKER) {
            return;
        }
        self.out.events.push(Event::user(ts, text));
    }

    fn assistant(&mut self, ts: Option<OffsetDateTime>, record: MessageRecord) {
        let Some(message) = record.message else {
            return;
        };
        if let Some(model) = message.model.as_ref().and_then(Value::as_str) {
            if !model.is_empty() && model != SYNTHETIC_MODEL {
                self.out.model = Some(ModelSighting {
                    at: ts,
                    model: model.to_string(),
                });
            }
        }
        match message.content {
            Some(MessageContent::Text(text)) if !text.is_empty() => {
                self.out.events.push(Event::assistant(ts, text));
            }
            Some(MessageContent::Blocks(blocks)) => {
                for raw in &blocks {
                    match ContentBlock::decode(raw) {
                        Some(ContentBlock::Text { text: Some(text) }) if !text.is_empty() => {
                            self.out.events.push(Event::assistant(ts, text));
                        }
                        Some(ContentBlock::ToolUse { id, name, input }) => {
                            let Some(name) = name.filter(|n| !n.is_empty()) else {
                                continue;
                            };
                            if let Some(id) = id {
                                self.tool_names.insert(id, name.clone());
                            }
                            let Some(input) = input.filter(Value::is_object) else {
                                continue;
                            };
                            let arg = primary_argument(&name, &input);
                            if !arg.is_empty() {
                                self.out.events.push(Event::tool_use(ts, name, arg));
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    fn standalone_result(&mut self, ts: Option<OffsetDateTime>, record: ToolResultRecord) {
        let Some(output) = record.output().filter(|o| !o.is_empty()) else {
            return;
        };
        let name = record
            .tool_name
            .as_ref()
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        self.out.events.push(Event::tool_result(ts, name, output));
    }
}

/// The one argument that best describes a tool call.
fn primary_argument(tool: &str, input: &Value) -> String {
    let field = match tool {
        "Bash" => Some("command"),
        "Write" | "Edit" | "MultiEdit" | "Read" | "NotebookEdit" => Some("file_path"),
        "WebFetch" => Some("url"),
        _ => None,
    };
    match field {
        Some(field) => input
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        None => serde_json::to_string(input).unwrap_or_default(),
    }
}

/// Text of a `tool_result` block: either a plain string or a list of text blocks.
fn result_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get("text").and_then(Value::as_str))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convnotes_core::EventKind;

    fn ts(s: &str) -> OffsetDateTime {
        parse_rfc3339(s).unwrap()
    }

    #[test]
    fn user_string_and_block_content() {
        let content = [
            r#"{"type":"user","sessionId":"s1","timestamp":"2024-01-01T00:00:00Z","message":{"content":"add a flag"}}"#,
            r#"{"type":"user","sessionId":"s1","timestamp":"2024-01-01T00:00:01Z","message":{"content":[{"type":"text","text":"first"},{"type":"text","text":""},{"text":"untyped"}]}}"#,
        ]
        .join("\n");
        let parsed = parse_transcript(&content, None, None);
        let texts: Vec<_> = parsed.events.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(texts, vec!["add a flag", "first", "untyped"]);
        assert!(parsed.events.iter().all(|e| e.kind == EventKind::User));
        assert_eq!(parsed.last_event_time, Some(ts("2024-01-01T00:00:01Z")));
    }

    #[test]
    fn assistant_text_and_tool_use() {
        let content = r#"{"type":"assistant","sessionId":"s1","timestamp":"2024-01-01T00:00:02Z","message":{"model":"claude-sonnet-4-5","content":[{"type":"text","text":"Running tests"},{"type":"tool_use","id":"t1","name":"Bash","input":{"command":"cargo test"}},{"type":"tool_use","id":"t2","name":"Edit","input":{"file_path":"src/lib.rs","old_string":"a"}},{"type":"tool_use","id":"t3","name":"WebFetch","input":{"url":"https://example.com"}},{"type":"tool_use","id":"t4","name":"Grep","input":{"pattern":"fn"}}]}}"#;
        let parsed = parse_transcript(content, None, None);
        let got: Vec<_> = parsed
            .events
            .iter()
            .map(|e| (e.kind, e.tool_name.as_deref(), e.content.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                (EventKind::Assistant, None, "Running tests"),
                (EventKind::ToolUse, Some("Bash"), "cargo test"),
                (EventKind::ToolUse, Some("Edit"), "src/lib.rs"),
                (EventKind::ToolUse, Some("WebFetch"), "https://example.com"),
                (EventKind::ToolUse, Some("Grep"), r#"{"pattern":"fn"}"#),
            ]
        );
        assert_eq!(parsed.model.unwrap().model, "claude-sonnet-4-5");
    }

    #[test]
    fn tool_result_blocks_are_named_from_earlier_tool_use() {
        let content = [
            r#"{"type":"assistant","timestamp":"2024-01-01T00:00:00Z","message":{"content":[{"type":"tool_use","id":"toolu_1","name":"Bash","input":{"command":"ls"}}]}}"#,
            r#"{"type":"user","timestamp":"2024-01-01T00:00:01Z","message":{"content":[{"type":"tool_result","tool_use_id":"toolu_1","content":"a.txt\nb.txt"}]}}"#,
            r#"{"type":"user","timestamp":"2024-01-01T00:00:02Z","message":{"content":[{"type":"tool_result","tool_use_id":"unknown","content":[{"type":"text","text":"done"}]}]}}"#,
        ]
        .join("\n");
        let parsed = parse_transcript(&content, None, None);
        assert_eq!(parsed.events.len(), 3);
        assert_eq!(parsed.events[1].kind, EventKind::ToolResult);
        assert_eq!(parsed.events[1].tool_name.as_deref(), Some("Bash"));
        assert_eq!(parsed.events[1].content, "a.txt\nb.txt");
        assert_eq!(parsed.events[2].tool_name, None);
        assert_eq!(parsed.events[2].content, "done");
    }

    #[test]
    fn standalone_tool_result_record() {
        let content = r#"{"type":"tool_result","timestamp":"2024-01-01T00:00:00Z","tool_name":"Bash","result":{"stdout":"[main abc1234] msg"}}"#;
        let parsed = parse_transcript(content, None, None);
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].kind, EventKind::ToolResult);
        assert_eq!(parsed.events[0].tool_name.as_deref(), Some("Bash"));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let content = [
            "not json",
            "",
            r#"{"no_type":true}"#,
            r#"{"type":"summary","summary":"x"}"#,
            r#"{"type":"user","message":{"content":"kept"}}"#,
        ]
        .join("\n");
        let parsed = parse_transcript(&content, None, None);
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].content, "kept");
        assert_eq!(parsed.events[0].timestamp, None);
    }

    #[test]
    fn interruption_marker_drops_event() {
        let content = [
            r#"{"type":"user","message":{"content":"[Request interrupted by user for tool use]"}}"#,
            r#"{"type":"user","message":{"content":[{"type":"text","text":"[Request interrupted by user]"}]}}"#,
            r#"{"type":"user","message":{"content":"carry on"}}"#,
        ]
        .join("\n");
        let parsed = parse_transcript(&content, None, None);
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].content, "carry on");
    }

    #[test]
    fn session_filter() {
        let content = [
            r#"{"type":"user","sessionId":"a","message":{"content":"from a"}}"#,
            r#"{"type":"user","sessionId":"b","message":{"content":"from b"}}"#,
            r#"{"type":"user","message":{"content":"no session"}}"#,
        ]
        .join("\n");
        let texts = |filter| -> Vec<String> {
            parse_transcript(&content, filter, None)
                .events
                .into_iter()
                .map(|e| e.content)
                .collect()
        };
        assert_eq!(texts(Some("a")), vec!["from a", "no session"]);
        assert_eq!(texts(None), vec!["from a", "from b", "no session"]);
        assert_eq!(texts(Some("")), vec!["from a", "from b", "no session"]);
    }

    #[test]
    fn since_skips_earlier_but_keeps_untimed() {
        let content = [
            r#"{"type":"user","timestamp":"2024-01-01T00:00:00Z","message":{"content":"e1"}}"#,
            r#"{"type":"user","timestamp":"2024-01-01T00:00:10Z","message":{"content":"e2"}}"#,
            r#"{"type":"user","timestamp":"2024-01-01T00:00:20Z","message":{"content":"e3"}}"#,
            r#"{"type":"user","timestamp":"garbage","message":{"content":"untimed"}}"#,
        ]
        .join("\n");
        let parsed = parse_transcript(&content, None, Some(ts("2024-01-01T00:00:15Z")));
        let texts: Vec<_> = parsed.events.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(texts, vec!["e3", "untimed"]);
        assert_eq!(parsed.last_event_time, Some(ts("2024-01-01T00:00:20Z")));

        let at_boundary = parse_transcript(&content, None, Some(ts("2024-01-01T00:00:10Z")));
        assert_eq!(at_boundary.events[0].content, "e2");
    }

    #[test]
    fn synthetic_model_is_ignored() {
        let content = [
            r#"{"type":"assistant","message":{"model":"claude-opus-4-1","content":"x"}}"#,
            r#"{"type":"assistant","message":{"model":"<synthetic>","content":"y"}}"#,
        ]
        .join("\n");
        let parsed = parse_transcript(&content, None, None);
        assert_eq!(parsed.model.unwrap().model, "claude-opus-4-1");
    }
}
