use convnotes_core::config::{DEFAULT_ASSISTANT_MARKER, DEFAULT_MAX_EXCERPT_LENGTH, DEFAULT_USER_MARKER};
use convnotes_core::{Annotation, Event, EventKind, NotesConfig};
use time::format_description::well_known::Rfc3339;

const MESSAGE_PREVIEW_CHARS: usize = 200;
const TOOL_PREVIEW_CHARS: usize = 150;
const RESULT_PREVIEW_LINES: usize = 3;
const PART_SEPARATOR: &str = "\n\n";
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcerptOptions {
    pub max_length: usize,
    pub user_marker: String,
    pub assistant_marker: String,
}

impl Default for ExcerptOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_EXCERPT_LENGTH,
            user_marker: DEFAULT_USER_MARKER.to_string(),
            assistant_marker: DEFAULT_ASSISTANT_MARKER.to_string(),
        }
    }
}

impl From<&NotesConfig> for ExcerptOptions {
    fn from(cfg: &NotesConfig) -> Self {
        Self {
            max_length: cfg.max_excerpt_length,
            user_marker: cfg.user_marker.clone(),
            assistant_marker: cfg.assistant_marker.clone(),
        }
    }
}

impl ExcerptOptions {
    fn user_prefix(&self) -> String {
        format!("{} User: ", self.user_marker)
    }

    fn assistant_prefix(&self) -> String {
        format!("{} Claude: ", self.assistant_marker)
    }
}

// ── Excerpt compilation ──

/// Compile already-sorted events into the excerpt stored on a commit.
///
/// Each event becomes one part; parts are joined by a blank line. The whole
/// string never exceeds `opts.max_length` characters and ends in `...` when cut.
pub fn compile_excerpt(events: &[Event], opts: &ExcerptOptions) -> String {
    let parts: Vec<String> = events.iter().map(|e| render_event(e, opts)).collect();
    truncate_chars(&parts.join(PART_SEPARATOR), opts.max_length)
}

fn render_event(event: &Event, opts: &ExcerptOptions) -> String {
    match event.kind {
        EventKind::User => format!(
            "{}{}",
            opts.user_prefix(),
            truncate_chars(&event.content, MESSAGE_PREVIEW_CHARS)
        ),
        EventKind::Assistant => format!(
            "{}{}",
            opts.assistant_prefix(),
            truncate_chars(&event.content, MESSAGE_PREVIEW_CHARS)
        ),
        EventKind::ToolUse => format!(
            "Tool ({}): {}",
            event.tool_name.as_deref().unwrap_or("unknown"),
            truncate_chars(&event.content, TOOL_PREVIEW_CHARS)
        ),
        EventKind::ToolResult => format!("Result: {}", result_preview(&event.content)),
    }
}

/// Multi-line output keeps its first lines; single-line output is cut by length.
fn result_preview(output: &str) -> String {
    let lines: Vec<&str> = output.split('\n').collect();
    if lines.len() > RESULT_PREVIEW_LINES {
        format!("{}\n[...]", lines[..RESULT_PREVIEW_LINES].join("\n"))
    } else {
        truncate_chars(output, TOOL_PREVIEW_CHARS)
    }
}

/// Cut `s` to at most `max` characters, ending in `...` when anything was removed.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    if keep == 0 {
        return ELLIPSIS.chars().take(max).collect();
    }
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

// ── Markdown rendering ──

/// Render a stored annotation for `convnotes show`.
///
/// `commit_line` is the one-line description of the commit (hash and subject).
pub fn render_markdown(commit_line: &str, ann: &Annotation, opts: &ExcerptOptions) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Conversation for {commit_line}\n\n"));
    out.push_str(&format!("- **Session:** {}\n", ann.session_id));
    let ts = ann
        .timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| ann.timestamp.to_string());
    out.push_str(&format!("- **Recorded:** {ts}\n"));
    out.push_str(&format!("- **Claude version:** {}\n", ann.claude_version));
    if !ann.tools_used.is_empty() {
        out.push_str(&format!("- **Tools used:** {}\n", ann.tools_used.join(", ")));
    }
    out.push('\n');

    if !ann.commit_context.is_empty() {
        out.push_str("## Commit\n\n");
        out.push_str(&fenced(&ann.commit_context));
        out.push('\n');
    }

    out.push_str("## Conversation\n\n");
    if ann.conversation_excerpt.is_empty() {
        out.push_str("_No conversation captured._\n");
        return out;
    }
    let user_prefix = opts.user_prefix();
    let assistant_prefix = opts.assistant_prefix();
    for part in ann.conversation_excerpt.split(PART_SEPARATOR) {
        if let Some(text) = part.strip_prefix(&user_prefix) {
            out.push_str(&format!("**{}** {text}\n\n", user_prefix.trim_end()));
        } else if let Some(text) = part.strip_prefix(&assistant_prefix) {
            out.push_str(&format!("{} {text}\n\n", assistant_prefix.trim_end()));
        } else if let Some((label, body)) = tool_part(part) {
            out.push_str(&format!("_{label}_\n\n"));
            out.push_str(&fenced(body));
            out.push('\n');
        } else if let Some(body) = part.strip_prefix("Result: ") {
            out.push_str("_Result_\n\n");
            out.push_str(&fenced(body));
            out.push('\n');
        } else {
            out.push_str(part);
            out.push_str("\n\n");
        }
    }
    out
}

/// Split `Tool (name): arg` into (`Tool (name)`, `arg`).
fn tool_part(part: &str) -> Option<(&str, &str)> {
    if !part.starts_with("Tool (") {
        return None;
    }
    let (label, body) = part.split_once("): ")?;
    Some((&part[..label.len() + 1], body))
}

fn fenced(body: &str) -> String {
    let fence = if body.contains("```") { "````" } else { "```" };
    format!("{fence}\n{body}\n{fence}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn opts(max_length: usize) -> ExcerptOptions {
        ExcerptOptions {
            max_length,
            ..ExcerptOptions::default()
        }
    }

    #[test]
    fn empty_events_give_empty_excerpt() {
        assert_eq!(compile_excerpt(&[], &opts(5000)), "");
    }

    #[test]
    fn formats_each_kind() {
        let events = vec![
            Event::user(None, "add a --json flag"),
            Event::assistant(None, "Sure, editing main.rs"),
            Event::tool_use(None, "Edit", "src/main.rs"),
            Event::tool_result(None, Some("Bash".into()), "ok"),
        ];
        let out = compile_excerpt(&events, &opts(5000));
        assert_eq!(
            out,
            "👤 User: add a --json flag\n\n🤖 Claude: Sure, editing main.rs\n\nTool (Edit): src/main.rs\n\nResult: ok"
        );
    }

    #[test]
    fn long_messages_are_capped() {
        let long = "x".repeat(300);
        let out = compile_excerpt(&[Event::user(None, long)], &opts(5000));
        let body = out.strip_prefix("👤 User: ").unwrap();
        assert_eq!(body.chars().count(), 200);
        assert!(body.ends_with("..."));

        let out = compile_excerpt(&[Event::tool_use(None, "Bash", "y".repeat(200))], &opts(5000));
        let body = out.strip_prefix("Tool (Bash): ").unwrap();
        assert_eq!(body.chars().count(), 150);
    }

    #[test]
    fn multi_line_results_keep_three_lines() {
        let out = compile_excerpt(
            &[Event::tool_result(None, None, "a\nb\nc\nd\ne")],
            &opts(5000),
        );
        assert_eq!(out, "Result: a\nb\nc\n[...]");

        let out = compile_excerpt(&[Event::tool_result(None, None, "a\nb\nc")], &opts(5000));
        assert_eq!(out, "Result: a\nb\nc");
    }

    #[test]
    fn total_length_is_bounded() {
        let events: Vec<Event> = (0..50)
            .map(|i| Event::user(None, format!("message number {i} with some padding")))
            .collect();
        for max in [0, 1, 2, 3, 4, 50, 500] {
            let out = compile_excerpt(&events, &opts(max));
            assert!(out.chars().count() <= max, "max={max} got {}", out.chars().count());
            if max >= 3 {
                assert!(out.ends_with("..."));
            }
        }
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let s = "é".repeat(10);
        let out = truncate_chars(&s, 5);
        assert_eq!(out, "éé...");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn custom_markers() {
        let o = ExcerptOptions {
            max_length: 100,
            user_marker: "U>".into(),
            assistant_marker: "A>".into(),
        };
        let out = compile_excerpt(&[Event::user(None, "hi"), Event::assistant(None, "yo")], &o);
        assert_eq!(out, "U> User: hi\n\nA> Claude: yo");
    }

    #[test]
    fn markdown_rendering() {
        let ann = Annotation {
            session_id: "sess-1".into(),
            timestamp: OffsetDateTime::UNIX_EPOCH,
            conversation_excerpt:
                "👤 User: fix the bug\n\n🤖 Claude: done\n\nTool (Bash): git commit -m fix\n\nResult: [main abc1234] fix"
                    .into(),
            tools_used: vec!["Bash".into(), "Edit".into()],
            commit_context: "Git command: git commit -m fix".into(),
            claude_version: "claude-sonnet-4-5".into(),
        };
        let md = render_markdown("abc1234 fix", &ann, &ExcerptOptions::default());
        assert!(md.starts_with("# Conversation for abc1234 fix\n"));
        assert!(md.contains("- **Session:** sess-1\n"));
        assert!(md.contains("- **Recorded:** 1970-01-01T00:00:00Z\n"));
        assert!(md.contains("- **Tools used:** Bash, Edit\n"));
        assert!(md.contains("**👤 User:** fix the bug"));
        assert!(md.contains("_Tool (Bash)_\n\n```\ngit commit -m fix\n```\n"));
        assert!(md.contains("_Result_\n\n```\n[main abc1234] fix\n```\n"));
    }

    #[test]
    fn markdown_without_excerpt() {
        let ann = Annotation {
            session_id: "s".into(),
            timestamp: OffsetDateTime::UNIX_EPOCH,
            conversation_excerpt: String::new(),
            tools_used: vec![],
            commit_context: String::new(),
            claude_version: "unknown".into(),
        };
        let md = render_markdown("abc", &ann, &ExcerptOptions::default());
        assert!(md.contains("_No conversation captured._"));
        assert!(!md.contains("## Commit"));
    }
}
