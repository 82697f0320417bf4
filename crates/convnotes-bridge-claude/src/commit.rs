//! Recognising `git commit` calls and reading their results.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// `git commit` as a command word, allowing `-c`/`-C` global options before the
/// subcommand. `git commit-tree` and similar plumbing do not match.
static COMMIT_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s;&|(])git(?:\s+-[cC]\s+\S+)*\s+commit(?:$|[\s;&|)])").unwrap()
});

/// Maximum number of `Output:` lines kept in the commit summary.
const MAX_OUTPUT_LINES: usize = 2;

pub fn is_git_commit_command(command: &str) -> bool {
    COMMIT_COMMAND.is_match(command)
}

/// Output text of a Bash tool response: `stdout` of the response object, or the
/// response itself when it is a plain string.
pub fn tool_output(response: &Value) -> String {
    match response {
        Value::String(s) => s.clone(),
        Value::Object(obj) => ["stdout", "output"]
            .iter()
            .filter_map(|k| obj.get(*k).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// Commit id written by `git commit`.
///
/// Prefers the `[branch hash] subject` summary line; falls back to a
/// `commit <hash>` line as printed by `git log` or `git show`.
pub fn extract_commit_id(output: &str) -> Option<String> {
    let from_summary = output.lines().map(str::trim).find_map(|line| {
        let inside = line.strip_prefix('[')?.split(']').next()?;
        inside
            .split_whitespace()
            .last()
            .filter(|h| is_commit_hex(h))
            .map(str::to_string)
    });
    if from_summary.is_some() {
        return from_summary;
    }
    output.lines().map(str::trim).find_map(|line| {
        line.strip_prefix("commit ")?
            .split_whitespace()
            .next()
            .filter(|h| is_commit_hex(h))
            .map(str::to_string)
    })
}

fn is_commit_hex(s: &str) -> bool {
    (4..=40).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Short description of the commit call stored alongside the excerpt.
pub fn commit_context(command: &str, output: &str) -> String {
    let mut parts = vec![format!("Git command: {command}")];
    let mut output_lines = 0;
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with('[') && line.contains(']') {
            parts.push(format!("Result: {line}"));
            break;
        }
        if line.starts_with("On branch") || line.starts_with("Your branch") {
            continue;
        }
        if output_lines < MAX_OUTPUT_LINES {
            parts.push(format!("Output: {line}"));
            output_lines += 1;
        }
    }
    parts.join("\n")
}
