//! Warnings for Bash commands that rewrite history and can orphan notes.

use std::sync::LazyLock;

use regex::Regex;

struct RewriteOp {
    pattern: Regex,
    label: &'static str,
    advice: &'static str,
}

static REWRITE_OPS: LazyLock<Vec<RewriteOp>> = LazyLock::new(|| {
    vec![
        RewriteOp {
            pattern: Regex::new(r"\bgit\s+rebase\b").unwrap(),
            label: "git rebase",
            advice: "Rebased commits get new ids and lose their notes unless copied. \
                     Run `git -c notes.rewrite.mode=copy rebase ...` to carry them over.",
        },
        RewriteOp {
            pattern: Regex::new(r"\bgit\s+reset\s+(?:\S+\s+)*--hard\b").unwrap(),
            label: "git reset --hard",
            advice: "Commits dropped by a hard reset take their notes with them. \
                     Prefer `git reset --soft` or `--mixed` if the commits should survive.",
        },
        RewriteOp {
            pattern: Regex::new(r"\bgit\s+commit\b.*--amend\b").unwrap(),
            label: "git commit --amend",
            advice: "Amending creates a new commit id; the note stays on the old one. \
                     Consider a follow-up commit instead.",
        },
    ]
});

/// Context to show before a history-rewriting command, or `None` for anything else.
pub fn rewrite_warning(command: &str, notes_ref: &str) -> Option<String> {
    let op = REWRITE_OPS.iter().find(|op| op.pattern.is_match(command))?;
    tracing::info!(command, operation = op.label, "warning about notes loss");
    Some(format!(
        "Warning: `{}` can lose conversation notes stored under refs/notes/{notes_ref}.\n\
         {}\n\
         Back them up first with `convnotes backup`; restore later with `convnotes restore <file>`.",
        op.label, op.advice
    ))
}
