use std::path::Path;
use std::time::Duration;

use convnotes_core::annotation::UNKNOWN_ASSISTANT_VERSION;
use convnotes_core::{Annotation, NotesConfig, Redactor, ToolSet};
use convnotes_notes::{NotesBackend, NotesStore};
use convnotes_pack::{compile_excerpt, ExcerptOptions};
use convnotes_transcript::aggregate_for_transcript;
use time::OffsetDateTime;

use crate::commit::{commit_context, extract_commit_id, is_git_commit_command, tool_output};
use crate::input::HookInput;

/// Pause before reading transcripts, giving Claude Code time to flush the
/// record of the commit call itself.
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    pub settle_delay: Duration,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// What a PostToolUse invocation did. Every outcome approves the tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotateOutcome {
    /// Not a PostToolUse event for the Bash tool.
    NotMonitored,
    NotACommit,
    Disabled,
    NoCommitId,
    AlreadyAnnotated { commit: String },
    Annotated { commit: String },
    /// A concurrent invocation annotated the commit first.
    LostRace { commit: String },
    Failed { commit: String, reason: String },
}

/// Attach the conversation behind a `git commit` to the new commit.
///
/// Never fails: store problems are logged and reported as an outcome.
pub fn handle_post_tool_use<B: NotesBackend>(
    input: &HookInput,
    backend: B,
    opts: &AnnotateOptions,
) -> AnnotateOutcome {
    if input.hook_event_name != "PostToolUse" || input.tool_name != "Bash" {
        return AnnotateOutcome::NotMonitored;
    }
    let command = input.command().unwrap_or_default();
    if !is_git_commit_command(command) {
        return AnnotateOutcome::NotACommit;
    }

    let project_dir = input.project_dir();
    let cfg = NotesConfig::load(&project_dir);
    if !cfg.enabled {
        tracing::debug!(dir = %project_dir.display(), "conversation notes disabled");
        return AnnotateOutcome::Disabled;
    }

    let output = tool_output(&input.tool_response);
    let Some(commit) = extract_commit_id(&output) else {
        tracing::debug!(command, "no commit id in git output");
        return AnnotateOutcome::NoCommitId;
    };

    let store = NotesStore::new(backend, cfg.notes_ref.clone());
    match store.exists(&commit) {
        Ok(true) => {
            tracing::debug!(commit = %commit, "commit already annotated");
            return AnnotateOutcome::AlreadyAnnotated { commit };
        }
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(commit = %commit, error = %e, "cannot check for existing note");
            return AnnotateOutcome::Failed {
                commit,
                reason: e.to_string(),
            };
        }
    }

    let since = match store.backend().parent_commit_time(&commit) {
        // Out of range means the window reaches past the earliest instant.
        Ok(parent) => parent.and_then(|t| t.checked_sub(cfg.window_buffer())),
        Err(e) => {
            tracing::debug!(commit = %commit, error = %e, "no previous commit time, using whole transcript");
            None
        }
    };

    if !opts.settle_delay.is_zero() {
        std::thread::sleep(opts.settle_delay);
    }

    let redactor = Redactor::new(&cfg.exclude_patterns);
    let annotation = build_annotation(input, &cfg, &redactor, since, command, &output);
    let excerpt_len = annotation.conversation_excerpt.chars().count();

    match store.put(&commit, &annotation) {
        Ok(()) => {
            tracing::info!(
                commit = %commit,
                session_id = %input.session_id,
                tools_used = %annotation.tools_used.join(", "),
                excerpt_len,
                "attached conversation to commit"
            );
            AnnotateOutcome::Annotated { commit }
        }
        Err(e) if e.is_conflict() => {
            tracing::debug!(commit = %commit, "another invocation annotated the commit first");
            AnnotateOutcome::LostRace { commit }
        }
        Err(e) => {
            tracing::warn!(commit = %commit, error = %e, "failed to attach conversation note");
            AnnotateOutcome::Failed {
                commit,
                reason: e.to_string(),
            }
        }
    }
}

fn build_annotation(
    input: &HookInput,
    cfg: &NotesConfig,
    redactor: &Redactor,
    since: Option<OffsetDateTime>,
    command: &str,
    output: &str,
) -> Annotation {
    let context = aggregate_for_transcript(
        Path::new(&input.transcript_path),
        None,
        since,
        redactor,
    );
    let excerpt = compile_excerpt(&context.events, &ExcerptOptions::from(cfg));

    let mut tools = ToolSet::seeded(&input.tool_name);
    for name in context.tool_names() {
        tools.insert(name);
    }

    Annotation {
        session_id: input.session_id.clone(),
        timestamp: OffsetDateTime::now_utc(),
        conversation_excerpt: excerpt,
        tools_used: tools.into_vec(),
        commit_context: redactor.sanitize(&commit_context(command, output)),
        claude_version: context
            .assistant_model
            .unwrap_or_else(|| UNKNOWN_ASSISTANT_VERSION.to_string()),
    }
}
