use serde::Serialize;

use convnotes_core::NotesConfig;
use convnotes_notes::{GitCli, NotesBackend};

use crate::annotate::{handle_post_tool_use, AnnotateOptions};
use crate::input::HookInput;
use crate::rewrite::rewrite_warning;

// ── Hook Decision ──

/// JSON written to stdout for Claude Code. The decision is always `approve`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HookDecision {
    pub decision: &'static str,
    #[serde(rename = "hookSpecificOutput", skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    pub hook_event_name: String,
    pub additional_context: String,
}

impl HookDecision {
    pub fn approve() -> Self {
        Self {
            decision: "approve",
            hook_specific_output: None,
        }
    }

    pub fn approve_with_context(event: &str, context: String) -> Self {
        Self {
            decision: "approve",
            hook_specific_output: Some(HookSpecificOutput {
                hook_event_name: event.to_string(),
                additional_context: context,
            }),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ── Hook dispatch ──

/// Dispatch a hook event against the git repository at the input's `cwd`.
pub fn hook_entrypoint(input: &HookInput, opts: &AnnotateOptions) -> HookDecision {
    hook_entrypoint_with(input, GitCli::new(input.project_dir()), opts)
}

/// Dispatch a hook event by name.
///
/// - `PostToolUse` (Bash): annotate the commit, if the command made one.
/// - `PreToolUse` (Bash): warn before history rewrites.
/// - anything else: approve untouched.
pub fn hook_entrypoint_with<B: NotesBackend>(
    input: &HookInput,
    backend: B,
    opts: &AnnotateOptions,
) -> HookDecision {
    match input.hook_event_name.as_str() {
        "PostToolUse" => {
            let outcome = handle_post_tool_use(input, backend, opts);
            tracing::debug!(?outcome, "post tool use handled");
            HookDecision::approve()
        }
        "PreToolUse" if input.tool_name == "Bash" => dispatch_pre_tool_use(input),
        _ => HookDecision::approve(),
    }
}

fn dispatch_pre_tool_use(input: &HookInput) -> HookDecision {
    let Some(command) = input.command() else {
        return HookDecision::approve();
    };
    let cfg = NotesConfig::load(&input.project_dir());
    match rewrite_warning(command, &cfg.notes_ref) {
        Some(warning) => HookDecision::approve_with_context("PreToolUse", warning),
        None => HookDecision::approve(),
    }
}
