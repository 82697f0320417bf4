pub mod commit;
pub mod rewrite;

mod annotate;
mod dispatch;
mod input;

pub use annotate::{handle_post_tool_use, AnnotateOptions, AnnotateOutcome};
pub use dispatch::{hook_entrypoint, hook_entrypoint_with, HookDecision, HookSpecificOutput};
pub use input::{parse_hook_input, read_hook_input, HookError, HookInput, STDIN_TIMEOUT};
