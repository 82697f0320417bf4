use convnotes_bridge_claude::{hook_entrypoint, read_hook_input, AnnotateOptions, STDIN_TIMEOUT};

/// `convnotes hook`: read the hook event from stdin and print the decision.
///
/// A missing, late, or unparseable event is the one failure that exits non-zero.
pub fn execute() -> anyhow::Result<()> {
    let input = read_hook_input(std::io::stdin(), STDIN_TIMEOUT)?;
    tracing::debug!(
        event = %input.hook_event_name,
        tool = %input.tool_name,
        session_id = %input.session_id,
        "hook input"
    );
    let decision = hook_entrypoint(&input, &AnnotateOptions::default());
    println!("{}", decision.to_json()?);
    Ok(())
}
