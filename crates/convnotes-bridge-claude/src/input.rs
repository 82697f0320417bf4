use std::io::Read;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// How long to wait for the hook payload before giving up.
pub const STDIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum HookError {
    #[error("no hook input received within {0:?}")]
    InputTimeout(Duration),

    #[error("hook input was empty")]
    EmptyInput,

    #[error("invalid hook input: {0}")]
    InvalidInput(#[from] serde_json::Error),

    #[error("failed to read hook input: {0}")]
    Io(#[from] std::io::Error),
}

/// The JSON payload Claude Code writes to a hook's stdin.
///
/// Keys are accepted in snake_case or camelCase.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    #[serde(default, alias = "sessionId")]
    pub session_id: String,
    #[serde(default, alias = "transcriptPath")]
    pub transcript_path: String,
    #[serde(default)]
    pub cwd: String,
    #[serde(default, alias = "hookEventName")]
    pub hook_event_name: String,
    #[serde(default, alias = "toolName")]
    pub tool_name: String,
    #[serde(default, alias = "toolInput")]
    pub tool_input: Value,
    #[serde(default, alias = "toolResponse")]
    pub tool_response: Value,
}

impl HookInput {
    /// The shell command of a Bash tool call.
    pub fn command(&self) -> Option<&str> {
        self.tool_input.get("command").and_then(Value::as_str)
    }

    /// Directory the hook acts in: `cwd`, or the process directory when unset.
    pub fn project_dir(&self) -> PathBuf {
        if self.cwd.is_empty() {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        } else {
            PathBuf::from(&self.cwd)
        }
    }
}

pub fn parse_hook_input(raw: &str) -> Result<HookInput, HookError> {
    if raw.trim().is_empty() {
        return Err(HookError::EmptyInput);
    }
    Ok(serde_json::from_str(raw)?)
}

/// Read the whole payload from `reader`, failing if it has not arrived within
/// `timeout`. The read runs on a helper thread, which is left behind on timeout.
pub fn read_hook_input<R>(mut reader: R, timeout: Duration) -> Result<HookInput, HookError>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = String::new();
        let res = reader.read_to_string(&mut buf).map(|_| buf);
        let _ = tx.send(res);
    });
    let raw = match rx.recv_timeout(timeout) {
        Ok(res) => res?,
        Err(_) => return Err(HookError::InputTimeout(timeout)),
    };
    parse_hook_input(&raw)
}
