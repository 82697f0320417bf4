use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_NOTES_REF: &str = "claude-conversations";
pub const DEFAULT_MAX_EXCERPT_LENGTH: usize = 5000;
pub const DEFAULT_MAX_PROMPTS: usize = 2;
pub const DEFAULT_USER_MARKER: &str = "👤";
pub const DEFAULT_ASSISTANT_MARKER: &str = "🤖";
/// How far before the previous commit the conversation window opens. The
/// prompt that triggered a piece of work typically lands tens of seconds before
/// the commit that closes it.
pub const DEFAULT_WINDOW_BUFFER_SECS: u64 = 60;
/// Upper bound on `window_buffer_secs` (one year).
pub const MAX_WINDOW_BUFFER_SECS: u64 = 365 * 24 * 60 * 60;

/// Per-project settings, read from `<project>/.claude/notes.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    pub enabled: bool,
    pub max_excerpt_length: usize,
    /// Accepted for compatibility; the excerpt is bounded by length, not prompt count.
    pub max_prompts: usize,
    pub notes_ref: String,
    pub exclude_patterns: Vec<String>,
    #[serde(alias = "user_emoji")]
    pub user_marker: String,
    #[serde(alias = "assistant_emoji")]
    pub assistant_marker: String,
    pub window_buffer_secs: u64,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_excerpt_length: DEFAULT_MAX_EXCERPT_LENGTH,
            max_prompts: DEFAULT_MAX_PROMPTS,
            notes_ref: DEFAULT_NOTES_REF.to_string(),
            exclude_patterns: Vec::new(),
            user_marker: DEFAULT_USER_MARKER.to_string(),
            assistant_marker: DEFAULT_ASSISTANT_MARKER.to_string(),
            window_buffer_secs: DEFAULT_WINDOW_BUFFER_SECS,
        }
    }
}

impl NotesConfig {
    /// Path of the config file for a project directory.
    pub fn path(project_dir: &Path) -> PathBuf {
        project_dir.join(".claude").join("notes.json")
    }

    /// Load the project config. A missing file yields defaults; a malformed file
    /// is logged and also yields defaults.
    pub fn load(project_dir: &Path) -> Self {
        let path = Self::path(project_dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match Self::from_json(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid notes config, using defaults");
                Self::default()
            }
        }
    }

    /// Parse config JSON, normalise empty or zero values to their defaults and
    /// clamp the window buffer.
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_json::from_str(content)?;
        Ok(cfg.normalized())
    }

    /// Write the config as pretty JSON, creating `.claude/` if needed.
    pub fn save(&self, project_dir: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        crate::fs::write_atomic(&Self::path(project_dir), json.as_bytes())
    }

    fn normalized(mut self) -> Self {
        if self.notes_ref.trim().is_empty() {
            self.notes_ref = DEFAULT_NOTES_REF.to_string();
        }
        if self.max_excerpt_length == 0 {
            self.max_excerpt_length = DEFAULT_MAX_EXCERPT_LENGTH;
        }
        if self.max_prompts == 0 {
            self.max_prompts = DEFAULT_MAX_PROMPTS;
        }
        if self.user_marker.is_empty() {
            self.user_marker = DEFAULT_USER_MARKER.to_string();
        }
        if self.assistant_marker.is_empty() {
            self.assistant_marker = DEFAULT_ASSISTANT_MARKER.to_string();
        }
        self.window_buffer_secs = self.window_buffer_secs.min(MAX_WINDOW_BUFFER_SECS);
        self
    }

    pub fn window_buffer(&self) -> time::Duration {
        let secs = self.window_buffer_secs.min(MAX_WINDOW_BUFFER_SECS);
        time::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = NotesConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.max_excerpt_length, 5000);
        assert_eq!(cfg.max_prompts, 2);
        assert_eq!(cfg.notes_ref, "claude-conversations");
        assert!(cfg.exclude_patterns.is_empty());
        assert_eq!(cfg.window_buffer(), time::Duration::seconds(60));
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(NotesConfig::load(tmp.path()), NotesConfig::default());
    }

    #[test]
    fn load_malformed_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(".claude")).unwrap();
        std::fs::write(NotesConfig::path(tmp.path()), "{not json").unwrap();
        assert_eq!(NotesConfig::load(tmp.path()), NotesConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = NotesConfig::from_json(r#"{"enabled": false, "notes_ref": "team"}"#).unwrap();
        assert!(!cfg.enabled);
        assert_eq!(cfg.notes_ref, "team");
        assert_eq!(cfg.max_excerpt_length, 5000);
    }

    #[test]
    fn zero_and_empty_values_are_normalized() {
        let cfg = NotesConfig::from_json(
            r#"{"notes_ref": "", "max_excerpt_length": 0, "max_prompts": 0, "user_marker": ""}"#,
        )
        .unwrap();
        assert_eq!(cfg.notes_ref, DEFAULT_NOTES_REF);
        assert_eq!(cfg.max_excerpt_length, DEFAULT_MAX_EXCERPT_LENGTH);
        assert_eq!(cfg.max_prompts, DEFAULT_MAX_PROMPTS);
        assert_eq!(cfg.user_marker, DEFAULT_USER_MARKER);
    }

    #[test]
    fn huge_window_buffer_is_clamped() {
        let cfg = NotesConfig::from_json(r#"{"window_buffer_secs": 400000000000}"#).unwrap();
        assert_eq!(cfg.window_buffer_secs, MAX_WINDOW_BUFFER_SECS);

        let unclamped = NotesConfig {
            window_buffer_secs: u64::MAX,
            ..NotesConfig::default()
        };
        assert_eq!(
            unclamped.window_buffer(),
            time::Duration::seconds(MAX_WINDOW_BUFFER_SECS as i64)
        );
    }

    #[test]
    fn emoji_aliases_are_accepted() {
        let cfg =
            NotesConfig::from_json(r#"{"user_emoji": "U>", "assistant_emoji": "A>"}"#).unwrap();
        assert_eq!(cfg.user_marker, "U>");
        assert_eq!(cfg.assistant_marker, "A>");
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = NotesConfig {
            exclude_patterns: vec!["acme-internal".into()],
            max_excerpt_length: 1200,
            ..NotesConfig::default()
        };
        cfg.save(tmp.path()).unwrap();
        assert_eq!(NotesConfig::load(tmp.path()), cfg);
    }
}
