use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Version string recorded when no assistant model was observed in the window.
pub const UNKNOWN_ASSISTANT_VERSION: &str = "unknown";

/// The note body attached to one commit.
///
/// Serialized field names are the on-disk format read by existing notes, so they
/// must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub session_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub conversation_excerpt: String,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub commit_context: String,
    #[serde(default)]
    pub claude_version: String,
}

/// Point-in-time export of every annotation under one notes ref.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationBackup {
    #[serde(with = "time::serde::rfc3339")]
    pub backup_time: OffsetDateTime,
    pub notes_ref: String,
    /// commit id -> annotation
    #[serde(default)]
    pub notes: BTreeMap<String, Annotation>,
}

impl AnnotationBackup {
    pub fn new(notes_ref: impl Into<String>, notes: BTreeMap<String, Annotation>) -> Self {
        Self {
            backup_time: OffsetDateTime::now_utc(),
            notes_ref: notes_ref.into(),
            notes,
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Insertion-ordered set of tool names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSet(Vec<String>);

impl ToolSet {
    /// Start a set seeded with the tool that triggered the annotation.
    pub fn seeded(first: &str) -> Self {
        let mut set = Self::default();
        set.insert(first);
        set
    }

    /// Add `name` unless it is empty or already present. Returns true if added.
    pub fn insert(&mut self, name: &str) -> bool {
        if name.is_empty() || self.0.iter().any(|t| t == name) {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}
