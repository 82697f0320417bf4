pub mod annotation;
pub mod config;
pub mod event;
pub mod fs;
pub mod redact;

pub use annotation::{Annotation, AnnotationBackup, ToolSet};
pub use config::NotesConfig;
pub use event::{Event, EventKind};
pub use redact::{Redactor, PLACEHOLDER};

/// Parse an RFC 3339 timestamp, returning `None` for anything unparseable.
pub fn parse_rfc3339(s: &str) -> Option<time::OffsetDateTime> {
    time::OffsetDateTime::parse(s.trim(), &time::format_description::well_known::Rfc3339).ok()
}
