use std::fs;
use std::path::{Path, PathBuf};

use convnotes_core::event::sort_chronologically;
use convnotes_core::{Event, Redactor};
use time::OffsetDateTime;

use crate::parse::{parse_transcript, ModelSighting, ParsedTranscript};

pub const TRANSCRIPT_EXTENSION: &str = "jsonl";

/// Events from every transcript in a project directory, merged and redacted.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Aggregated {
    pub events: Vec<Event>,
    pub last_event_time: Option<OffsetDateTime>,
    /// Model named by the latest assistant record across all files.
    pub assistant_model: Option<String>,
}

impl Aggregated {
    /// Tool names in first-seen order, duplicates included.
    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.events
            .iter()
            .filter(|e| e.kind.is_tool())
            .filter_map(|e| e.tool_name.as_deref())
    }
}

/// Aggregate all transcripts in `dir`.
///
/// An empty path or unreadable directory yields an empty result. A file that
/// cannot be read contributes nothing.
pub fn aggregate_dir(
    dir: &Path,
    session_filter: Option<&str>,
    since: Option<OffsetDateTime>,
    redactor: &Redactor,
) -> Aggregated {
    if dir.as_os_str().is_empty() {
        return Aggregated::default();
    }
    match list_transcripts(dir) {
        Ok(files) => merge(&files, session_filter, since, redactor),
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "cannot list transcript dir");
            Aggregated::default()
        }
    }
}

/// Aggregate the directory holding `transcript_path`; `transcript_path` itself
/// is always read, whatever its extension. If that directory cannot be listed,
/// only `transcript_path` is read.
pub fn aggregate_for_transcript(
    transcript_path: &Path,
    session_filter: Option<&str>,
    since: Option<OffsetDateTime>,
    redactor: &Redactor,
) -> Aggregated {
    if transcript_path.as_os_str().is_empty() {
        return Aggregated::default();
    }
    let dir = transcript_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let files = match list_transcripts(dir) {
        Ok(mut files) => {
            // Listed files all live in `dir`, so the name identifies them.
            if !files.iter().any(|f| f.file_name() == transcript_path.file_name()) {
                files.push(transcript_path.to_path_buf());
            }
            files
        }
        Err(e) => {
            tracing::debug!(
                dir = %dir.display(),
                error = %e,
                "cannot list transcript dir, reading single transcript"
            );
            vec![transcript_path.to_path_buf()]
        }
    };
    merge(&files, session_filter, since, redactor)
}

/// Transcript files in `dir`, sorted by name so merge order is reproducible.
fn list_transcripts(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(TRANSCRIPT_EXTENSION) && path.is_file()
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn parse_file(
    path: &Path,
    session_filter: Option<&str>,
    since: Option<OffsetDateTime>,
) -> ParsedTranscript {
    match fs::read(path) {
        Ok(bytes) => parse_transcript(&String::from_utf8_lossy(&bytes), session_filter, since),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "skipping unreadable transcript");
            ParsedTranscript::default()
        }
    }
}

fn merge(
    files: &[PathBuf],
    session_filter: Option<&str>,
    since: Option<OffsetDateTime>,
    redactor: &Redactor,
) -> Aggregated {
    let mut events = Vec::new();
    let mut last_event_time: Option<OffsetDateTime> = None;
    let mut latest_model: Option<ModelSighting> = None;

    for path in files {
        let parsed = parse_file(path, session_filter, since);
        tracing::trace!(path = %path.display(), events = parsed.events.len(), "parsed transcript");
        events.extend(parsed.events);
        last_event_time = last_event_time.max(parsed.last_event_time);
        if let Some(seen) = parsed.model {
            if latest_model.as_ref().map_or(true, |cur| seen.at >= cur.at) {
                latest_model = Some(seen);
            }
        }
    }

    sort_chronologically(&mut events);
    let events = events
        .iter()
        .map(|e| e.map_content(|c| redactor.sanitize(c)))
        .collect();

    Aggregated {
        events,
        last_event_time,
        assistant_model: latest_model.map(|m| m.model),
    }
}
