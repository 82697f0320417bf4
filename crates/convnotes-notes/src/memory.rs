use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use time::OffsetDateTime;

use crate::backend::{AddOutcome, NotesBackend};
use crate::error::NotesError;

#[derive(Debug, Clone)]
struct Commit {
    parent: Option<String>,
    committed_at: OffsetDateTime,
}

#[derive(Debug, Default)]
struct State {
    commits: BTreeMap<String, Commit>,
    /// notes_ref -> object -> body
    notes: BTreeMap<String, BTreeMap<String, String>>,
    /// Object whose next `add` finds a competing note already written.
    racing_writer: Option<(String, String)>,
    unavailable: bool,
    adds: usize,
}

/// In-process notes backend with a tiny commit graph.
///
/// Used by tests across the workspace in place of a real repository.
#[derive(Debug, Default)]
pub struct MemoryNotes {
    state: Mutex<State>,
}

impl MemoryNotes {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a commit object with its committer time and first parent.
    pub fn add_commit(&self, id: &str, parent: Option<&str>, committed_at: OffsetDateTime) {
        self.state().commits.insert(
            id.to_string(),
            Commit {
                parent: parent.map(str::to_string),
                committed_at,
            },
        );
    }

    /// Make the next `add` on `object` lose a race against a writer that stores `body`.
    pub fn race_next_add(&self, object: &str, body: &str) {
        self.state().racing_writer = Some((object.to_string(), body.to_string()));
    }

    /// Make every operation fail as if git could not be run.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Number of notes actually written through `add`.
    pub fn add_count(&self) -> usize {
        self.state().adds
    }

    /// Raw note body, bypassing the availability switch.
    pub fn raw_note(&self, notes_ref: &str, object: &str) -> Option<String> {
        self.state().notes.get(notes_ref)?.get(object).cloned()
    }

    /// Store a raw body directly, e.g. one that is not valid annotation JSON.
    pub fn insert_raw(&self, notes_ref: &str, object: &str, body: &str) {
        self.state()
            .notes
            .entry(notes_ref.to_string())
            .or_default()
            .insert(object.to_string(), body.to_string());
    }
}

fn check(state: &State) -> Result<(), NotesError> {
    if state.unavailable {
        return Err(NotesError::StoreUnavailable("memory backend switched off".into()));
    }
    Ok(())
}

impl NotesBackend for MemoryNotes {
    fn add(&self, notes_ref: &str, object: &str, body: &str) -> Result<AddOutcome, NotesError> {
        let mut state = self.state();
        check(&state)?;
        if let Some((racer, racer_body)) = state.racing_writer.take() {
            if racer == object {
                state
                    .notes
                    .entry(notes_ref.to_string())
                    .or_default()
                    .insert(racer, racer_body);
            } else {
                state.racing_writer = Some((racer, racer_body));
            }
        }
        let notes = state.notes.entry(notes_ref.to_string()).or_default();
        if notes.contains_key(object) {
            return Ok(AddOutcome::AlreadyExists);
        }
        notes.insert(object.to_string(), body.to_string());
        state.adds += 1;
        Ok(AddOutcome::Added)
    }

    fn show(&self, notes_ref: &str, object: &str) -> Result<Option<String>, NotesError> {
        let state = self.state();
        check(&state)?;
        Ok(state
            .notes
            .get(notes_ref)
            .and_then(|n| n.get(object))
            .cloned())
    }

    fn list(&self, notes_ref: &str) -> Result<Vec<String>, NotesError> {
        let state = self.state();
        check(&state)?;
        Ok(state
            .notes
            .get(notes_ref)
            .map(|n| n.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn object_exists(&self, object: &str) -> Result<bool, NotesError> {
        let state = self.state();
        check(&state)?;
        Ok(state.commits.contains_key(object))
    }

    fn parent_commit_time(&self, object: &str) -> Result<Option<OffsetDateTime>, NotesError> {
        let state = self.state();
        check(&state)?;
        Ok(state
            .commits
            .get(object)
            .and_then(|c| c.parent.as_ref())
            .and_then(|p| state.commits.get(p))
            .map(|p| p.committed_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_never_overwrites() {
        let mem = MemoryNotes::new();
        assert_eq!(mem.add("r", "c1", "first").unwrap(), AddOutcome::Added);
        assert_eq!(mem.add("r", "c1", "second").unwrap(), AddOutcome::AlreadyExists);
        assert_eq!(mem.show("r", "c1").unwrap().as_deref(), Some("first"));
        assert_eq!(mem.add_count(), 1);
    }

    #[test]
    fn refs_are_separate_namespaces() {
        let mem = MemoryNotes::new();
        mem.add("a", "c1", "x").unwrap();
        assert_eq!(mem.show("b", "c1").unwrap(), None);
        assert!(mem.list("b").unwrap().is_empty());
        assert_eq!(mem.list("a").unwrap(), vec!["c1".to_string()]);
    }

    #[test]
    fn racing_writer_wins_once() {
        let mem = MemoryNotes::new();
        mem.race_next_add("c1", "theirs");
        assert_eq!(mem.add("r", "c1", "ours").unwrap(), AddOutcome::AlreadyExists);
        assert_eq!(mem.raw_note("r", "c1").as_deref(), Some("theirs"));
    }

    #[test]
    fn parent_time_follows_graph() {
        let mem = MemoryNotes::new();
        let t0 = OffsetDateTime::UNIX_EPOCH;
        mem.add_commit("root", None, t0);
        mem.add_commit("child", Some("root"), t0 + time::Duration::minutes(5));
        assert_eq!(mem.parent_commit_time("child").unwrap(), Some(t0));
        assert_eq!(mem.parent_commit_time("root").unwrap(), None);
        assert_eq!(mem.parent_commit_time("missing").unwrap(), None);
    }

    #[test]
    fn unavailable_fails_every_call() {
        let mem = MemoryNotes::new();
        mem.set_unavailable(true);
        assert!(matches!(
            mem.list("r"),
            Err(NotesError::StoreUnavailable(_))
        ));
        assert!(mem.object_exists("c").is_err());
    }
}
