use time::OffsetDateTime;

use crate::error::NotesError;

/// Result of a non-overwriting note write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// A note was already attached; nothing was written.
    AlreadyExists,
}

/// The raw note operations the store needs from a repository.
///
/// Notes are keyed by `(notes_ref, object)`. Implementations must never
/// overwrite an existing note.
pub trait NotesBackend {
    fn add(&self, notes_ref: &str, object: &str, body: &str) -> Result<AddOutcome, NotesError>;

    /// The note body, or `None` when the object has no note under `notes_ref`.
    fn show(&self, notes_ref: &str, object: &str) -> Result<Option<String>, NotesError>;

    /// Ids of every annotated object. A ref that does not exist yet lists as empty.
    fn list(&self, notes_ref: &str) -> Result<Vec<String>, NotesError>;

    fn object_exists(&self, object: &str) -> Result<bool, NotesError>;

    /// Committer time of the first parent of `object`, if it has one.
    fn parent_commit_time(&self, object: &str) -> Result<Option<OffsetDateTime>, NotesError>;
}

impl<B: NotesBackend + ?Sized> NotesBackend for &B {
    fn add(&self, notes_ref: &str, object: &str, body: &str) -> Result<AddOutcome, NotesError> {
        (**self).add(notes_ref, object, body)
    }

    fn show(&self, notes_ref: &str, object: &str) -> Result<Option<String>, NotesError> {
        (**self).show(notes_ref, object)
    }

    fn list(&self, notes_ref: &str) -> Result<Vec<String>, NotesError> {
        (**self).list(notes_ref)
    }

    fn object_exists(&self, object: &str) -> Result<bool, NotesError> {
        (**self).object_exists(object)
    }

    fn parent_commit_time(&self, object: &str) -> Result<Option<OffsetDateTime>, NotesError> {
        (**self).parent_commit_time(object)
    }
}
