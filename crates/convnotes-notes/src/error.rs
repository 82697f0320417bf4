use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotesError {
    /// Another writer already attached a note to this object.
    #[error("a note already exists on {object}")]
    WriteConflict { object: String },

    /// The git notes mechanism could not be run or reported a failure.
    #[error("notes store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("malformed note on {object}: {source}")]
    Malformed {
        object: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode annotation: {0}")]
    Encode(#[from] serde_json::Error),

    /// Restore stopped at `object`; earlier writes stay in place.
    #[error("restore aborted at {object} after {restored} restored, {skipped} skipped: {source}")]
    RestoreAborted {
        object: String,
        restored: usize,
        skipped: usize,
        #[source]
        source: Box<NotesError>,
    },
}

impl NotesError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, NotesError::WriteConflict { .. })
    }
}
