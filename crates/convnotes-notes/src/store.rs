use std::collections::BTreeMap;

use convnotes_core::{Annotation, AnnotationBackup};

use crate::backend::{AddOutcome, NotesBackend};
use crate::error::NotesError;

/// Counts reported by [`NotesStore::restore`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub skipped: usize,
}

/// Annotation CRUD over one notes ref.
#[derive(Debug)]
pub struct NotesStore<B> {
    backend: B,
    notes_ref: String,
}

impl<B: NotesBackend> NotesStore<B> {
    pub fn new(backend: B, notes_ref: impl Into<String>) -> Self {
        Self {
            backend,
            notes_ref: notes_ref.into(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn notes_ref(&self) -> &str {
        &self.notes_ref
    }

    /// Attach `annotation` to `object`. Fails with `WriteConflict` if a note is
    /// already there; the existing note is left untouched.
    pub fn put(&self, object: &str, annotation: &Annotation) -> Result<(), NotesError> {
        let body = serde_json::to_string_pretty(annotation)?;
        match self.backend.add(&self.notes_ref, object, &body)? {
            AddOutcome::Added => Ok(()),
            AddOutcome::AlreadyExists => Err(NotesError::WriteConflict {
                object: object.to_string(),
            }),
        }
    }

    pub fn get(&self, object: &str) -> Result<Option<Annotation>, NotesError> {
        let Some(body) = self.backend.show(&self.notes_ref, object)? else {
            return Ok(None);
        };
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| NotesError::Malformed {
                object: object.to_string(),
                source,
            })
    }

    /// Whether any note is attached, readable or not.
    pub fn exists(&self, object: &str) -> Result<bool, NotesError> {
        Ok(self.backend.show(&self.notes_ref, object)?.is_some())
    }

    /// Every readable annotation under the ref. Unreadable notes are skipped.
    pub fn list(&self) -> Result<BTreeMap<String, Annotation>, NotesError> {
        let mut out = BTreeMap::new();
        for object in self.backend.list(&self.notes_ref)? {
            match self.get(&object) {
                Ok(Some(ann)) => {
                    out.insert(object, ann);
                }
                Ok(None) => {}
                Err(e) => tracing::debug!(object = %object, error = %e, "skipping unreadable note"),
            }
        }
        Ok(out)
    }

    pub fn backup(&self) -> Result<AnnotationBackup, NotesError> {
        Ok(AnnotationBackup::new(self.notes_ref.clone(), self.list()?))
    }

    /// Re-attach annotations from a backup.
    ///
    /// Objects missing from the repository and objects that already carry a note
    /// are skipped. The first failed write aborts; notes written before it stay.
    pub fn restore(&self, backup: &AnnotationBackup) -> Result<RestoreReport, NotesError> {
        let mut report = RestoreReport::default();
        for (object, annotation) in &backup.notes {
            let step = self.restore_one(object, annotation);
            match step {
                Ok(true) => report.restored += 1,
                Ok(false) => report.skipped += 1,
                Err(source) => {
                    return Err(NotesError::RestoreAborted {
                        object: object.clone(),
                        restored: report.restored,
                        skipped: report.skipped,
                        source: Box::new(source),
                    })
                }
            }
        }
        tracing::info!(
            restored = report.restored,
            skipped = report.skipped,
            notes_ref = %self.notes_ref,
            "restore complete"
        );
        Ok(report)
    }

    /// `Ok(true)` if written, `Ok(false)` if skipped.
    fn restore_one(&self, object: &str, annotation: &Annotation) -> Result<bool, NotesError> {
        if !self.backend.object_exists(object)? {
            tracing::debug!(object, "object not in repository, skipping");
            return Ok(false);
        }
        if self.exists(object)? {
            return Ok(false);
        }
        match self.put(object, annotation) {
            Ok(()) => Ok(true),
            // Someone annotated it between our check and our write.
            Err(e) if e.is_conflict() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
