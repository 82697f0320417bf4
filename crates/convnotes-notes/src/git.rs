use std::path::PathBuf;
use std::process::{Command, Output};

use convnotes_core::parse_rfc3339;
use time::OffsetDateTime;

use crate::backend::{AddOutcome, NotesBackend};
use crate::error::NotesError;

/// Notes backend that shells out to the `git` binary in `work_dir`.
#[derive(Debug, Clone)]
pub struct GitCli {
    work_dir: PathBuf,
}

impl GitCli {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    fn git(&self, args: &[&str]) -> Result<Output, NotesError> {
        Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .output()
            .map_err(|e| NotesError::StoreUnavailable(format!("cannot run git: {e}")))
    }

    /// Trimmed stdout of a successful git command, `None` on failure or empty output.
    fn git_line(&self, args: &[&str]) -> Option<String> {
        self.git(args)
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// `<short hash> <subject>` for display.
    pub fn oneline(&self, rev: &str) -> Option<String> {
        self.git_line(&["log", "-1", "--format=%h %s", rev, "--"])
    }

    /// Root of the working tree, if `work_dir` is inside one.
    pub fn top_level(&self) -> Option<PathBuf> {
        self.git_line(&["rev-parse", "--show-toplevel"])
            .map(PathBuf::from)
    }
}

fn full_ref(notes_ref: &str) -> String {
    if notes_ref.starts_with("refs/") {
        notes_ref.to_string()
    } else {
        format!("refs/notes/{notes_ref}")
    }
}

fn failure(what: &str, out: &Output) -> NotesError {
    let stderr = String::from_utf8_lossy(&out.stderr);
    NotesError::StoreUnavailable(format!("{what} failed ({}): {}", out.status, stderr.trim()))
}

impl NotesBackend for GitCli {
    fn add(&self, notes_ref: &str, object: &str, body: &str) -> Result<AddOutcome, NotesError> {
        let out = self.git(&["notes", "--ref", notes_ref, "add", "-m", body, object])?;
        if out.status.success() {
            return Ok(AddOutcome::Added);
        }
        // `git notes add` refuses to overwrite; tell that apart from a broken store
        // by looking for the note that beat us.
        match self.show(notes_ref, object) {
            Ok(Some(_)) => Ok(AddOutcome::AlreadyExists),
            _ => Err(failure("git notes add", &out)),
        }
    }

    fn show(&self, notes_ref: &str, object: &str) -> Result<Option<String>, NotesError> {
        let out = self.git(&["notes", "--ref", notes_ref, "show", object])?;
        if out.status.success() {
            return Ok(Some(String::from_utf8_lossy(&out.stdout).into_owned()));
        }
        // Exit 1 means "no note found"; anything else is a real failure.
        if out.status.code() == Some(1) {
            return Ok(None);
        }
        Err(failure("git notes show", &out))
    }

    fn list(&self, notes_ref: &str) -> Result<Vec<String>, NotesError> {
        let probe = self.git(&["rev-parse", "--verify", "--quiet", &full_ref(notes_ref)])?;
        if !probe.status.success() {
            return Ok(Vec::new());
        }
        let out = self.git(&["notes", "--ref", notes_ref, "list"])?;
        if !out.status.success() {
            return Err(failure("git notes list", &out));
        }
        // Each line is `<note blob> <annotated object>`.
        Ok(String::from_utf8_lossy(&out.stdout)
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let _note = fields.next()?;
                let object = fields.next()?;
                Some(object.to_string())
            })
            .collect())
    }

    fn object_exists(&self, object: &str) -> Result<bool, NotesError> {
        Ok(self.git(&["cat-file", "-e", object])?.status.success())
    }

    fn parent_commit_time(&self, object: &str) -> Result<Option<OffsetDateTime>, NotesError> {
        let out = self.git(&["log", "-1", "--format=%cI", &format!("{object}~1"), "--"])?;
        if !out.status.success() {
            // Root commit, or the object is not a commit.
            return Ok(None);
        }
        Ok(parse_rfc3339(String::from_utf8_lossy(&out.stdout).trim()))
    }
}
