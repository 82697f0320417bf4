mod backend;
mod backup;
mod error;
mod git;
mod memory;
mod store;

pub use backend::{AddOutcome, NotesBackend};
pub use backup::{default_backup_filename, load_backup, resolve_backup_path, save_backup};
pub use error::NotesError;
pub use git::GitCli;
pub use memory::MemoryNotes;
pub use store::{NotesStore, RestoreReport};
