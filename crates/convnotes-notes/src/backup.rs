use std::path::{Path, PathBuf};

use anyhow::Context;
use convnotes_core::fs::write_atomic;
use convnotes_core::AnnotationBackup;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

const BACKUP_STAMP: &[FormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]");

/// `.claude-notes-backup-YYYYMMDD_HHMMSS.json` for the given instant.
pub fn default_backup_filename(at: OffsetDateTime) -> String {
    let stamp = at
        .format(BACKUP_STAMP)
        .unwrap_or_else(|_| at.unix_timestamp().to_string());
    format!(".claude-notes-backup-{stamp}.json")
}

/// Relative paths are taken relative to `work_dir`.
pub fn resolve_backup_path(work_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        work_dir.join(path)
    }
}

pub fn save_backup(path: &Path, backup: &AnnotationBackup) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(backup)?;
    write_atomic(path, json.as_bytes())
        .with_context(|| format!("writing backup {}", path.display()))
}

pub fn load_backup(path: &Path) -> anyhow::Result<AnnotationBackup> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading backup {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing backup {}", path.display()))
}
