use std::path::{Path, PathBuf};

use anyhow::Context;
use convnotes_core::{Annotation, NotesConfig};
use convnotes_notes::{
    default_backup_filename, load_backup, resolve_backup_path, save_backup, GitCli, NotesBackend,
    NotesStore, RestoreReport,
};
use convnotes_pack::{render_markdown, ExcerptOptions};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

const LIST_TIME: &[FormatItem<'static>] = format_description!("[year]-[month]-[day] [hour]:[minute]");
const BACKUP_TIME: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

fn git_store(repo_root: &Path) -> (NotesStore<GitCli>, NotesConfig) {
    let cfg = NotesConfig::load(repo_root);
    let store = NotesStore::new(GitCli::new(repo_root), cfg.notes_ref.clone());
    (store, cfg)
}

/// `convnotes show [commit]`
pub fn show(repo_root: &Path, commit: &str, json: bool) -> anyhow::Result<()> {
    let (store, cfg) = git_store(repo_root);
    let Some(annotation) = store
        .get(commit)
        .with_context(|| format!("reading note for {commit}"))?
    else {
        println!("No conversation notes found for commit {commit}");
        println!("Run `convnotes list` to see which commits have notes.");
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&annotation)?);
        return Ok(());
    }
    let commit_line = store
        .backend()
        .oneline(commit)
        .unwrap_or_else(|| commit.to_string());
    print!(
        "{}",
        render_markdown(&commit_line, &annotation, &ExcerptOptions::from(&cfg))
    );
    Ok(())
}

/// `convnotes list`
pub fn list(repo_root: &Path) -> anyhow::Result<()> {
    let (store, _) = git_store(repo_root);
    let notes = store.list().context("listing notes")?;
    if notes.is_empty() {
        println!("No conversation notes found.");
        return Ok(());
    }
    println!("{} commits with conversation notes:\n", notes.len());
    for line in list_lines(&notes) {
        println!("{line}");
    }
    Ok(())
}

/// Newest first.
fn list_lines(notes: &std::collections::BTreeMap<String, Annotation>) -> Vec<String> {
    let mut entries: Vec<_> = notes.iter().collect();
    entries.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp).then(a.0.cmp(b.0)));
    entries
        .into_iter()
        .map(|(id, ann)| {
            let short: String = id.chars().take(8).collect();
            let when = ann
                .timestamp
                .format(LIST_TIME)
                .unwrap_or_else(|_| ann.timestamp.to_string());
            format!(
                "{short}  {when}  session {}  tools: {}",
                ann.session_id,
                ann.tools_used.join(", ")
            )
        })
        .collect()
}

/// Directory relative backup paths resolve against: the working tree root,
/// or `repo_root` outside a repository.
fn backup_base(git: &GitCli, repo_root: &Path) -> PathBuf {
    git.top_level().unwrap_or_else(|| repo_root.to_path_buf())
}

/// `convnotes backup [file]`
pub fn backup(repo_root: &Path, file: Option<&Path>) -> anyhow::Result<()> {
    let (store, _) = git_store(repo_root);
    let base = backup_base(store.backend(), repo_root);
    let path = backup_path(&base, file, OffsetDateTime::now_utc());
    let count = backup_to(&store, &path)?;
    println!("Backed up {count} conversation notes to {}", path.display());
    Ok(())
}

fn backup_path(base: &Path, file: Option<&Path>, now: OffsetDateTime) -> PathBuf {
    match file {
        Some(f) => resolve_backup_path(base, f),
        None => base.join(default_backup_filename(now)),
    }
}

fn backup_to<B: NotesBackend>(store: &NotesStore<B>, path: &Path) -> anyhow::Result<usize> {
    let backup = store.backup().context("reading notes")?;
    save_backup(path, &backup)?;
    Ok(backup.len())
}

/// `convnotes restore <file>`
pub fn restore(repo_root: &Path, file: &Path) -> anyhow::Result<()> {
    let (store, _) = git_store(repo_root);
    let path = resolve_backup_path(&backup_base(store.backend(), repo_root), file);
    let report = restore_from(&store, &path)?;
    println!(
        "Restore complete: {} restored, {} skipped",
        report.restored, report.skipped
    );
    Ok(())
}

fn restore_from<B: NotesBackend>(
    store: &NotesStore<B>,
    path: &Path,
) -> anyhow::Result<RestoreReport> {
    let backup = load_backup(path)?;
    let created = backup
        .backup_time
        .format(BACKUP_TIME)
        .unwrap_or_else(|_| backup.backup_time.to_string());
    println!(
        "Loaded {} ({} notes from {}, created {created})",
        path.display(),
        backup.len(),
        backup.notes_ref
    );
    if backup.notes_ref != store.notes_ref() {
        tracing::warn!(
            backup_ref = %backup.notes_ref,
            target_ref = %store.notes_ref(),
            "backup was taken from a different notes ref"
        );
    }
    store
        .restore(&backup)
        .context("restore stopped on a failed write")
}
