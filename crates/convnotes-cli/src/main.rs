mod cmd_config;
mod cmd_hook;
mod cmd_notes;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "convnotes",
    version,
    about = "Attach Claude Code conversations to git commits as notes"
)]
struct Cli {
    /// Log at debug level (overrides CONVNOTES_LOG)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Claude Code hook: read the event from stdin, print the decision
    Hook,
    /// Show the conversation attached to a commit as Markdown
    Show {
        /// Commit to show (default: HEAD)
        #[arg(default_value = "HEAD")]
        commit: String,
        /// Print the raw note JSON instead
        #[arg(long)]
        json: bool,
    },
    /// List commits that carry conversation notes
    List,
    /// Write every conversation note to a JSON file
    Backup {
        /// Output file (default: .claude-notes-backup-<timestamp>.json in the repo root)
        file: Option<PathBuf>,
    },
    /// Re-attach notes from a backup file, skipping commits that already have one
    Restore {
        /// Backup file written by `convnotes backup`
        file: PathBuf,
    },
    /// Read or change .claude/notes.json
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

const LOG_ENV: &str = "CONVNOTES_LOG";

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // Hook stdout carries the decision JSON, so logs go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    let repo_root = std::env::current_dir()?;

    match cli.cmd {
        Command::Hook => cmd_hook::execute(),
        Command::Show { commit, json } => cmd_notes::show(&repo_root, &commit, json),
        Command::List => cmd_notes::list(&repo_root),
        Command::Backup { file } => cmd_notes::backup(&repo_root, file.as_deref()),
        Command::Restore { file } => cmd_notes::restore(&repo_root, &file),
        Command::Config { cmd } => cmd_config::run(cmd, &repo_root),
    }
}
