use clap::Subcommand;
use convnotes_core::fs::write_atomic;
use convnotes_core::NotesConfig;
use std::path::Path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. max_excerpt_length)
        key: String,
        /// Config value (true/false/number/string, or a JSON array)
        value: String,
    },
    /// Get the effective value of a config key
    Get {
        /// Config key
        key: String,
    },
    /// List all effective config values
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, repo_root: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => {
            set(repo_root, &key, &value)?;
            println!("{key} = {value}");
            Ok(())
        }
        ConfigCmd::Get { key } => {
            println!("{}", get(repo_root, &key)?);
            Ok(())
        }
        ConfigCmd::List => {
            for (k, v) in effective(repo_root)? {
                println!("{k} = {v}");
            }
            Ok(())
        }
    }
}

// ── Command Implementations ──

/// Raw settings from `.claude/notes.json`. Empty if the file doesn't exist.
fn read_config(path: &Path) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    if !path.exists() {
        return Ok(serde_json::Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    let val: serde_json::Value = serde_json::from_str(&content)?;
    match val {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

/// Parse a string value into an appropriate JSON value (bool/number/array/string).
fn parse_value(s: &str) -> serde_json::Value {
    match s {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        _ if s.starts_with('[') => serde_json::from_str(s)
            .unwrap_or_else(|_| serde_json::Value::String(s.to_string())),
        _ => {
            if let Ok(n) = s.parse::<u64>() {
                serde_json::Value::Number(n.into())
            } else {
                serde_json::Value::String(s.to_string())
            }
        }
    }
}

fn known_keys() -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    match serde_json::to_value(NotesConfig::default())? {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("config does not serialize to an object"),
    }
}

/// `convnotes config set <key> <value>`
pub fn set(repo_root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    if !known_keys()?.contains_key(key) {
        anyhow::bail!("unknown config key: {key}");
    }
    let path = NotesConfig::path(repo_root);
    let mut config = read_config(&path)?;
    config.insert(key.to_string(), parse_value(value));
    let json = serde_json::to_string_pretty(&config)?;
    // Refuse values the hook would reject and silently replace with defaults.
    NotesConfig::from_json(&json).map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}"))?;
    write_atomic(&path, json.as_bytes())
}

/// `convnotes config get <key>`
pub fn get(repo_root: &Path, key: &str) -> anyhow::Result<serde_json::Value> {
    effective(repo_root)?
        .remove(key)
        .ok_or_else(|| anyhow::anyhow!("unknown config key: {key}"))
}

/// Effective settings: file values over defaults.
fn effective(repo_root: &Path) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    match serde_json::to_value(NotesConfig::load(repo_root))? {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("config does not serialize to an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_value_types() {
        assert_eq!(parse_value("true"), serde_json::json!(true));
        assert_eq!(parse_value("1200"), serde_json::json!(1200));
        assert_eq!(parse_value("team-notes"), serde_json::json!("team-notes"));
        assert_eq!(
            parse_value(r#"["acme","internal"]"#),
            serde_json::json!(["acme", "internal"])
        );
    }

    #[test]
    fn set_then_get() {
        let tmp = tempfile::tempdir().unwrap();
        set(tmp.path(), "max_excerpt_length", "1200").unwrap();
        set(tmp.path(), "exclude_patterns", r#"["acme-internal"]"#).unwrap();
        assert_eq!(get(tmp.path(), "max_excerpt_length").unwrap(), 1200);
        let cfg = NotesConfig::load(tmp.path());
        assert_eq!(cfg.max_excerpt_length, 1200);
        assert_eq!(cfg.exclude_patterns, vec!["acme-internal"]);
        assert_eq!(get(tmp.path(), "notes_ref").unwrap(), "claude-conversations");
    }

    #[test]
    fn rejects_unknown_key_and_bad_type() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(set(tmp.path(), "no_such_key", "1").is_err());
        assert!(set(tmp.path(), "enabled", "sometimes").is_err());
        assert!(!NotesConfig::path(tmp.path()).exists());
        assert!(get(tmp.path(), "no_such_key").is_err());
    }
}
