//! Action logging for MiniTasks commands.
//!
//! Every `mt` invocation is appended as one JSONL line to a shared
//! `action.log`, giving an audit trail across workspaces. Logging must
//! never break a command: all failures here degrade to a warning on
//! stderr at worst.

use crate::storage::Storage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One logged command invocation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionEntry {
    /// When the command ran
    pub timestamp: DateTime<Utc>,

    /// Workspace the command targeted
    pub workspace: String,

    /// Command name (e.g., "task create", "recur sweep")
    pub command: String,

    /// Command arguments as JSON, sanitized unless disabled
    pub args: serde_json::Value,

    /// Whether the command succeeded
    pub success: bool,

    /// Error message when it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,

    /// User who ran the command
    pub user: String,
}

/// Append one entry to the action log.
///
/// Controlled by the `action_log_enabled` and `action_log_sanitize` config
/// keys, both defaulting to true. Never fails: config or IO problems are
/// reported as warnings and the command's own result stands.
pub fn log_action(
    workspace: &Path,
    command: &str,
    args: serde_json::Value,
    success: bool,
    error: Option<String>,
    duration_ms: u64,
) {
    if !config_flag(workspace, "action_log_enabled") {
        return;
    }

    let args = if config_flag(workspace, "action_log_sanitize") {
        sanitize_args(&args)
    } else {
        args
    };

    let entry = ActionEntry {
        timestamp: Utc::now(),
        workspace: workspace.to_string_lossy().to_string(),
        command: command.to_string(),
        args,
        success,
        error,
        duration_ms,
        user: current_user(),
    };

    if let Err(e) = append_entry(&log_path(), &entry) {
        eprintln!("Warning: failed to write action log: {}", e);
    }
}

/// The shared log file, next to the per-workspace storage directories.
/// `MT_DATA_DIR` relocates it along with the rest of the data tree.
fn log_path() -> PathBuf {
    let base = match std::env::var("MT_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("minitasks"),
    };
    base.join("action.log")
}

fn append_entry(path: &Path, entry: &ActionEntry) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(entry).map_err(std::io::Error::other)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", json)
}

/// Read a boolean config flag for the workspace; missing keys and any
/// read error both mean "on".
fn config_flag(workspace: &Path, key: &str) -> bool {
    let value = Storage::open(workspace)
        .ok()
        .and_then(|s| s.get_config(key).ok().flatten());
    match value {
        Some(v) => {
            let v = v.to_lowercase();
            v == "true" || v == "1" || v == "yes"
        }
        None => true,
    }
}

/// Strip likely-sensitive material from logged arguments: redact
/// credential-looking keys, reduce paths to basenames, truncate long
/// strings, and summarize big arrays.
fn sanitize_args(args: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match args {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let lower = key.to_lowercase();
                    let redact = lower.contains("password")
                        || lower.contains("token")
                        || lower.contains("secret");
                    let sanitized = if redact {
                        Value::String("[REDACTED]".to_string())
                    } else {
                        sanitize_args(value)
                    };
                    (key.clone(), sanitized)
                })
                .collect(),
        ),
        Value::Array(arr) if arr.len() > 10 => {
            Value::String(format!("[Array with {} items]", arr.len()))
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_args).collect()),
        Value::String(s) => Value::String(sanitize_string(s)),
        _ => args.clone(),
    }
}

fn sanitize_string(s: &str) -> String {
    let basename = if s.contains('/') || s.contains('\\') {
        s.rsplit(['/', '\\']).next().unwrap_or(s)
    } else {
        s
    };
    if basename.len() > 100 {
        format!("{}... ({} chars)", &basename[..97], basename.len())
    } else {
        basename.to_string()
    }
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
