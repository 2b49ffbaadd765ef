//! Storage layer for MiniTasks data.
//!
//! Persistence is one append-only JSONL file per entity under a per-workspace
//! data directory:
//!
//! - `tasks.jsonl`, `sprints.jsonl`, `projects.jsonl`, `users.jsonl`,
//!   `comments.jsonl` - entity records; updates append the full new record
//!   and the latest line wins on replay
//! - deletes append a tombstone line (`{"type": "tombstone", "id": ...}`)
//! - `config.jsonl` - key/value configuration, last write wins
//!
//! The data directory lives at `~/.local/share/minitasks/<workspace-hash>/`
//! (overridable via `MT_DATA_DIR`). `mt system compact` rewrites each file
//! down to the latest live records.

use crate::models::{
    Comment, Frequency, Project, Role, Sprint, SprintStatus, Task, TaskStatus, User,
};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Entity files managed by the store.
const ENTITY_FILES: [&str; 5] = [
    "tasks.jsonl",
    "sprints.jsonl",
    "projects.jsonl",
    "users.jsonl",
    "comments.jsonl",
];

/// A record that lives in one of the JSONL entity files.
trait Record: Serialize + DeserializeOwned {
    /// File the record is persisted in.
    const FILE: &'static str;

    /// Human-facing entity name for error messages.
    const KIND: &'static str;

    fn record_id(&self) -> &str;
}

impl Record for Task {
    const FILE: &'static str = "tasks.jsonl";
    const KIND: &'static str = "Task";
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for Sprint {
    const FILE: &'static str = "sprints.jsonl";
    const KIND: &'static str = "Sprint";
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for Project {
    const FILE: &'static str = "projects.jsonl";
    const KIND: &'static str = "Project";
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for User {
    const FILE: &'static str = "users.jsonl";
    const KIND: &'static str = "User";
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for Comment {
    const FILE: &'static str = "comments.jsonl";
    const KIND: &'static str = "Comment";
    fn record_id(&self) -> &str {
        &self.id
    }
}

/// Tombstone line appended on delete.
#[derive(Debug, Serialize, Deserialize)]
struct Tombstone {
    #[serde(rename = "type")]
    entity_type: String,
    id: String,
}

/// A key/value config line.
#[derive(Debug, Serialize, Deserialize)]
struct ConfigEntry {
    key: String,
    value: String,
}

/// Storage manager for a single workspace.
pub struct Storage {
    /// Root directory for this workspace's data
    pub root: PathBuf,
}

impl Storage {
    /// Open storage for the given workspace path.
    pub fn open(workspace_path: &Path) -> Result<Self> {
        let root = get_storage_dir(workspace_path)?;
        if !root.exists() {
            return Err(Error::NotInitialized);
        }
        Ok(Self { root })
    }

    /// Initialize storage for a new workspace.
    pub fn init(workspace_path: &Path) -> Result<Self> {
        let root = get_storage_dir(workspace_path)?;
        Self::init_at(root)
    }

    /// Check if storage exists for the given workspace.
    pub fn exists(workspace_path: &Path) -> Result<bool> {
        let root = get_storage_dir(workspace_path)?;
        Ok(root.exists() && root.join("tasks.jsonl").exists())
    }

    /// Open storage rooted under an explicit data directory (DI for tests).
    pub fn open_with_data_dir(workspace_path: &Path, data_dir: &Path) -> Result<Self> {
        let root = storage_dir_under(workspace_path, data_dir)?;
        if !root.exists() {
            return Err(Error::NotInitialized);
        }
        Ok(Self { root })
    }

    /// Initialize storage under an explicit data directory (DI for tests).
    pub fn init_with_data_dir(workspace_path: &Path, data_dir: &Path) -> Result<Self> {
        let root = storage_dir_under(workspace_path, data_dir)?;
        Self::init_at(root)
    }

    /// Check for storage under an explicit data directory (DI for tests).
    pub fn exists_with_data_dir(workspace_path: &Path, data_dir: &Path) -> Result<bool> {
        let root = storage_dir_under(workspace_path, data_dir)?;
        Ok(root.exists() && root.join("tasks.jsonl").exists())
    }

    fn init_at(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        for file in ENTITY_FILES {
            let path = root.join(file);
            if !path.exists() {
                File::create(&path)?;
            }
        }
        Ok(Self { root })
    }

    // === Generic JSONL plumbing ===

    /// Replay a JSONL file into the latest live version of each record,
    /// preserving first-seen order.
    fn replay<T: Record>(&self) -> Result<Vec<T>> {
        let path = self.root.join(T::FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        let reader = BufReader::new(file);

        let mut order: Vec<String> = Vec::new();
        let mut latest: HashMap<String, T> = HashMap::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(tomb) = serde_json::from_str::<Tombstone>(&line) {
                if tomb.entity_type == "tombstone" {
                    latest.remove(&tomb.id);
                    order.retain(|id| id != &tomb.id);
                    continue;
                }
            }
            if let Ok(record) = serde_json::from_str::<T>(&line) {
                let id = record.record_id().to_string();
                if latest.insert(id.clone(), record).is_none() {
                    order.push(id);
                }
            }
        }

        Ok(order.into_iter().filter_map(|id| latest.remove(&id)).collect())
    }

    /// Append one record line to its JSONL file.
    fn append<T: Record>(&mut self, record: &T) -> Result<()> {
        let path = self.root.join(T::FILE);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let json = serde_json::to_string(record)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    fn create<T: Record>(&mut self, record: &T) -> Result<()> {
        // Appends are last-write-wins on replay, so an ID collision would
        // silently swallow the earlier record. Reject it instead.
        if self.get::<T>(record.record_id()).is_ok() {
            return Err(Error::AlreadyExists(format!(
                "{} {}",
                T::KIND,
                record.record_id()
            )));
        }
        self.append(record)
    }

    fn get<T: Record>(&self, id: &str) -> Result<T> {
        self.replay::<T>()?
            .into_iter()
            .find(|r| r.record_id() == id)
            .ok_or_else(|| Error::NotFound(format!("{} not found: {}", T::KIND, id)))
    }

    fn update<T: Record>(&mut self, record: &T) -> Result<()> {
        // Verify the record exists before appending the new version
        self.get::<T>(record.record_id())?;
        self.append(record)
    }

    fn delete<T: Record>(&mut self, id: &str) -> Result<()> {
        self.get::<T>(id)?;
        let tomb = Tombstone {
            entity_type: "tombstone".to_string(),
            id: id.to_string(),
        };
        let path = self.root.join(T::FILE);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let json = serde_json::to_string(&tomb)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    // === Task operations ===

    /// Create a new task.
    pub fn create_task(&mut self, task: &Task) -> Result<()> {
        self.create(task)
    }

    /// Get a task by ID.
    pub fn get_task(&self, id: &str) -> Result<Task> {
        self.get(id)
    }

    /// List all live tasks, optionally filtered.
    pub fn list_tasks(
        &self,
        status: Option<TaskStatus>,
        project_id: Option<&str>,
        sprint_id: Option<&str>,
    ) -> Result<Vec<Task>> {
        let tasks = self.replay::<Task>()?;
        Ok(tasks
            .into_iter()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .filter(|t| project_id.is_none() || t.project_id.as_deref() == project_id)
            .filter(|t| sprint_id.is_none() || t.sprint_id.as_deref() == sprint_id)
            .collect())
    }

    /// Update a task (appends the new version).
    pub fn update_task(&mut self, task: &Task) -> Result<()> {
        self.update(task)
    }

    /// Delete a task by ID.
    pub fn delete_task(&mut self, id: &str) -> Result<()> {
        self.delete::<Task>(id)
    }

    /// All live instances generated from the given template.
    pub fn list_instances_of(&self, template_id: &str) -> Result<Vec<Task>> {
        let tasks = self.replay::<Task>()?;
        Ok(tasks
            .into_iter()
            .filter(|t| t.parent_task_id.as_deref() == Some(template_id))
            .collect())
    }

    // === Sprint operations ===

    /// Create a new sprint.
    pub fn create_sprint(&mut self, sprint: &Sprint) -> Result<()> {
        self.create(sprint)
    }

    /// Get a sprint by ID.
    pub fn get_sprint(&self, id: &str) -> Result<Sprint> {
        self.get(id)
    }

    /// List all live sprints, sorted by ascending order then id.
    pub fn list_sprints(&self, status: Option<SprintStatus>) -> Result<Vec<Sprint>> {
        let mut sprints: Vec<Sprint> = self
            .replay::<Sprint>()?
            .into_iter()
            .filter(|s| status.map_or(true, |want| s.status == want))
            .collect();
        sprints.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(sprints)
    }

    /// Update a sprint (appends the new version).
    pub fn update_sprint(&mut self, sprint: &Sprint) -> Result<()> {
        self.update(sprint)
    }

    /// Delete a sprint by ID. Callers must first clear `sprint_id` on
    /// referencing tasks (see `commands::sprint_delete`).
    pub fn delete_sprint(&mut self, id: &str) -> Result<()> {
        self.delete::<Sprint>(id)
    }

    // === Project operations ===

    /// Create a new project.
    pub fn create_project(&mut self, project: &Project) -> Result<()> {
        self.create(project)
    }

    /// Get a project by ID.
    pub fn get_project(&self, id: &str) -> Result<Project> {
        self.get(id)
    }

    /// List all live projects.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        self.replay()
    }

    /// Delete a project by ID.
    pub fn delete_project(&mut self, id: &str) -> Result<()> {
        self.delete::<Project>(id)
    }

    // === User operations ===

    /// Create a new user.
    pub fn create_user(&mut self, user: &User) -> Result<()> {
        self.create(user)
    }

    /// Get a user by ID.
    pub fn get_user(&self, id: &str) -> Result<User> {
        self.get(id)
    }

    /// List all live users.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.replay()
    }

    // === Comment operations ===

    /// Create a new comment.
    pub fn create_comment(&mut self, comment: &Comment) -> Result<()> {
        self.create(comment)
    }

    /// List live comments, optionally restricted to one task.
    pub fn list_comments(&self, task_id: Option<&str>) -> Result<Vec<Comment>> {
        let comments = self.replay::<Comment>()?;
        Ok(comments
            .into_iter()
            .filter(|c| task_id.map_or(true, |tid| c.task_id == tid))
            .collect())
    }

    /// Delete a comment by ID.
    pub fn delete_comment(&mut self, id: &str) -> Result<()> {
        self.delete::<Comment>(id)
    }

    // === Configuration ===

    /// Get a configuration value.
    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let path = self.root.join("config.jsonl");
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        let mut value = None;
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(entry) = serde_json::from_str::<ConfigEntry>(&line) {
                if entry.key == key {
                    value = Some(entry.value);
                }
            }
        }
        Ok(value)
    }

    /// Set a configuration value.
    pub fn set_config(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.root.join("config.jsonl");
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let entry = ConfigEntry {
            key: key.to_string(),
            value: value.to_string(),
        };
        writeln!(file, "{}", serde_json::to_string(&entry)?)?;
        Ok(())
    }

    /// List all configuration key/value pairs (latest value per key).
    pub fn list_config(&self) -> Result<Vec<(String, String)>> {
        let path = self.root.join("config.jsonl");
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        let mut order: Vec<String> = Vec::new();
        let mut latest: HashMap<String, String> = HashMap::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(entry) = serde_json::from_str::<ConfigEntry>(&line) {
                if latest.insert(entry.key.clone(), entry.value).is_none() {
                    order.push(entry.key);
                }
            }
        }
        Ok(order
            .into_iter()
            .filter_map(|k| latest.remove(&k).map(|v| (k, v)))
            .collect())
    }

    // === Maintenance ===

    /// Rewrite every entity file down to the latest live records.
    ///
    /// Returns the number of lines dropped across all files.
    pub fn compact(&mut self) -> Result<u64> {
        let mut dropped = 0;
        dropped += self.compact_file::<Task>()?;
        dropped += self.compact_file::<Sprint>()?;
        dropped += self.compact_file::<Project>()?;
        dropped += self.compact_file::<User>()?;
        dropped += self.compact_file::<Comment>()?;
        Ok(dropped)
    }

    fn compact_file<T: Record>(&mut self) -> Result<u64> {
        let path = self.root.join(T::FILE);
        if !path.exists() {
            return Ok(0);
        }

        let before = BufReader::new(File::open(&path)?)
            .lines()
            .filter(|l| l.as_ref().map(|s| !s.trim().is_empty()).unwrap_or(false))
            .count() as u64;

        let live = self.replay::<T>()?;
        let after = live.len() as u64;

        // Write to a temp file then rename for an atomic-ish swap
        let tmp = path.with_extension("jsonl.tmp");
        {
            let mut file = File::create(&tmp)?;
            for record in &live {
                writeln!(file, "{}", serde_json::to_string(record)?)?;
            }
            file.flush()?;
        }
        fs::rename(&tmp, &path)?;

        Ok(before.saturating_sub(after))
    }
}

/// Get the storage directory for a workspace.
///
/// Uses a hash of the workspace path to create a unique directory under
/// `~/.local/share/minitasks/` (or `$MT_DATA_DIR` when set).
pub fn get_storage_dir(workspace_path: &Path) -> Result<PathBuf> {
    let data_dir = match std::env::var_os("MT_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?
            .join("minitasks"),
    };
    storage_dir_under(workspace_path, &data_dir)
}

/// Compute the per-workspace directory under an explicit data root.
fn storage_dir_under(workspace_path: &Path, data_dir: &Path) -> Result<PathBuf> {
    let canonical = workspace_path
        .canonicalize()
        .map_err(|e| Error::Other(format!("Could not canonicalize workspace path: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    let hash = hasher.finalize();
    let hash_hex = format!("{:x}", hash);

    Ok(data_dir.join(&hash_hex[..12]))
}

/// Generate a unique ID for an entity.
///
/// Format: `<prefix>-<4 hex chars>`
/// - Task prefix: "mt"
/// - Sprint prefix: "mts"
/// - Project prefix: "mtp"
/// - User prefix: "mtu"
/// - Comment prefix: "mtc"
pub fn generate_id(prefix: &str, seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or(0)
            .to_le_bytes(),
    );
    let hash = hasher.finalize();
    let hash_hex = format!("{:x}", hash);
    format!("{}-{}", prefix, &hash_hex[..4])
}

/// Validate that an ID matches the expected format.
pub fn validate_id(id: &str, prefix: &str) -> Result<()> {
    let Some(suffix) = id.strip_prefix(prefix).and_then(|s| s.strip_prefix('-')) else {
        return Err(Error::InvalidId(format!(
            "ID must start with '{}-', got: {}",
            prefix, id
        )));
    };

    if suffix.len() != 4 || !suffix.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidId(format!(
            "ID suffix must be 4 hex characters, got: {}",
            suffix
        )));
    }

    Ok(())
}

/// Parse a status string into TaskStatus.
pub fn parse_status(s: &str) -> Result<TaskStatus> {
    match s.to_lowercase().as_str() {
        "created" => Ok(TaskStatus::Created),
        "in_progress" | "in-progress" | "inprogress" => Ok(TaskStatus::InProgress),
        "paused" => Ok(TaskStatus::Paused),
        "cancelled" | "canceled" => Ok(TaskStatus::Cancelled),
        "completed" | "done" => Ok(TaskStatus::Completed),
        _ => Err(Error::InvalidInput(format!("Invalid status: {}", s))),
    }
}

/// Parse a sprint status string.
pub fn parse_sprint_status(s: &str) -> Result<SprintStatus> {
    match s.to_lowercase().as_str() {
        "pending" => Ok(SprintStatus::Pending),
        "active" => Ok(SprintStatus::Active),
        "completed" => Ok(SprintStatus::Completed),
        _ => Err(Error::InvalidInput(format!("Invalid sprint status: {}", s))),
    }
}

/// Parse a recurrence frequency string.
pub fn parse_frequency(s: &str) -> Result<Frequency> {
    match s.to_lowercase().as_str() {
        "daily" => Ok(Frequency::Daily),
        "weekly" => Ok(Frequency::Weekly),
        "monthly" => Ok(Frequency::Monthly),
        _ => Err(Error::InvalidInput(format!("Invalid frequency: {}", s))),
    }
}

/// Parse a user role string.
pub fn parse_role(s: &str) -> Result<Role> {
    match s.to_lowercase().as_str() {
        "admin" => Ok(Role::Admin),
        "client" => Ok(Role::Client),
        _ => Err(Error::InvalidInput(format!("Invalid role: {}", s))),
    }
}
