//! Command implementations for the MiniTasks CLI.
//!
//! Each function here is the business logic behind one `mt` subcommand:
//! it opens storage for the workspace, performs the operation, and returns
//! a result type implementing [`Output`] so `main` can print it as JSON
//! (default, for tooling) or human-readable text (`--human`).
//!
//! Commands are organized by entity:
//! - `system_*` - init, compact, build info
//! - `task_*` / `subtask_*` - task CRUD, checklists, time logging
//! - `project_*`, `sprint_*`, `user_*`, `comment_*`
//! - `recur_sweep` - recurring-task horizon sweep
//! - `config_*` - workspace configuration

use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;

use crate::clock::{Clock, SystemClock};
use crate::models::{
    Comment, Project, Role, Sprint, SprintStatus, Subtask, Task, TaskStatus, TimeEntry, User,
};
use crate::recurrence::{self, SweepReport, DEFAULT_HORIZON_DAYS};
use crate::sprint;
use crate::storage::{self, Storage};
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

// === System commands ===

/// Result of `mt system init`.
#[derive(Debug, Serialize)]
pub struct InitResult {
    pub initialized: bool,
    pub already_existed: bool,
    pub storage_path: String,
}

impl Output for InitResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.already_existed {
            format!("Storage already initialized at {}", self.storage_path)
        } else {
            format!("Initialized minitasks storage at {}", self.storage_path)
        }
    }
}

/// Initialize minitasks storage for a workspace. Idempotent.
pub fn system_init(workspace: &Path) -> Result<InitResult> {
    let already_existed = Storage::exists(workspace)?;
    let storage = Storage::init(workspace)?;
    Ok(InitResult {
        initialized: true,
        already_existed,
        storage_path: storage.root.display().to_string(),
    })
}

/// Result of `mt system compact`.
#[derive(Debug, Serialize)]
pub struct CompactResult {
    pub lines_dropped: u64,
}

impl Output for CompactResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Compacted storage: dropped {} stale lines", self.lines_dropped)
    }
}

/// Rewrite every entity file keeping only the latest live version of each
/// record.
pub fn system_compact(workspace: &Path) -> Result<CompactResult> {
    let mut storage = Storage::open(workspace)?;
    let lines_dropped = storage.compact()?;
    Ok(CompactResult { lines_dropped })
}

/// Result of `mt system build-info`.
#[derive(Debug, Serialize)]
pub struct BuildInfoResult {
    pub version: String,
    pub git_commit: String,
    pub build_timestamp: String,
}

impl Output for BuildInfoResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "minitasks {} ({} built {})",
            self.version, self.git_commit, self.build_timestamp
        )
    }
}

/// Report version and build metadata baked in at compile time.
pub fn system_build_info() -> Result<BuildInfoResult> {
    Ok(BuildInfoResult {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_commit: env!("MT_GIT_COMMIT").to_string(),
        build_timestamp: env!("MT_BUILD_TIMESTAMP").to_string(),
    })
}

/// Result of `mt status`.
#[derive(Debug, Serialize)]
pub struct StatusResult {
    pub storage_path: String,
    pub tasks: usize,
    pub templates: usize,
    pub projects: usize,
    pub sprints: usize,
    pub active_sprints: Vec<String>,
    pub users: usize,
    pub comments: usize,
}

impl Output for StatusResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!(
            "Storage: {}\nTasks: {} ({} templates)\nProjects: {}\nSprints: {}\nUsers: {}\nComments: {}",
            self.storage_path,
            self.tasks,
            self.templates,
            self.projects,
            self.sprints,
            self.users,
            self.comments
        );
        if !self.active_sprints.is_empty() {
            out.push_str(&format!("\nActive sprints: {}", self.active_sprints.join(", ")));
        }
        out
    }
}

/// Summarize the workspace: entity counts and active sprints.
pub fn status(workspace: &Path) -> Result<StatusResult> {
    let storage = Storage::open(workspace)?;
    let tasks = storage.list_tasks(None, None, None)?;
    let sprints = storage.list_sprints(None)?;
    let templates = tasks.iter().filter(|t| t.is_template()).count();
    let active_sprints = sprints
        .iter()
        .filter(|s| s.status == SprintStatus::Active)
        .map(|s| format!("{} ({})", s.name, s.id))
        .collect();
    Ok(StatusResult {
        storage_path: storage.root.display().to_string(),
        tasks: tasks.len(),
        templates,
        projects: storage.list_projects()?.len(),
        sprints: sprints.len(),
        active_sprints,
        users: storage.list_users()?.len(),
        comments: storage.list_comments(None)?.len(),
    })
}

// === Task commands ===

/// Fields accepted by `mt task create` and `mt task update`.
///
/// On update, `None` means "leave unchanged"; there is no way to clear a
/// field through this surface yet.
#[derive(Debug, Default)]
pub struct TaskParams {
    pub description: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub project_id: Option<String>,
    pub sprint_id: Option<String>,
    pub assignee_id: Option<String>,
    pub frequency: Option<String>,
    pub interval: Option<u32>,
    pub days_of_week: Option<Vec<u8>>,
    pub recur_end_date: Option<NaiveDate>,
    pub end_after_occurrences: Option<u32>,
}

/// A single task, as returned by create/show/update.
#[derive(Debug, Serialize)]
pub struct TaskResult {
    #[serde(flatten)]
    pub task: Task,
    pub total_minutes: u64,
    /// Instances generated so far, when the task is a template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_count: Option<usize>,
}

impl Output for TaskResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let t = &self.task;
        let mut out = format!("[{}] {} ({})", t.id, t.title, t.status);
        if let Some(desc) = &t.description {
            out.push_str(&format!("\n  {}", desc));
        }
        if let (Some(start), Some(end)) = (t.start_date, t.end_date) {
            out.push_str(&format!("\n  Scheduled: {} .. {}", start, end));
        } else if let Some(start) = t.start_date {
            out.push_str(&format!("\n  Scheduled: {}", start));
        }
        if let Some(project) = &t.project_id {
            out.push_str(&format!("\n  Project: {}", project));
        }
        if let Some(sprint) = &t.sprint_id {
            out.push_str(&format!("\n  Sprint: {}", sprint));
        }
        if let Some(assignee) = &t.assignee_id {
            out.push_str(&format!("\n  Assignee: {}", assignee));
        }
        if let (Some(rec), true) = (&t.recurrence, t.is_recurring) {
            out.push_str(&format!(
                "\n  Recurs: every {} {}",
                rec.interval, rec.frequency
            ));
            if let Some(count) = self.instance_count {
                out.push_str(&format!(" ({} instances generated)", count));
            }
        }
        if let Some(parent) = &t.parent_task_id {
            out.push_str(&format!("\n  Instance of: {}", parent));
        }
        for sub in &t.subtasks {
            let mark = if sub.completed { "x" } else { " " };
            out.push_str(&format!("\n  [{}] {} ({})", mark, sub.text, sub.id));
        }
        if self.total_minutes > 0 {
            out.push_str(&format!("\n  Time logged: {} min", self.total_minutes));
        }
        out
    }
}

fn task_result(storage: &Storage, task: Task) -> Result<TaskResult> {
    let instance_count = if task.is_template() {
        Some(storage.list_instances_of(&task.id)?.len())
    } else {
        None
    };
    Ok(TaskResult {
        total_minutes: task.total_minutes(),
        instance_count,
        task,
    })
}

fn apply_task_params(storage: &Storage, task: &mut Task, params: TaskParams) -> Result<()> {
    if let Some(description) = params.description {
        task.description = Some(description);
    }
    if let Some(status) = params.status {
        task.status = storage::parse_status(&status)?;
    }
    if let Some(start) = params.start_date {
        task.start_date = Some(start);
    }
    if let Some(end) = params.end_date {
        task.end_date = Some(end);
    }
    if let Some(project_id) = params.project_id {
        storage.get_project(&project_id)?;
        task.project_id = Some(project_id);
    }
    if let Some(sprint_id) = params.sprint_id {
        storage.get_sprint(&sprint_id)?;
        task.sprint_id = Some(sprint_id);
    }
    if let Some(assignee_id) = params.assignee_id {
        storage.get_user(&assignee_id)?;
        task.assignee_id = Some(assignee_id);
    }
    if let Some(frequency) = params.frequency {
        let frequency = storage::parse_frequency(&frequency)?;
        if task.start_date.is_none() {
            return Err(Error::InvalidInput(
                "recurring tasks require a start date".to_string(),
            ));
        }
        if let Some(days) = &params.days_of_week {
            if days.iter().any(|d| *d > 6) {
                return Err(Error::InvalidInput(
                    "days of week must be 0 (Sunday) through 6 (Saturday)".to_string(),
                ));
            }
        }
        task.is_recurring = true;
        task.recurrence = Some(crate::models::RecurrenceConfig {
            frequency,
            interval: params.interval.unwrap_or(1).max(1),
            days_of_week: params.days_of_week,
            end_date: params.recur_end_date,
            end_after_occurrences: params.end_after_occurrences,
        });
    }
    Ok(())
}

/// Create a task.
pub fn task_create(workspace: &Path, title: &str, params: TaskParams) -> Result<TaskResult> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("task title must not be empty".to_string()));
    }
    let mut storage = Storage::open(workspace)?;
    let clock = SystemClock;
    let mut task = Task::new(storage::generate_id("mt", title), title.to_string(), clock.now());
    apply_task_params(&storage, &mut task, params)?;
    storage.create_task(&task)?;
    task_result(&storage, task)
}

/// One row of `mt task list`.
#[derive(Debug, Serialize)]
pub struct TaskSummary {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<String>,
    pub is_recurring: bool,
}

impl From<Task> for TaskSummary {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            title: t.title,
            status: t.status,
            start_date: t.start_date,
            project_id: t.project_id,
            sprint_id: t.sprint_id,
            is_recurring: t.is_recurring,
        }
    }
}

/// Result of `mt task list`.
#[derive(Debug, Serialize)]
pub struct TaskListResult {
    pub tasks: Vec<TaskSummary>,
    pub count: usize,
}

impl Output for TaskListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.tasks.is_empty() {
            return "No tasks found".to_string();
        }
        let mut out = String::new();
        for t in &self.tasks {
            let marker = if t.is_recurring { " (recurring)" } else { "" };
            out.push_str(&format!("[{}] {} - {}{}\n", t.id, t.status, t.title, marker));
        }
        out.push_str(&format!("{} task(s)", self.count));
        out
    }
}

/// List tasks, optionally filtered by status, project, sprint, or
/// template-ness.
pub fn task_list(
    workspace: &Path,
    status: Option<&str>,
    project_id: Option<&str>,
    sprint_id: Option<&str>,
    templates_only: bool,
) -> Result<TaskListResult> {
    let storage = Storage::open(workspace)?;
    let status = status.map(storage::parse_status).transpose()?;
    let tasks = storage.list_tasks(status, project_id, sprint_id)?;
    let tasks: Vec<TaskSummary> = tasks
        .into_iter()
        .filter(|t| !templates_only || t.is_template())
        .map(TaskSummary::from)
        .collect();
    let count = tasks.len();
    Ok(TaskListResult { tasks, count })
}

/// Show one task in full.
pub fn task_show(workspace: &Path, id: &str) -> Result<TaskResult> {
    storage::validate_id(id, "mt")?;
    let storage = Storage::open(workspace)?;
    let task = storage.get_task(id)?;
    task_result(&storage, task)
}

/// Update fields on a task.
pub fn task_update(workspace: &Path, id: &str, params: TaskParams) -> Result<TaskResult> {
    storage::validate_id(id, "mt")?;
    let mut storage = Storage::open(workspace)?;
    let mut task = storage.get_task(id)?;
    apply_task_params(&storage, &mut task, params)?;
    task.updated_at = SystemClock.now();
    storage.update_task(&task)?;
    task_result(&storage, task)
}

/// Result of a delete command, shared across entities.
#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub id: String,
    pub deleted: bool,
}

impl Output for DeleteResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Deleted {}", self.id)
    }
}

/// Delete a task. Generated instances of a deleted template survive; they
/// are real scheduled work, not projections.
pub fn task_delete(workspace: &Path, id: &str) -> Result<DeleteResult> {
    storage::validate_id(id, "mt")?;
    let mut storage = Storage::open(workspace)?;
    storage.delete_task(id)?;
    Ok(DeleteResult {
        id: id.to_string(),
        deleted: true,
    })
}

/// Result of `mt task log-time`.
#[derive(Debug, Serialize)]
pub struct LogTimeResult {
    pub id: String,
    pub minutes_added: u32,
    pub total_minutes: u64,
}

impl Output for LogTimeResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Logged {} min on {} (total {} min)",
            self.minutes_added, self.id, self.total_minutes
        )
    }
}

/// Append a time entry to a task.
pub fn task_log_time(
    workspace: &Path,
    id: &str,
    minutes: u32,
    note: Option<String>,
) -> Result<LogTimeResult> {
    storage::validate_id(id, "mt")?;
    if minutes == 0 {
        return Err(Error::InvalidInput("minutes must be positive".to_string()));
    }
    let mut storage = Storage::open(workspace)?;
    let clock = SystemClock;
    let mut task = storage.get_task(id)?;
    task.time_entries.push(TimeEntry {
        minutes,
        note,
        logged_at: clock.now(),
    });
    task.updated_at = clock.now();
    storage.update_task(&task)?;
    Ok(LogTimeResult {
        id: task.id,
        minutes_added: minutes,
        total_minutes: task.time_entries.iter().map(|e| u64::from(e.minutes)).sum(),
    })
}

// === Subtask commands ===

/// Result of subtask add/toggle.
#[derive(Debug, Serialize)]
pub struct SubtaskResult {
    pub task_id: String,
    pub subtask: Subtask,
}

impl Output for SubtaskResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mark = if self.subtask.completed { "x" } else { " " };
        format!(
            "[{}] {} on {} ({})",
            mark, self.subtask.text, self.task_id, self.subtask.id
        )
    }
}

/// Add a checklist item to a task.
pub fn subtask_add(workspace: &Path, task_id: &str, text: &str) -> Result<SubtaskResult> {
    storage::validate_id(task_id, "mt")?;
    if text.trim().is_empty() {
        return Err(Error::InvalidInput("subtask text must not be empty".to_string()));
    }
    let mut storage = Storage::open(workspace)?;
    let mut task = storage.get_task(task_id)?;
    let subtask = Subtask::new(text);
    task.subtasks.push(subtask.clone());
    task.updated_at = SystemClock.now();
    storage.update_task(&task)?;
    Ok(SubtaskResult {
        task_id: task.id,
        subtask,
    })
}

/// Toggle a checklist item's completion.
pub fn subtask_toggle(
    workspace: &Path,
    task_id: &str,
    subtask_id: &str,
) -> Result<SubtaskResult> {
    storage::validate_id(task_id, "mt")?;
    let mut storage = Storage::open(workspace)?;
    let mut task = storage.get_task(task_id)?;
    let subtask = task
        .subtasks
        .iter_mut()
        .find(|s| s.id == subtask_id)
        .ok_or_else(|| Error::NotFound(format!("subtask {} on {}", subtask_id, task_id)))?;
    subtask.completed = !subtask.completed;
    let result = SubtaskResult {
        task_id: task.id.clone(),
        subtask: subtask.clone(),
    };
    task.updated_at = SystemClock.now();
    storage.update_task(&task)?;
    Ok(result)
}

// === Project commands ===

/// A single project.
#[derive(Debug, Serialize)]
pub struct ProjectResult {
    #[serde(flatten)]
    pub project: Project,
}

impl Output for ProjectResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match &self.project.description {
            Some(desc) => format!("[{}] {} - {}", self.project.id, self.project.name, desc),
            None => format!("[{}] {}", self.project.id, self.project.name),
        }
    }
}

/// Create a project.
pub fn project_create(
    workspace: &Path,
    name: &str,
    description: Option<String>,
) -> Result<ProjectResult> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("project name must not be empty".to_string()));
    }
    let mut storage = Storage::open(workspace)?;
    let mut project = Project::new(
        storage::generate_id("mtp", name),
        name.to_string(),
        SystemClock.now(),
    );
    project.description = description;
    storage.create_project(&project)?;
    Ok(ProjectResult { project })
}

/// Result of `mt project list`.
#[derive(Debug, Serialize)]
pub struct ProjectListResult {
    pub projects: Vec<Project>,
    pub count: usize,
}

impl Output for ProjectListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.projects.is_empty() {
            return "No projects found".to_string();
        }
        let mut out = String::new();
        for p in &self.projects {
            out.push_str(&format!("[{}] {}\n", p.id, p.name));
        }
        out.push_str(&format!("{} project(s)", self.count));
        out
    }
}

/// List all projects.
pub fn project_list(workspace: &Path) -> Result<ProjectListResult> {
    let storage = Storage::open(workspace)?;
    let projects = storage.list_projects()?;
    let count = projects.len();
    Ok(ProjectListResult { projects, count })
}

/// Delete a project, detaching it from tasks and sprints first so no live
/// record keeps a dangling reference.
pub fn project_delete(workspace: &Path, id: &str) -> Result<DeleteResult> {
    storage::validate_id(id, "mtp")?;
    let mut storage = Storage::open(workspace)?;
    storage.get_project(id)?;
    let now = SystemClock.now();

    for mut task in storage.list_tasks(None, Some(id), None)? {
        task.project_id = None;
        task.updated_at = now;
        storage.update_task(&task)?;
    }
    for mut sprint in storage.list_sprints(None)? {
        if sprint.project_ids.iter().any(|p| p == id) {
            sprint.project_ids.retain(|p| p != id);
            storage.update_sprint(&sprint)?;
        }
    }
    storage.delete_project(id)?;
    Ok(DeleteResult {
        id: id.to_string(),
        deleted: true,
    })
}

// === Sprint commands ===

/// A single sprint.
#[derive(Debug, Serialize)]
pub struct SprintResult {
    #[serde(flatten)]
    pub sprint: Sprint,
}

impl Output for SprintResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let s = &self.sprint;
        format!(
            "[{}] {} ({}) {} .. {} order={}",
            s.id, s.name, s.status, s.start_date, s.end_date, s.order
        )
    }
}

/// Create a pending sprint.
///
/// The end date must fall strictly after the start date. When no explicit
/// order is given the sprint is appended after the current maximum.
pub fn sprint_create(
    workspace: &Path,
    name: &str,
    description: Option<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    project_ids: Vec<String>,
    order: Option<i64>,
) -> Result<SprintResult> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("sprint name must not be empty".to_string()));
    }
    if end_date <= start_date {
        return Err(Error::InvalidInput(
            "sprint end date must be after its start date".to_string(),
        ));
    }
    let mut storage = Storage::open(workspace)?;
    for project_id in &project_ids {
        storage.get_project(project_id)?;
    }
    let order = match order {
        Some(order) => order,
        None => storage
            .list_sprints(None)?
            .iter()
            .map(|s| s.order)
            .max()
            .map_or(1, |max| max + 1),
    };
    let mut sprint = Sprint::new(
        storage::generate_id("mts", name),
        name.to_string(),
        start_date,
        end_date,
        order,
        SystemClock.now(),
    );
    sprint.description = description;
    sprint.project_ids = project_ids;
    storage.create_sprint(&sprint)?;
    Ok(SprintResult { sprint })
}

/// Result of `mt sprint list`.
#[derive(Debug, Serialize)]
pub struct SprintListResult {
    pub sprints: Vec<Sprint>,
    pub count: usize,
}

impl Output for SprintListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.sprints.is_empty() {
            return "No sprints found".to_string();
        }
        let mut out = String::new();
        for s in &self.sprints {
            out.push_str(&format!(
                "[{}] {} ({}) {} .. {}\n",
                s.id, s.name, s.status, s.start_date, s.end_date
            ));
        }
        out.push_str(&format!("{} sprint(s)", self.count));
        out
    }
}

/// List sprints in board order, optionally filtered by status.
pub fn sprint_list(workspace: &Path, status: Option<&str>) -> Result<SprintListResult> {
    let storage = Storage::open(workspace)?;
    let status = status.map(storage::parse_sprint_status).transpose()?;
    let sprints = storage.list_sprints(status)?;
    let count = sprints.len();
    Ok(SprintListResult { sprints, count })
}

///// Result of `mt sprint show`: the sprint plus its tasks.
#[derive(Debug, Serialize)]
pub struct SprintShowResult {
    #[serde(flatten)]
    pub sprint: Sprint,
    pub tasks: Vec<TaskSummary>,
}

impl Output for SprintShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let s = &self.sprint;
        let mut out = format!(
            "[{}] {} ({}) {} .. {} order={}",
            s.id, s.name, s.status, s.start_date, s.end_date, s.order
        );
        if let Some(desc) = &s.description {
            out.push_str(&format!("\n  {}", desc));
        }
        if !s.project_ids.is_empty() {
            out.push_str(&format!("\n  Projects: {}", s.project_ids.join(", ")));
        }
        for t in &self.tasks {
            out.push_str(&format!("\n  [{}] {} - {}", t.id, t.status, t.title));
        }
        out
    }
}

/// Show a sprint and the tasks assigned to it.
pub fn sprint_show(workspace: &Path, id: &str) -> Result<SprintShowResult> {
    storage::validate_id(id, "mts")?;
    let storage = Storage::open(workspace)?;
    let sprint = storage.get_sprint(id)?;
    let tasks = storage
        .list_tasks(None, None, Some(id))?
        .into_iter()
        .map(TaskSummary::from)
        .collect();
    Ok(SprintShowResult { sprint, tasks })
}

/// Activate a sprint.
pub fn sprint_activate(workspace: &Path, id: &str) -> Result<SprintResult> {
    storage::validate_id(id, "mts")?;
    let mut storage = Storage::open(workspace)?;
    let sprint = sprint::activate_sprint(&mut storage, id)?;
    Ok(SprintResult { sprint })
}

/// Result of `mt sprint complete`.
#[derive(Debug, Serialize)]
pub struct SprintCompleteResult {
    pub sprint_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successor_id: Option<String>,
    pub moved_task_ids: Vec<String>,
}

impl Output for SprintCompleteResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match &self.successor_id {
            Some(next) => format!(
                "Completed {}: rolled {} task(s) into {}",
                self.sprint_id,
                self.moved_task_ids.len(),
                next
            ),
            None => format!("Completed {} (no successor sprint)", self.sprint_id),
        }
    }
}

/// Complete a sprint and roll its unfinished tasks into the successor.
pub fn sprint_complete(workspace: &Path, id: &str) -> Result<SprintCompleteResult> {
    storage::validate_id(id, "mts")?;
    let mut storage = Storage::open(workspace)?;
    let sprints = storage.list_sprints(None)?;
    let tasks = storage.list_tasks(None, None, None)?;
    let plan = sprint::plan_completion(id, &sprints, &tasks)?;
    sprint::apply_completion(&mut storage, &plan, &SystemClock)?;
    Ok(SprintCompleteResult {
        sprint_id: plan.sprint_id,
        successor_id: plan.successor_id,
        moved_task_ids: plan.task_moves.into_iter().map(|m| m.task_id).collect(),
    })
}

/// Delete a sprint, unassigning its tasks first.
pub fn sprint_delete(workspace: &Path, id: &str) -> Result<DeleteResult> {
    storage::validate_id(id, "mts")?;
    let mut storage = Storage::open(workspace)?;
    storage.get_sprint(id)?;
    let now = SystemClock.now();
    for mut task in storage.list_tasks(None, None, Some(id))? {
        task.sprint_id = None;
        task.updated_at = now;
        storage.update_task(&task)?;
    }
    storage.delete_sprint(id)?;
    Ok(DeleteResult {
        id: id.to_string(),
        deleted: true,
    })
}

// === User commands ===

/// A single user.
#[derive(Debug, Serialize)]
pub struct UserResult {
    #[serde(flatten)]
    pub user: User,
}

impl Output for UserResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("[{}] {} ({})", self.user.id, self.user.name, self.user.role)
    }
}

/// Add a user.
pub fn user_add(workspace: &Path, name: &str, role: Option<&str>) -> Result<UserResult> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("user name must not be empty".to_string()));
    }
    let mut storage = Storage::open(workspace)?;
    let role = role.map(storage::parse_role).transpose()?.unwrap_or(Role::Client);
    let user = User::new(
        storage::generate_id("mtu", name),
        name.to_string(),
        role,
        SystemClock.now(),
    );
    storage.create_user(&user)?;
    Ok(UserResult { user })
}

/// Result of `mt user list`.
#[derive(Debug, Serialize)]
pub struct UserListResult {
    pub users: Vec<User>,
    pub count: usize,
}

impl Output for UserListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.users.is_empty() {
            return "No users found".to_string();
        }
        let mut out = String::new();
        for u in &self.users {
            out.push_str(&format!("[{}] {} ({})\n", u.id, u.name, u.role));
        }
        out.push_str(&format!("{} user(s)", self.count));
        out
    }
}

/// List all users.
pub fn user_list(workspace: &Path) -> Result<UserListResult> {
    let storage = Storage::open(workspace)?;
    let users = storage.list_users()?;
    let count = users.len();
    Ok(UserListResult { users, count })
}

// === Comment commands ===

/// A single comment.
#[derive(Debug, Serialize)]
pub struct CommentResult {
    #[serde(flatten)]
    pub comment: Comment,
}

impl Output for CommentResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let c = &self.comment;
        let author = c.author_id.as_deref().unwrap_or("anonymous");
        format!("[{}] {} on {}: {}", c.id, author, c.task_id, c.body)
    }
}

/// Add a comment to a task.
pub fn comment_add(
    workspace: &Path,
    task_id: &str,
    body: &str,
    author_id: Option<String>,
) -> Result<CommentResult> {
    storage::validate_id(task_id, "mt")?;
    if body.trim().is_empty() {
        return Err(Error::InvalidInput("comment body must not be empty".to_string()));
    }
    let mut storage = Storage::open(workspace)?;
    storage.get_task(task_id)?;
    if let Some(author) = &author_id {
        storage.get_user(author)?;
    }
    let mut comment = Comment::new(
        storage::generate_id("mtc", body),
        task_id.to_string(),
        body.to_string(),
        SystemClock.now(),
    );
    comment.author_id = author_id;
    storage.create_comment(&comment)?;
    Ok(CommentResult { comment })
}

/// Result of `mt comment list`.
#[derive(Debug, Serialize)]
pub struct CommentListResult {
    pub comments: Vec<Comment>,
    pub count: usize,
}

impl Output for CommentListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.comments.is_empty() {
            return "No comments found".to_string();
        }
        let mut out = String::new();
        for c in &self.comments {
            let author = c.author_id.as_deref().unwrap_or("anonymous");
            out.push_str(&format!("[{}] {}: {}\n", c.id, author, c.body));
        }
        out.push_str(&format!("{} comment(s)", self.count));
        out
    }
}

/// List comments, optionally restricted to one task.
pub fn comment_list(workspace: &Path, task_id: Option<&str>) -> Result<CommentListResult> {
    if let Some(task_id) = task_id {
        storage::validate_id(task_id, "mt")?;
    }
    let storage = Storage::open(workspace)?;
    let comments = storage.list_comments(task_id)?;
    let count = comments.len();
    Ok(CommentListResult { comments, count })
}

/// Delete a comment.
pub fn comment_delete(workspace: &Path, id: &str) -> Result<DeleteResult> {
    storage::validate_id(id, "mtc")?;
    let mut storage = Storage::open(workspace)?;
    storage.delete_comment(id)?;
    Ok(DeleteResult {
        id: id.to_string(),
        deleted: true,
    })
}

// === Recurrence commands ===

impl Output for SweepReport {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Swept {} template(s) through {}: created {} instance(s), {} already current",
            self.templates_scanned, self.until, self.instances_created, self.templates_skipped
        )
    }
}

/// Configuration key for the sweep horizon.
pub const CONFIG_HORIZON_DAYS: &str = "horizon_days";

/// Resolve the sweep horizon: explicit flag, then workspace config, then
/// the built-in default.
fn resolve_horizon(storage: &Storage, flag: Option<i64>) -> Result<i64> {
    if let Some(days) = flag {
        if days <= 0 {
            return Err(Error::InvalidInput("horizon must be positive".to_string()));
        }
        return Ok(days);
    }
    match storage.get_config(CONFIG_HORIZON_DAYS)? {
        Some(raw) => raw.parse::<i64>().ok().filter(|d| *d > 0).ok_or_else(|| {
            Error::InvalidInput(format!("invalid {} config value: {}", CONFIG_HORIZON_DAYS, raw))
        }),
        None => Ok(DEFAULT_HORIZON_DAYS),
    }
}

/// Generate missing instances for every recurring template.
pub fn recur_sweep(workspace: &Path, horizon: Option<i64>) -> Result<SweepReport> {
    let mut storage = Storage::open(workspace)?;
    let horizon = resolve_horizon(&storage, horizon)?;
    recurrence::run_horizon_sweep(&mut storage, &SystemClock, horizon)
}

// === Config commands ===

const CONFIG_KEYS: &[&str] = &[
    CONFIG_HORIZON_DAYS,
    "action_log_enabled",
    "action_log_sanitize",
];

fn validate_config_key(key: &str) -> Result<()> {
    if CONFIG_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "unknown config key: {} (known: {})",
            key,
            CONFIG_KEYS.join(", ")
        )))
    }
}

/// Result of `mt config get` / `mt config set`.
#[derive(Debug, Serialize)]
pub struct ConfigValueResult {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Output for ConfigValueResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match &self.value {
            Some(value) => format!("{} = {}", self.key, value),
            None => format!("{} is not set", self.key),
        }
    }
}

/// Read one config value.
pub fn config_get(workspace: &Path, key: &str) -> Result<ConfigValueResult> {
    validate_config_key(key)?;
    let storage = Storage::open(workspace)?;
    Ok(ConfigValueResult {
        key: key.to_string(),
        value: storage.get_config(key)?,
    })
}

/// Write one config value.
pub fn config_set(workspace: &Path, key: &str, value: &str) -> Result<ConfigValueResult> {
    validate_config_key(key)?;
    match key {
        CONFIG_HORIZON_DAYS => {
            if value.parse::<i64>().map_or(true, |d| d <= 0) {
                return Err(Error::InvalidInput(
                    "horizon_days must be a positive integer".to_string(),
                ));
            }
        }
        "action_log_enabled" | "action_log_sanitize" => {
            if value != "true" && value != "false" {
                return Err(Error::InvalidInput(format!(
                    "{} must be true or false",
                    key
                )));
            }
        }
        _ => {}
    }
    let mut storage = Storage::open(workspace)?;
    storage.set_config(key, value)?;
    Ok(ConfigValueResult {
        key: key.to_string(),
        value: Some(value.to_string()),
    })
}

/// Result of `mt config list`.
#[derive(Debug, Serialize)]
pub struct ConfigListResult {
    pub entries: Vec<ConfigValueResult>,
}

impl Output for ConfigListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No config set".to_string();
        }
        self.entries
            .iter()
            .map(|e| e.to_human())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// List all config entries.
pub fn config_list(workspace: &Path) -> Result<ConfigListResult> {
    let storage = Storage::open(workspace)?;
    let entries = storage
        .list_config()?
        .into_iter()
        .map(|(key, value)| ConfigValueResult {
            key,
            value: Some(value),
        })
        .collect();
    Ok(ConfigListResult { entries })
}
