//! Data models for MiniTasks entities.
//!
//! This module defines the core data structures:
//! - `Task` - Work items with status, dates, subtasks, and time entries
//! - `RecurrenceConfig` - Recurrence rule attached to template tasks
//! - `Sprint` - Ordered time-boxes spanning one or more projects
//! - `Project` - Grouping for tasks and sprints
//! - `User` - Account record with a role (admin or client)
//! - `Comment` - Discussion entries attached to tasks
//!
//! Records read from older exports may use camelCase field names; the
//! `#[serde(alias)]` attributes absorb those spellings at the persistence
//! boundary so the rest of the crate only ever sees one shape.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task status in the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Created,
    InProgress,
    Paused,
    Cancelled,
    Completed,
}

impl TaskStatus {
    /// Whether this status counts as finished work for sprint rollover.
    /// Completed and cancelled tasks stay on their sprint as history.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Created => "created",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Paused => "paused",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

/// How often a recurring task repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        };
        write!(f, "{}", s)
    }
}

/// Recurrence rule attached to a template task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    /// Base repetition unit
    pub frequency: Frequency,

    /// Step between occurrences (e.g. every 2 weeks); always >= 1
    #[serde(default = "default_interval")]
    pub interval: u32,

    /// Weekday filter (0=Sunday..6=Saturday); meaningful for weekly only
    #[serde(default, alias = "daysOfWeek", skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,

    /// Hard cutoff: no instance may be dated after this
    #[serde(default, alias = "endDate", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Cap on the number of generated instances (safety ceiling of 100 if unset)
    #[serde(
        default,
        alias = "endAfterOccurrences",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_after_occurrences: Option<u32>,
}

fn default_interval() -> u32 {
    1
}

/// A checklist item within a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    /// Unique identifier (uuid)
    pub id: String,

    /// Checklist text
    pub text: String,

    /// Whether the item is checked off
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    /// Create a new unchecked subtask with a fresh id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            completed: false,
        }
    }
}

/// A single logged chunk of work time on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Minutes worked
    pub minutes: u32,

    /// Optional free-form note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// When the entry was logged
    pub logged_at: DateTime<Utc>,
}

/// A work item tracked by MiniTasks.
///
/// A task with `is_recurring = true` is a *template*: it is never scheduled
/// as work itself, but the recurrence engine expands it into concrete
/// instances. Instances carry `parent_task_id` back to their template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier (e.g., "mt-a1b2")
    pub id: String,

    /// Entity type marker
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Task title
    pub title: String,

    /// Detailed description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current status
    #[serde(default)]
    pub status: TaskStatus,

    /// Ordered checklist items
    #[serde(default)]
    pub subtasks: Vec<Subtask>,

    /// Scheduled start date (time-of-day is ignored by recurrence math)
    #[serde(default, alias = "startDate", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    /// Scheduled end date; not constrained to be >= start_date at this layer
    #[serde(default, alias = "endDate", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Owning project, if any
    #[serde(default, alias = "projectId", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Owning sprint, if any
    #[serde(default, alias = "sprintId", skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<String>,

    /// Assigned user
    #[serde(default, alias = "assigneeId", skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,

    /// Marks this task as a recurrence template
    #[serde(default, alias = "isRecurring")]
    pub is_recurring: bool,

    /// Recurrence rule; present only on templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceConfig>,

    /// Back-reference from a generated instance to its template
    #[serde(
        default,
        alias = "parentTaskId",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_task_id: Option<String>,

    /// Logged work time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_entries: Vec<TimeEntry>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task with the given ID and title.
    pub fn new(id: String, title: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            entity_type: "task".to_string(),
            title,
            description: None,
            status: TaskStatus::default(),
            subtasks: Vec::new(),
            start_date: None,
            end_date: None,
            project_id: None,
            sprint_id: None,
            assignee_id: None,
            is_recurring: false,
            recurrence: None,
            parent_task_id: None,
            time_entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this task is a well-formed recurrence template: flagged
    /// recurring, carrying a rule and a start date, and not itself an
    /// instance of another template.
    pub fn is_template(&self) -> bool {
        self.is_recurring
            && self.recurrence.is_some()
            && self.start_date.is_some()
            && self.parent_task_id.is_none()
    }

    /// Total logged minutes across all time entries.
    pub fn total_minutes(&self) -> u64 {
        self.time_entries.iter().map(|e| u64::from(e.minutes)).sum()
    }
}

/// Sprint status in the lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintStatus {
    #[default]
    Pending,
    Active,
    Completed,
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SprintStatus::Pending => "pending",
            SprintStatus::Active => "active",
            SprintStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

/// An ordered time-box for work, spanning zero or more projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprint {
    /// Unique identifier (e.g., "mts-a1b2")
    pub id: String,

    /// Entity type marker
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Sprint name
    pub name: String,

    /// Detailed description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Projects this sprint applies to
    #[serde(default, alias = "projectIds")]
    pub project_ids: Vec<String>,

    /// Sprint start date
    #[serde(alias = "startDate")]
    pub start_date: NaiveDate,

    /// Sprint end date (strictly after start, enforced at creation)
    #[serde(alias = "endDate")]
    pub end_date: NaiveDate,

    /// Current lifecycle state
    #[serde(default)]
    pub status: SprintStatus,

    /// Position in the sprint sequence; rollover targets the next pending
    /// sprint by ascending order
    pub order: i64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Sprint {
    /// Create a new pending sprint.
    pub fn new(
        id: String,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        order: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            entity_type: "sprint".to_string(),
            name,
            description: None,
            project_ids: Vec::new(),
            start_date,
            end_date,
            status: SprintStatus::default(),
            order,
            created_at: now,
        }
    }

    /// Whether this sprint shares at least one project with `other`.
    pub fn shares_project_with(&self, other: &Sprint) -> bool {
        self.project_ids
            .iter()
            .any(|p| other.project_ids.contains(p))
    }
}

/// A grouping for tasks and sprints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier (e.g., "mtp-a1b2")
    pub id: String,

    /// Entity type marker
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Project name
    pub name: String,

    /// Detailed description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project.
    pub fn new(id: String, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            entity_type: "project".to_string(),
            name,
            description: None,
            created_at: now,
        }
    }
}

/// User role. Stored as data only; permission enforcement is the caller's
/// concern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    Client,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Admin => "admin",
            Role::Client => "client",
        };
        write!(f, "{}", s)
    }
}

/// An account known to MiniTasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (e.g., "mtu-a1b2")
    pub id: String,

    /// Entity type marker
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Display name
    pub name: String,

    /// Access role
    #[serde(default)]
    pub role: Role,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user.
    pub fn new(id: String, name: String, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            id,
            entity_type: "user".to_string(),
            name,
            role,
            created_at: now,
        }
    }
}

/// A discussion entry attached to a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier (e.g., "mtc-a1b2")
    pub id: String,

    /// Entity type marker
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Task this comment belongs to
    #[serde(alias = "taskId")]
    pub task_id: String,

    /// Authoring user, if known
    #[serde(default, alias = "authorId", skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,

    /// Comment body
    pub body: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment on a task.
    pub fn new(id: String, task_id: String, body: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            entity_type: "comment".to_string(),
            task_id,
            author_id: None,
            body,
            created_at: now,
        }
    }
}
