//! CLI argument definitions for MiniTasks.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// MiniTasks - lightweight task, project, and sprint tracking.
///
/// Output is JSON by default; pass `--human` for readable text.
#[derive(Parser, Debug)]
#[command(name = "mt")]
#[command(author, version, about = "A CLI for tasks, projects, sprints, and recurring work", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if mt was started in <path> instead of the current directory.
    /// Can also be set via the MT_WORKSPACE environment variable.
    #[arg(short = 'C', long = "workspace", global = true, env = "MT_WORKSPACE")]
    pub workspace_path: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Workspace overview: entity counts and active sprints
    Status,

    /// Task management commands
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Subtask (checklist) commands
    Subtask {
        #[command(subcommand)]
        command: SubtaskCommands,
    },

    /// Project management commands
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Sprint lifecycle commands
    Sprint {
        #[command(subcommand)]
        command: SprintCommands,
    },

    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Task comment commands
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },

    /// Recurring-task commands
    Recur {
        #[command(subcommand)]
        command: RecurCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// System administration commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a new task
    Create {
        /// Task title
        title: String,

        /// Detailed description
        #[arg(short, long)]
        description: Option<String>,

        /// Initial status (created, in-progress, paused, cancelled, done)
        #[arg(short, long)]
        status: Option<String>,

        /// Scheduled start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Scheduled end date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Owning project ID
        #[arg(short, long)]
        project: Option<String>,

        /// Owning sprint ID
        #[arg(long)]
        sprint: Option<String>,

        /// Assigned user ID
        #[arg(short, long)]
        assignee: Option<String>,

        /// Make this a recurring template (daily, weekly, monthly);
        /// requires --start
        #[arg(long)]
        recur: Option<String>,

        /// Recurrence step, e.g. 2 for every second week
        #[arg(long)]
        interval: Option<u32>,

        /// Weekdays for weekly recurrence (0=Sunday..6=Saturday), repeatable
        #[arg(long = "day", value_name = "DAY")]
        days: Vec<u8>,

        /// Last date an instance may be scheduled (YYYY-MM-DD)
        #[arg(long)]
        recur_until: Option<NaiveDate>,

        /// Stop after this many generated instances
        #[arg(long)]
        recur_count: Option<u32>,
    },

    /// List tasks
    List {
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,

        /// Filter by project ID
        #[arg(short, long)]
        project: Option<String>,

        /// Filter by sprint ID
        #[arg(long)]
        sprint: Option<String>,

        /// Show only recurring templates
        #[arg(long)]
        templates: bool,
    },

    /// Show one task in full
    Show {
        /// Task ID (e.g., mt-a1b2)
        id: String,
    },

    /// Update fields on a task
    Update {
        /// Task ID
        id: String,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New status
        #[arg(short, long)]
        status: Option<String>,

        /// New start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// New end date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// New owning project ID
        #[arg(short, long)]
        project: Option<String>,

        /// New owning sprint ID
        #[arg(long)]
        sprint: Option<String>,

        /// New assignee ID
        #[arg(short, long)]
        assignee: Option<String>,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },

    /// Log time worked on a task
    LogTime {
        /// Task ID
        id: String,

        /// Minutes worked (must be positive)
        minutes: u32,

        /// Optional note
        #[arg(short, long)]
        note: Option<String>,
    },
}

/// Subtask subcommands
#[derive(Subcommand, Debug)]
pub enum SubtaskCommands {
    /// Add a checklist item to a task
    Add {
        /// Task ID
        task_id: String,

        /// Checklist text
        text: String,
    },

    /// Toggle a checklist item's completion
    Toggle {
        /// Task ID
        task_id: String,

        /// Subtask ID
        subtask_id: String,
    },
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a new project
    Create {
        /// Project name
        name: String,

        /// Detailed description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List projects
    List,

    /// Delete a project (detaches its tasks and sprints)
    Delete {
        /// Project ID (e.g., mtp-a1b2)
        id: String,
    },
}

/// Sprint subcommands
#[derive(Subcommand, Debug)]
pub enum SprintCommands {
    /// Create a new pending sprint
    Create {
        /// Sprint name
        name: String,

        /// Sprint start date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Sprint end date (YYYY-MM-DD); must be after start
        #[arg(long)]
        end: NaiveDate,

        /// Detailed description
        #[arg(short, long)]
        description: Option<String>,

        /// Project IDs this sprint covers, repeatable
        #[arg(short, long = "project", value_name = "PROJECT_ID")]
        projects: Vec<String>,

        /// Position in the sprint sequence; defaults to after the last
        #[arg(long)]
        order: Option<i64>,
    },

    /// List sprints in board order
    List {
        /// Filter by status (pending, active, completed)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show a sprint and its tasks
    Show {
        /// Sprint ID (e.g., mts-a1b2)
        id: String,
    },

    /// Activate a sprint
    Activate {
        /// Sprint ID
        id: String,
    },

    /// Complete a sprint, rolling unfinished tasks into the next one
    Complete {
        /// Sprint ID
        id: String,
    },

    /// Delete a sprint (unassigns its tasks)
    Delete {
        /// Sprint ID
        id: String,
    },
}

/// User subcommands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Add a user
    Add {
        /// Display name
        name: String,

        /// Role (admin or client; default client)
        #[arg(short, long)]
        role: Option<String>,
    },

    /// List users
    List,
}

/// Comment subcommands
#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    /// Add a comment to a task
    Add {
        /// Task ID
        task_id: String,

        /// Comment body
        body: String,

        /// Authoring user ID
        #[arg(short, long)]
        author: Option<String>,
    },

    /// List comments
    List {
        /// Restrict to one task
        #[arg(short, long)]
        task: Option<String>,
    },

    /// Delete a comment
    Delete {
        /// Comment ID (e.g., mtc-a1b2)
        id: String,
    },
}

/// Recurrence subcommands
#[derive(Subcommand, Debug)]
pub enum RecurCommands {
    /// Generate missing instances for all recurring templates
    Sweep {
        /// Days past today to generate through (overrides configured
        /// horizon_days)
        #[arg(long)]
        horizon: Option<i64>,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Read one config value
    Get {
        /// Config key
        key: String,
    },

    /// Write one config value
    Set {
        /// Config key
        key: String,

        /// New value
        value: String,
    },

    /// List all config entries
    List,
}

/// System subcommands
#[derive(Subcommand, Debug)]
pub enum SystemCommands {
    /// Initialize minitasks storage for this workspace
    Init,

    /// Rewrite storage files, dropping superseded and deleted lines
    Compact,

    /// Show version and build metadata
    BuildInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
