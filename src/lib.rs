//! MiniTasks - a task, project, and sprint management library.
//!
//! This library provides the core functionality for the `mt` CLI tool:
//! task/project/sprint CRUD, recurring-task instance generation over a
//! rolling horizon, and sprint lifecycle management with work rollover.

pub mod action_log;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod models;
pub mod recurrence;
pub mod sprint;
pub mod storage;


/// Library-level error type for MiniTasks operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not initialized: run `mt system init` first")]
    NotInitialized,

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Sprint is completed and cannot transition: {0}")]
    SprintCompleted(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for MiniTasks operations.
pub type Result<T> = std::result::Result<T, Error>;
