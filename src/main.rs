//! MiniTasks CLI - task, project, and sprint tracking with recurring work.

use clap::Parser;
use minitasks::action_log;
use minitasks::cli::{
    Cli, Commands, CommentCommands, ConfigCommands, ProjectCommands, RecurCommands,
    SprintCommands, SubtaskCommands, SystemCommands, TaskCommands, UserCommands,
};
use minitasks::commands::{self, Output, TaskParams};
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    // Workspace path: --workspace flag > MT_WORKSPACE env > cwd
    let workspace = resolve_workspace(cli.workspace_path, human);

    let (cmd_name, args_json) = serialize_command(&cli.command);

    let start = Instant::now();
    let result = run_command(cli.command, &workspace, human);
    let duration = start.elapsed().as_millis() as u64;

    let (success, error) = match &result {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };

    // Logging problems never change the command's outcome.
    action_log::log_action(&workspace, &cmd_name, args_json, success, error, duration);

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Resolve the workspace directory. An explicit path (flag or env) must
/// exist and is used literally; otherwise the current directory stands in.
fn resolve_workspace(explicit_path: Option<PathBuf>, human: bool) -> PathBuf {
    match explicit_path {
        Some(path) => {
            if !path.exists() {
                if human {
                    eprintln!("Error: workspace path does not exist: {}", path.display());
                } else {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "error": format!("workspace path does not exist: {}", path.display())
                        })
                    );
                }
                process::exit(1);
            }
            path
        }
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

/// Name and loggable arguments for a parsed command.
fn serialize_command(command: &Option<Commands>) -> (String, serde_json::Value) {
    use serde_json::json;
    match command {
        None | Some(Commands::Status) => ("status".to_string(), json!({})),
        Some(Commands::Task { command }) => match command {
            TaskCommands::Create { title, .. } => {
                ("task create".to_string(), json!({ "title": title }))
            }
            TaskCommands::List { .. } => ("task list".to_string(), json!({})),
            TaskCommands::Show { id } => ("task show".to_string(), json!({ "id": id })),
            TaskCommands::Update { id, .. } => ("task update".to_string(), json!({ "id": id })),
            TaskCommands::Delete { id } => ("task delete".to_string(), json!({ "id": id })),
            TaskCommands::LogTime { id, minutes, .. } => (
                "task log-time".to_string(),
                json!({ "id": id, "minutes": minutes }),
            ),
        },
        Some(Commands::Subtask { command }) => match command {
            SubtaskCommands::Add { task_id, .. } => {
                ("subtask add".to_string(), json!({ "task_id": task_id }))
            }
            SubtaskCommands::Toggle {
                task_id,
                subtask_id,
            } => (
                "subtask toggle".to_string(),
                json!({ "task_id": task_id, "subtask_id": subtask_id }),
            ),
        },
        Some(Commands::Project { command }) => match command {
            ProjectCommands::Create { name, .. } => {
                ("project create".to_string(), json!({ "name": name }))
            }
            ProjectCommands::List => ("project list".to_string(), json!({})),
            ProjectCommands::Delete { id } => {
                ("project delete".to_string(), json!({ "id": id }))
            }
        },
        Some(Commands::Sprint { command }) => match command {
            SprintCommands::Create { name, .. } => {
                ("sprint create".to_string(), json!({ "name": name }))
            }
            SprintCommands::List { .. } => ("sprint list".to_string(), json!({})),
            SprintCommands::Show { id } => ("sprint show".to_string(), json!({ "id": id })),
            SprintCommands::Activate { id } => {
                ("sprint activate".to_string(), json!({ "id": id }))
            }
            SprintCommands::Complete { id } => {
                ("sprint complete".to_string(), json!({ "id": id }))
            }
            SprintCommands::Delete { id } => ("sprint delete".to_string(), json!({ "id": id })),
        },
        Some(Commands::User { command }) => match command {
            UserCommands::Add { name, .. } => ("user add".to_string(), json!({ "name": name })),
            UserCommands::List => ("user list".to_string(), json!({})),
        },
        Some(Commands::Comment { command }) => match command {
            CommentCommands::Add { task_id, .. } => {
                ("comment add".to_string(), json!({ "task_id": task_id }))
            }
            CommentCommands::List { .. } => ("comment list".to_string(), json!({})),
            CommentCommands::Delete { id } => {
                ("comment delete".to_string(), json!({ "id": id }))
            }
        },
        Some(Commands::Recur { command }) => match command {
            RecurCommands::Sweep { horizon } => {
                ("recur sweep".to_string(), json!({ "horizon": horizon }))
            }
        },
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Get { key } => ("config get".to_string(), json!({ "key": key })),
            ConfigCommands::Set { key, .. } => ("config set".to_string(), json!({ "key": key })),
            ConfigCommands::List => ("config list".to_string(), json!({})),
        },
        Some(Commands::System { command }) => match command {
            SystemCommands::Init => ("system init".to_string(), json!({})),
            SystemCommands::Compact => ("system compact".to_string(), json!({})),
            SystemCommands::BuildInfo => ("system build-info".to_string(), json!({})),
        },
    }
}

fn run_command(
    command: Option<Commands>,
    workspace: &Path,
    human: bool,
) -> Result<(), minitasks::Error> {
    match command {
        // Bare `mt` defaults to the workspace overview.
        None | Some(Commands::Status) => {
            let result = commands::status(workspace)?;
            output(&result, human);
        }

        Some(Commands::Task { command }) => match command {
            TaskCommands::Create {
                title,
                description,
                status,
                start,
                end,
                project,
                sprint,
                assignee,
                recur,
                interval,
                days,
                recur_until,
                recur_count,
            } => {
                let params = TaskParams {
                    description,
                    status,
                    start_date: start,
                    end_date: end,
                    project_id: project,
                    sprint_id: sprint,
                    assignee_id: assignee,
                    frequency: recur,
                    interval,
                    days_of_week: (!days.is_empty()).then_some(days),
                    recur_end_date: recur_until,
                    end_after_occurrences: recur_count,
                };
                let result = commands::task_create(workspace, &title, params)?;
                output(&result, human);
            }
            TaskCommands::List {
                status,
                project,
                sprint,
                templates,
            } => {
                let result = commands::task_list(
                    workspace,
                    status.as_deref(),
                    project.as_deref(),
                    sprint.as_deref(),
                    templates,
                )?;
                output(&result, human);
            }
            TaskCommands::Show { id } => {
                let result = commands::task_show(workspace, &id)?;
                output(&result, human);
            }
            TaskCommands::Update {
                id,
                description,
                status,
                start,
                end,
                project,
                sprint,
                assignee,
            } => {
                let params = TaskParams {
                    description,
                    status,
                    start_date: start,
                    end_date: end,
                    project_id: project,
                    sprint_id: sprint,
                    assignee_id: assignee,
                    ..TaskParams::default()
                };
                let result = commands::task_update(workspace, &id, params)?;
                output(&result, human);
            }
            TaskCommands::Delete { id } => {
                let result = commands::task_delete(workspace, &id)?;
                output(&result, human);
            }
            TaskCommands::LogTime { id, minutes, note } => {
                let result = commands::task_log_time(workspace, &id, minutes, note)?;
                output(&result, human);
            }
        },

        Some(Commands::Subtask { command }) => match command {
            SubtaskCommands::Add { task_id, text } => {
                let result = commands::subtask_add(workspace, &task_id, &text)?;
                output(&result, human);
            }
            SubtaskCommands::Toggle {
                task_id,
                subtask_id,
            } => {
                let result = commands::subtask_toggle(workspace, &task_id, &subtask_id)?;
                output(&result, human);
            }
        },

        Some(Commands::Project { command }) => match command {
            ProjectCommands::Create { name, description } => {
                let result = commands::project_create(workspace, &name, description)?;
                output(&result, human);
            }
            ProjectCommands::List => {
                let result = commands::project_list(workspace)?;
                output(&result, human);
            }
            ProjectCommands::Delete { id } => {
                let result = commands::project_delete(workspace, &id)?;
                output(&result, human);
            }
        },

        Some(Commands::Sprint { command }) => match command {
            SprintCommands::Create {
                name,
                start,
                end,
                description,
                projects,
                order,
            } => {
                let result = commands::sprint_create(
                    workspace,
                    &name,
                    description,
                    start,
                    end,
                    projects,
                    order,
                )?;
                output(&result, human);
            }
            SprintCommands::List { status } => {
                let result = commands::sprint_list(workspace, status.as_deref())?;
                output(&result, human);
            }
            SprintCommands::Show { id } => {
                let result = commands::sprint_show(workspace, &id)?;
                output(&result, human);
            }
            SprintCommands::Activate { id } => {
                let result = commands::sprint_activate(workspace, &id)?;
                output(&result, human);
            }
            SprintCommands::Complete { id } => {
                let result = commands::sprint_complete(workspace, &id)?;
                output(&result, human);
            }
            SprintCommands::Delete { id } => {
                let result = commands::sprint_delete(workspace, &id)?;
                output(&result, human);
            }
        },

        Some(Commands::User { command }) => match command {
            UserCommands::Add { name, role } => {
                let result = commands::user_add(workspace, &name, role.as_deref())?;
                output(&result, human);
            }
            UserCommands::List => {
                let result = commands::user_list(workspace)?;
                output(&result, human);
            }
        },

        Some(Commands::Comment { command }) => match command {
            CommentCommands::Add {
                task_id,
                body,
                author,
            } => {
                let result = commands::comment_add(workspace, &task_id, &body, author)?;
                output(&result, human);
            }
            CommentCommands::List { task } => {
                let result = commands::comment_list(workspace, task.as_deref())?;
                output(&result, human);
            }
            CommentCommands::Delete { id } => {
                let result = commands::comment_delete(workspace, &id)?;
                output(&result, human);
            }
        },

        Some(Commands::Recur { command }) => match command {
            RecurCommands::Sweep { horizon } => {
                let result = commands::recur_sweep(workspace, horizon)?;
                output(&result, human);
            }
        },

        Some(Commands::Config { command }) => match command {
            ConfigCommands::Get { key } => {
                let result = commands::config_get(workspace, &key)?;
                output(&result, human);
            }
            ConfigCommands::Set { key, value } => {
                let result = commands::config_set(workspace, &key, &value)?;
                output(&result, human);
            }
            ConfigCommands::List => {
                let result = commands::config_list(workspace)?;
                output(&result, human);
            }
        },

        Some(Commands::System { command }) => match command {
            SystemCommands::Init => {
                let result = commands::system_init(workspace)?;
                output(&result, human);
            }
            SystemCommands::Compact => {
                let result = commands::system_compact(workspace)?;
                output(&result, human);
            }
            SystemCommands::BuildInfo => {
                let result = commands::system_build_info()?;
                output(&result, human);
            }
        },
    }

    Ok(())
}
