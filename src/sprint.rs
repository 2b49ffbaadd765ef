//! Sprint lifecycle management.
//!
//! Sprints move `pending -> active -> completed`; `completed` is terminal.
//! Completing a sprint rolls its unfinished work forward: every task in the
//! sprint whose status is not terminal is reassigned to the successor
//! sprint, and the successor becomes the active sprint, so nothing silently
//! falls off the board.
//!
//! Planning and application are split: `plan_completion` is a pure function
//! over in-memory snapshots and returns the full set of mutations, which
//! `apply_completion` then persists. Tests exercise the planner without any
//! storage at all.

use serde::Serialize;

use crate::clock::Clock;
use crate::models::{Sprint, SprintStatus, Task};
use crate::storage::Storage;
use crate::{Error, Result};

/// One task reassignment produced by sprint completion.
#[derive(Debug, Clone, Serialize)]
pub struct TaskMove {
    /// Task being rolled forward
    pub task_id: String,
    /// Sprint the task leaves
    pub from_sprint_id: String,
    /// Sprint the task joins
    pub to_sprint_id: String,
}

/// Every mutation implied by completing one sprint.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionPlan {
    /// Sprint being completed
    pub sprint_id: String,
    /// Successor receiving the rollover, when one exists
    pub successor_id: Option<String>,
    /// Task reassignments; empty when there is no successor or no
    /// unfinished work
    pub task_moves: Vec<TaskMove>,
}

/// Pick the sprint that inherits unfinished work from `completed`.
///
/// The successor is the pending sprint with the smallest `order` strictly
/// greater than the completed sprint's, restricted to sprints sharing at
/// least one project with it. Ties on `order` break to the
/// lexicographically smallest id, so the choice is deterministic
/// regardless of input ordering.
pub fn find_successor<'a>(completed: &Sprint, sprints: &'a [Sprint]) -> Option<&'a Sprint> {
    sprints
        .iter()
        .filter(|s| {
            s.id != completed.id
                && s.status == SprintStatus::Pending
                && s.order > completed.order
                && s.shares_project_with(completed)
        })
        .min_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)))
}

/// Compute the mutations for completing a sprint, without applying them.
///
/// Completing from `pending` is allowed; a sprint skipped over entirely can
/// still be closed out. Completing an already-completed sprint is an error,
/// not a no-op, because the rollover it would imply already happened.
/// Without a successor the sprint still completes and its unfinished tasks
/// keep their assignment, visible via the completed sprint's history.
pub fn plan_completion(
    sprint_id: &str,
    sprints: &[Sprint],
    tasks: &[Task],
) -> Result<CompletionPlan> {
    let sprint = sprints
        .iter()
        .find(|s| s.id == sprint_id)
        .ok_or_else(|| Error::NotFound(format!("sprint {}", sprint_id)))?;

    if sprint.status == SprintStatus::Completed {
        return Err(Error::SprintCompleted(sprint.id.clone()));
    }

    let successor = find_successor(sprint, sprints);

    let task_moves = match successor {
        Some(next) => tasks
            .iter()
            .filter(|t| t.sprint_id.as_deref() == Some(sprint_id) && !t.status.is_terminal())
            .map(|t| TaskMove {
                task_id: t.id.clone(),
                from_sprint_id: sprint.id.clone(),
                to_sprint_id: next.id.clone(),
            })
            .collect(),
        None => Vec::new(),
    };

    Ok(CompletionPlan {
        sprint_id: sprint.id.clone(),
        successor_id: successor.map(|s| s.id.clone()),
        task_moves,
    })
}

/// Persist a completion plan: reassign the rolled-over tasks, activate the
/// successor, then mark the sprint completed.
///
/// Tasks and the successor are written before the sprint's status flips, so
/// a failure partway leaves the sprint still completable and the next
/// attempt re-plans against the already-applied state.
pub fn apply_completion(
    storage: &mut Storage,
    plan: &CompletionPlan,
    clock: &dyn Clock,
) -> Result<Sprint> {
    for mv in &plan.task_moves {
        let mut task = storage.get_task(&mv.task_id)?;
        task.sprint_id = Some(mv.to_sprint_id.clone());
        task.updated_at = clock.now();
        storage.update_task(&task)?;
    }

    if let Some(successor_id) = &plan.successor_id {
        let mut successor = storage.get_sprint(successor_id)?;
        successor.status = SprintStatus::Active;
        storage.update_sprint(&successor)?;
    }

    let mut sprint = storage.get_sprint(&plan.sprint_id)?;
    sprint.status = SprintStatus::Completed;
    storage.update_sprint(&sprint)?;
    Ok(sprint)
}

/// Transition a sprint to `active`.
///
/// Activating an already-active sprint is a no-op; activating a completed
/// one is rejected.
pub fn activate_sprint(storage: &mut Storage, sprint_id: &str) -> Result<Sprint> {
    let mut sprint = storage.get_sprint(sprint_id)?;
    match sprint.status {
        SprintStatus::Active => Ok(sprint),
        SprintStatus::Completed => Err(Error::SprintCompleted(sprint.id)),
        SprintStatus::Pending => {
            sprint.status = SprintStatus::Active;
            storage.update_sprint(&sprint)?;
            Ok(sprint)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::TaskStatus;
    use crate::test_utils::TestEnv;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn sprint(id: &str, order: i64, status: SprintStatus, projects: &[&str]) -> Sprint {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut s = Sprint::new(
            id.into(),
            format!("Sprint {}", order),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
            order,
            now,
        );
        s.status = status;
        s.project_ids = projects.iter().map(|p| p.to_string()).collect();
        s
    }

    fn task(id: &str, sprint_id: Option<&str>, status: TaskStatus) -> Task {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut t = Task::new(id.into(), format!("Task {}", id), now);
        t.sprint_id = sprint_id.map(|s| s.to_string());
        t.status = status;
        t
    }

    #[test]
    fn test_successor_is_next_pending_shared_project() {
        let sprints = vec![
            sprint("mts-a", 1, SprintStatus::Active, &["mtp-x"]),
            sprint("mts-b", 2, SprintStatus::Pending, &["mtp-x"]),
            sprint("mts-c", 3, SprintStatus::Pending, &["mtp-x"]),
        ];
        let next = find_successor(&sprints[0], &sprints).unwrap();
        assert_eq!(next.id, "mts-b");
    }

    #[test]
    fn test_successor_skips_other_projects_and_nonpending() {
        let sprints = vec![
            sprint("mts-a", 1, SprintStatus::Active, &["mtp-x"]),
            sprint("mts-b", 2, SprintStatus::Pending, &["mtp-y"]),
            sprint("mts-c", 3, SprintStatus::Active, &["mtp-x"]),
            sprint("mts-d", 4, SprintStatus::Pending, &["mtp-x", "mtp-y"]),
        ];
        let next = find_successor(&sprints[0], &sprints).unwrap();
        assert_eq!(next.id, "mts-d");
    }

    #[test]
    fn test_successor_ignores_earlier_orders() {
        let sprints = vec![
            sprint("mts-a", 5, SprintStatus::Active, &["mtp-x"]),
            sprint("mts-b", 2, SprintStatus::Pending, &["mtp-x"]),
        ];
        assert!(find_successor(&sprints[0], &sprints).is_none());
    }

    #[test]
    fn test_successor_tie_breaks_on_smallest_id() {
        let sprints = vec![
            sprint("mts-a", 1, SprintStatus::Active, &["mtp-x"]),
            sprint("mts-zz", 2, SprintStatus::Pending, &["mtp-x"]),
            sprint("mts-bb", 2, SprintStatus::Pending, &["mtp-x"]),
        ];
        let next = find_successor(&sprints[0], &sprints).unwrap();
        assert_eq!(next.id, "mts-bb");
    }

    #[test]
    fn test_plan_moves_only_unfinished_tasks() {
        let sprints = vec![
            sprint("mts-a", 1, SprintStatus::Active, &["mtp-x"]),
            sprint("mts-b", 2, SprintStatus::Pending, &["mtp-x"]),
        ];
        let tasks = vec![
            task("mt-1", Some("mts-a"), TaskStatus::InProgress),
            task("mt-2", Some("mts-a"), TaskStatus::Completed),
            task("mt-3", Some("mts-a"), TaskStatus::Cancelled),
            task("mt-4", Some("mts-b"), TaskStatus::Created),
            task("mt-5", None, TaskStatus::Created),
        ];
        let plan = plan_completion("mts-a", &sprints, &tasks).unwrap();
        assert_eq!(plan.successor_id.as_deref(), Some("mts-b"));
        assert_eq!(plan.task_moves.len(), 1);
        assert_eq!(plan.task_moves[0].task_id, "mt-1");
        assert_eq!(plan.task_moves[0].to_sprint_id, "mts-b");
    }

    #[test]
    fn test_plan_without_successor_keeps_tasks_in_place() {
        let sprints = vec![sprint("mts-a", 1, SprintStatus::Active, &["mtp-x"])];
        let tasks = vec![task("mt-1", Some("mts-a"), TaskStatus::InProgress)];
        let plan = plan_completion("mts-a", &sprints, &tasks).unwrap();
        assert!(plan.successor_id.is_none());
        assert!(plan.task_moves.is_empty());
    }

    #[test]
    fn test_plan_allows_pending_to_completed() {
        let sprints = vec![
            sprint("mts-a", 1, SprintStatus::Pending, &["mtp-x"]),
            sprint("mts-b", 2, SprintStatus::Pending, &["mtp-x"]),
        ];
        let plan = plan_completion("mts-a", &sprints, &[]).unwrap();
        assert_eq!(plan.successor_id.as_deref(), Some("mts-b"));
    }

    #[test]
    fn test_plan_rejects_completed_sprint() {
        let sprints = vec![sprint("mts-a", 1, SprintStatus::Completed, &["mtp-x"])];
        let err = plan_completion("mts-a", &sprints, &[]).unwrap_err();
        assert!(matches!(err, Error::SprintCompleted(_)));
    }

    #[test]
    fn test_plan_unknown_sprint() {
        let err = plan_completion("mts-nope", &[], &[]).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_apply_completion_persists_rollover() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        let a = sprint("mts-a", 1, SprintStatus::Active, &["mtp-x"]);
        let b = sprint("mts-b", 2, SprintStatus::Pending, &["mtp-x"]);
        storage.create_sprint(&a).unwrap();
        storage.create_sprint(&b).unwrap();
        storage
            .create_task(&task("mt-1", Some("mts-a"), TaskStatus::InProgress))
            .unwrap();
        storage
            .create_task(&task("mt-2", Some("mts-a"), TaskStatus::Completed))
            .unwrap();

        let sprints = storage.list_sprints(None).unwrap();
        let tasks = storage.list_tasks(None, None, None).unwrap();
        let plan = plan_completion("mts-a", &sprints, &tasks).unwrap();
        let completed = apply_completion(&mut storage, &plan, &clock).unwrap();
        assert_eq!(completed.status, SprintStatus::Completed);

        let moved = storage.get_task("mt-1").unwrap();
        assert_eq!(moved.sprint_id.as_deref(), Some("mts-b"));
        // Finished work stays with the completed sprint.
        let finished = storage.get_task("mt-2").unwrap();
        assert_eq!(finished.sprint_id.as_deref(), Some("mts-a"));
        // The successor takes over as the active sprint.
        let next = storage.get_sprint("mts-b").unwrap();
        assert_eq!(next.status, SprintStatus::Active);
    }

    #[test]
    fn test_activate_transitions_and_is_idempotent() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        storage
            .create_sprint(&sprint("mts-a", 1, SprintStatus::Pending, &["mtp-x"]))
            .unwrap();

        let active = activate_sprint(&mut storage, "mts-a").unwrap();
        assert_eq!(active.status, SprintStatus::Active);

        let again = activate_sprint(&mut storage, "mts-a").unwrap();
        assert_eq!(again.status, SprintStatus::Active);
    }

    #[test]
    fn test_activate_rejects_completed() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        storage
            .create_sprint(&sprint("mts-a", 1, SprintStatus::Completed, &["mtp-x"]))
            .unwrap();

        let err = activate_sprint(&mut storage, "mts-a").unwrap_err();
        assert!(matches!(err, Error::SprintCompleted(_)));
    }
}
