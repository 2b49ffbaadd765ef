//! Recurring-task generation.
//!
//! A task flagged `is_recurring` is a template: it is never scheduled as
//! work itself. This module expands templates into the concrete task
//! instances that should exist between the template's start date and a
//! rolling horizon, and reconciles that sequence against already-created
//! instances so that re-running a sweep is idempotent.
//!
//! The pipeline is three steps, each independently testable:
//! 1. `generate_occurrences` - pure expansion of one template up to a date
//! 2. `reconcile` - drop candidates already satisfied by an existing
//!    instance on the same calendar day
//! 3. `run_horizon_sweep` - orchestration over all templates in storage,
//!    persisting the surviving drafts one at a time

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;

use crate::clock::Clock;
use crate::models::{Frequency, Subtask, Task, TaskStatus};
use crate::storage::{self, Storage};
use crate::{Error, Result};

/// How far ahead of today instances are proactively generated.
pub const DEFAULT_HORIZON_DAYS: i64 = 90;

/// Safety ceiling on generated instances per template when the template
/// does not set `end_after_occurrences`.
pub const DEFAULT_OCCURRENCE_CAP: u32 = 100;

/// One not-yet-persisted occurrence of a template.
///
/// Drafts carry no id or timestamps; those are assigned at materialization
/// so that generation itself stays a pure function of its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceDraft {
    /// Template this occurrence belongs to
    pub template_id: String,
    /// Title cloned from the template
    pub title: String,
    /// Description cloned from the template
    pub description: Option<String>,
    /// Subtask texts cloned from the template (fresh ids are assigned on
    /// materialization, all unchecked)
    pub subtask_texts: Vec<String>,
    /// Occurrence date
    pub start_date: NaiveDate,
    /// Occurrence end date: start plus the template's span, when the
    /// template has one
    pub end_date: Option<NaiveDate>,
    /// Copied from the template
    pub project_id: Option<String>,
    /// Copied from the template
    pub sprint_id: Option<String>,
}

/// Summary of one horizon sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    /// Templates considered
    pub templates_scanned: usize,
    /// Templates whose last generated date already covers the horizon
    pub templates_skipped: usize,
    /// Instances persisted by this sweep
    pub instances_created: usize,
    /// Horizon date used
    pub until: NaiveDate,
}

/// Expand a template into the ordered occurrence drafts that should exist
/// from the template's start date up to `until` (inclusive).
///
/// A template missing its start date or recurrence rule yields an empty
/// sequence; that is "nothing to generate", not an error. The function is
/// pure: identical inputs always produce the identical sequence.
///
/// First-occurrence policy: for `daily`, `monthly`, and `weekly` without an
/// explicit weekday set, the first occurrence lies one interval past the
/// template start (the start date itself is the template's own slot and is
/// not re-emitted). For `weekly` with explicit `days_of_week`, the start
/// date counts as occurrence #0 and is emitted iff its weekday is in the
/// set; rejected weekdays never consume the occurrence budget.
pub fn generate_occurrences(template: &Task, until: NaiveDate) -> Vec<OccurrenceDraft> {
    if !template.is_recurring {
        return Vec::new();
    }
    let (Some(start), Some(rec)) = (template.start_date, template.recurrence.as_ref()) else {
        return Vec::new();
    };

    // Non-positive spans are treated as zero-length, defensively.
    let span_days = template
        .end_date
        .map(|end| (end - start).num_days().max(0))
        .unwrap_or(0);
    let has_span = template.end_date.is_some();

    let interval = rec.interval.max(1);
    let cap = rec.end_after_occurrences.unwrap_or(DEFAULT_OCCURRENCE_CAP);
    let beyond = |date: NaiveDate| date > until || rec.end_date.map_or(false, |end| date > end);

    let make_draft = |date: NaiveDate| OccurrenceDraft {
        template_id: template.id.clone(),
        title: template.title.clone(),
        description: template.description.clone(),
        subtask_texts: template.subtasks.iter().map(|s| s.text.clone()).collect(),
        start_date: date,
        end_date: has_span.then(|| date + Duration::days(span_days)),
        project_id: template.project_id.clone(),
        sprint_id: template.sprint_id.clone(),
    };

    let mut drafts = Vec::new();

    let weekday_filter: Option<HashSet<u8>> = match rec.frequency {
        Frequency::Weekly => rec
            .days_of_week
            .as_ref()
            .filter(|days| !days.is_empty())
            .map(|days| days.iter().copied().collect()),
        _ => None,
    };

    if let Some(days) = weekday_filter {
        // Walk day by day from the template start. A date qualifies when its
        // week (Sunday-based, matching the 0=Sunday weekday indices) is a
        // multiple of the interval away from the start's week and its
        // weekday is in the set.
        let start_week = sunday_of(start);
        let mut current = start;
        while !beyond(current) && drafts.len() < cap as usize {
            let weeks_elapsed = (sunday_of(current) - start_week).num_days() / 7;
            if weeks_elapsed % i64::from(interval) == 0
                && days.contains(&(current.weekday().num_days_from_sunday() as u8))
            {
                drafts.push(make_draft(current));
            }
            current += Duration::days(1);
        }
    } else {
        // Fixed-step advancement anchored on the template start; the k-th
        // occurrence is k intervals past the start, so monthly day-of-month
        // overflow normalizes against the anchor rather than drifting.
        for k in 1..=u32::MAX {
            if drafts.len() >= cap as usize {
                break;
            }
            // Checked arithmetic throughout: a huge interval that would step
            // past the calendar's range ends the series instead of panicking.
            let candidate = match rec.frequency {
                Frequency::Daily => start
                    .checked_add_signed(Duration::days(i64::from(k) * i64::from(interval))),
                Frequency::Weekly => start
                    .checked_add_signed(Duration::days(i64::from(k) * i64::from(interval) * 7)),
                Frequency::Monthly => start.checked_add_months(Months::new(k * interval)),
            };
            let Some(candidate) = candidate else { break };
            if beyond(candidate) {
                break;
            }
            drafts.push(make_draft(candidate));
        }
    }

    drafts
}

/// Sunday on or before the given date.
fn sunday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Drop candidates already satisfied by an existing instance.
///
/// A candidate is satisfied when some existing instance starts on the same
/// calendar day. Order is preserved, which keeps repeated sweeps idempotent:
/// a partially-persisted batch is resumed, never duplicated. Instances at
/// different calendar days are never deduplicated against each other, even
/// if they semantically overlap.
pub fn reconcile(candidates: Vec<OccurrenceDraft>, existing: &[Task]) -> Vec<OccurrenceDraft> {
    let taken: HashSet<NaiveDate> = existing.iter().filter_map(|t| t.start_date).collect();
    candidates
        .into_iter()
        .filter(|c| !taken.contains(&c.start_date))
        .collect()
}

/// Turn a draft into a persistable task instance.
///
/// Instances are plain tasks: fresh id, fresh unchecked subtasks, status
/// `created`, no recurrence of their own, and `parent_task_id` pointing back
/// at the template.
pub fn materialize(draft: &OccurrenceDraft, clock: &dyn Clock) -> Task {
    let now = clock.now();
    let mut task = Task::new(
        storage::generate_id("mt", &draft.title),
        draft.title.clone(),
        now,
    );
    task.description = draft.description.clone();
    task.status = TaskStatus::Created;
    task.subtasks = draft
        .subtask_texts
        .iter()
        .map(|text| Subtask::new(text.clone()))
        .collect();
    task.start_date = Some(draft.start_date);
    task.end_date = draft.end_date;
    task.project_id = draft.project_id.clone();
    task.sprint_id = draft.sprint_id.clone();
    task.parent_task_id = Some(draft.template_id.clone());
    task
}

/// Generate and persist missing instances for every template in storage.
///
/// Templates whose newest instance already reaches the horizon are skipped
/// outright. Persistence is sequential and in chronological order per
/// template: if a create fails partway, the prefix stands and the next
/// sweep's reconciliation resumes from it. Existing tasks and the templates
/// themselves are never mutated.
pub fn run_horizon_sweep(
    storage: &mut Storage,
    clock: &dyn Clock,
    horizon_days: i64,
) -> Result<SweepReport> {
    let all_tasks = storage.list_tasks(None, None, None)?;
    let until = clock.today() + Duration::days(horizon_days);

    let mut report = SweepReport {
        templates_scanned: 0,
        templates_skipped: 0,
        instances_created: 0,
        until,
    };

    for template in all_tasks.iter().filter(|t| t.is_template()) {
        report.templates_scanned += 1;

        let existing: Vec<&Task> = all_tasks
            .iter()
            .filter(|t| t.parent_task_id.as_deref() == Some(template.id.as_str()))
            .collect();

        let last_generated = existing
            .iter()
            .filter_map(|t| t.start_date)
            .max()
            .or(template.start_date);
        if last_generated.map_or(false, |d| d >= until) {
            report.templates_skipped += 1;
            continue;
        }

        let candidates = generate_occurrences(template, until);
        let existing_owned: Vec<Task> = existing.into_iter().cloned().collect();
        for draft in reconcile(candidates, &existing_owned) {
            let mut instance = materialize(&draft, clock);
            // IDs are short; reroll on the rare collision with a live task
            // rather than aborting the sweep.
            let mut attempts = 0;
            loop {
                match storage.create_task(&instance) {
                    Ok(()) => break,
                    Err(Error::AlreadyExists(_)) if attempts < 3 => {
                        attempts += 1;
                        instance.id = storage::generate_id("mt", &instance.title);
                    }
                    Err(e) => return Err(e),
                }
            }
            report.instances_created += 1;
        }
    }

    Ok(report)
}
