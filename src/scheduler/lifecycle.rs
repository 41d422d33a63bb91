use super::conflicts::conflicts_to_result;
use super::{build_assignments, ManagerOverride, SchedError, ScheduleController, WeekGuard};
use crate::model::{AssignmentStatus, AvailabilitySubmission, ScheduleStatus};
use crate::template::ShiftTemplate;
use crate::validation::ValidationResult;
use chrono::NaiveDateTime;

pub(super) fn ensure_transition(
    from: ScheduleStatus,
    to: ScheduleStatus,
) -> Result<(), SchedError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(SchedError::InvalidTransition { from, to })
    }
}

pub(super) fn ensure_draft(controller: &ScheduleController) -> Result<(), SchedError> {
    match controller.schedule.status {
        ScheduleStatus::Draft => Ok(()),
        other => Err(SchedError::Frozen(other)),
    }
}

/// La garde doit porter sur l'organisation et la semaine du planning.
pub(super) fn ensure_guard(
    controller: &ScheduleController,
    guard: &WeekGuard,
) -> Result<(), SchedError> {
    let schedule = &controller.schedule;
    if guard.covers(&schedule.organization_id, schedule.week_start) {
        Ok(())
    } else {
        Err(SchedError::GuardMismatch {
            organization: guard.organization().clone(),
            week: guard.week(),
        })
    }
}

pub(super) fn build_draft(
    controller: &mut ScheduleController,
    guard: &WeekGuard,
    submissions: &[AvailabilitySubmission],
    templates: &[ShiftTemplate],
    overrides: &[ManagerOverride],
) -> Result<ValidationResult, SchedError> {
    ensure_guard(controller, guard)?;
    ensure_draft(controller)?;
    let assignments = build_assignments(&controller.schedule, submissions, templates, overrides)?;
    controller.schedule.assignments = assignments;

    // le sous-effectif est attendu à ce stade : rapporté, jamais bloquant
    let conflicts = controller.conflicts(templates)?;
    tracing::info!(
        schedule = %controller.schedule.id,
        week = %controller.schedule.week_start,
        assignments = controller.schedule.assignments.len(),
        conflicts = conflicts.len(),
        "draft built"
    );
    Ok(conflicts_to_result(&conflicts))
}

pub(super) fn publish(
    controller: &mut ScheduleController,
    guard: &WeekGuard,
    templates: &[ShiftTemplate],
    now: NaiveDateTime,
) -> Result<(), SchedError> {
    ensure_guard(controller, guard)?;
    ensure_transition(controller.schedule.status, ScheduleStatus::Published)?;

    let conflicts = controller.conflicts(templates)?;
    if !conflicts.is_empty() {
        tracing::warn!(
            schedule = %controller.schedule.id,
            conflicts = conflicts.len(),
            "publish blocked"
        );
        return Err(SchedError::PublishBlocked(conflicts));
    }

    let schedule = &mut controller.schedule;
    schedule.status = ScheduleStatus::Published;
    schedule.published_at.get_or_insert(now);
    for assignment in &mut schedule.assignments {
        if assignment.status == AssignmentStatus::Pending {
            assignment.status = AssignmentStatus::Confirmed;
        }
    }
    tracing::info!(schedule = %schedule.id, week = %schedule.week_start, "schedule published");
    Ok(())
}

pub(super) fn archive(controller: &mut ScheduleController) -> Result<(), SchedError> {
    ensure_transition(controller.schedule.status, ScheduleStatus::Archived)?;
    controller.schedule.status = ScheduleStatus::Archived;
    tracing::info!(schedule = %controller.schedule.id, "schedule archived");
    Ok(())
}
