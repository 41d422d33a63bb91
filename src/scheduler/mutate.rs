use super::lifecycle::ensure_draft;
use super::{SchedError, ScheduleController};
use crate::calendar;
use crate::model::{AssignmentId, AssignmentStatus, ScheduleStatus, ShiftAssignment, UserId};
use crate::template::ShiftTemplate;
use chrono::NaiveDate;

/// Ajout manuel dans un brouillon.
pub(super) fn add_assignment(
    controller: &mut ScheduleController,
    template: &ShiftTemplate,
    shift_date: NaiveDate,
    user: UserId,
) -> Result<AssignmentId, SchedError> {
    ensure_draft(controller)?;
    let schedule = &mut controller.schedule;

    if !template.is_active || template.organization_id != schedule.organization_id {
        return Err(SchedError::UnknownTemplate(template.id.to_string()));
    }
    template.validate()?;
    if !calendar::in_week(shift_date, schedule.week_start) {
        return Err(SchedError::AssignmentInvalid("date outside schedule week"));
    }

    let assignment = ShiftAssignment::pending(&schedule.id, &template.id, shift_date, user);
    if let Some(existing) = schedule.find_assignment_mut(&assignment.id) {
        if existing.is_active() {
            return Err(SchedError::AssignmentInvalid("user already holds this shift"));
        }
        // une affectation annulée redevient PENDING
        existing.status = AssignmentStatus::Pending;
        return Ok(existing.id.clone());
    }

    let id = assignment.id.clone();
    schedule.assignments.push(assignment);
    Ok(id)
}

pub(super) fn remove_assignment(
    controller: &mut ScheduleController,
    id: &AssignmentId,
) -> Result<ShiftAssignment, SchedError> {
    ensure_draft(controller)?;
    let schedule = &mut controller.schedule;
    let Some(pos) = schedule.assignments.iter().position(|a| &a.id == id) else {
        return Err(SchedError::UnknownAssignment(id.to_string()));
    };
    Ok(schedule.assignments.remove(pos))
}

/// Validation manager d'une affectation (hors planning archivé).
pub(super) fn confirm_assignment(
    controller: &mut ScheduleController,
    id: &AssignmentId,
) -> Result<(), SchedError> {
    if controller.schedule.status == ScheduleStatus::Archived {
        return Err(SchedError::Frozen(ScheduleStatus::Archived));
    }
    let assignment = controller
        .schedule
        .find_assignment_mut(id)
        .ok_or_else(|| SchedError::UnknownAssignment(id.to_string()))?;
    match assignment.status {
        AssignmentStatus::Cancelled => Err(SchedError::AssignmentInvalid(
            "cancelled assignment cannot be confirmed",
        )),
        _ => {
            assignment.status = AssignmentStatus::Confirmed;
            Ok(())
        }
    }
}

/// Annulation, permise dans tous les états (défections tardives). Idempotente.
pub(super) fn cancel_assignment(
    controller: &mut ScheduleController,
    id: &AssignmentId,
) -> Result<(), SchedError> {
    let status = controller.schedule.status;
    let assignment = controller
        .schedule
        .find_assignment_mut(id)
        .ok_or_else(|| SchedError::UnknownAssignment(id.to_string()))?;
    if assignment.status != AssignmentStatus::Cancelled {
        assignment.status = AssignmentStatus::Cancelled;
        tracing::info!(assignment = %id, schedule_status = %status, "assignment cancelled");
    }
    Ok(())
}
