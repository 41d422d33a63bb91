mod assignment;
mod conflicts;
mod lifecycle;
mod lock;
mod mutate;
mod types;
mod util;

pub use assignment::build_assignments;
pub use conflicts::{check_capacity, detect_conflicts};
pub use lock::{WeekGuard, WeekLocks};
pub use types::{Conflict, ConflictKind, ManagerOverride, OverrideAction, SchedError};

use crate::model::{
    AssignmentId, AvailabilitySubmission, OrganizationId, ShiftAssignment, UserId, WeeklySchedule,
};
use crate::template::ShiftTemplate;
use crate::validation::ValidationResult;
use chrono::{NaiveDate, NaiveDateTime};

/// Contrôleur de cycle de vie : encapsule un planning hebdomadaire.
#[derive(Debug, Clone)]
pub struct ScheduleController {
    schedule: WeeklySchedule,
}

impl ScheduleController {
    /// Nouveau brouillon pour la semaine contenant `week_of`.
    pub fn new_draft(organization_id: OrganizationId, week_of: NaiveDate, created_by: UserId) -> Self {
        Self {
            schedule: WeeklySchedule::draft(organization_id, week_of, created_by),
        }
    }

    /// Reprend un planning déjà persisté.
    pub fn from_schedule(schedule: WeeklySchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &WeeklySchedule {
        &self.schedule
    }
    pub fn into_schedule(self) -> WeeklySchedule {
        self.schedule
    }

    /// Remplace les affectations du brouillon ; renvoie le rapport (non bloquant).
    ///
    /// Exige la garde de la semaine (voir [`WeekLocks`]).
    pub fn build_draft(
        &mut self,
        guard: &WeekGuard,
        submissions: &[AvailabilitySubmission],
        templates: &[ShiftTemplate],
        overrides: &[ManagerOverride],
    ) -> Result<ValidationResult, SchedError> {
        lifecycle::build_draft(self, guard, submissions, templates, overrides)
    }

    /// Conflits courants, calculés sur les templates de l'organisation.
    pub fn conflicts(&self, templates: &[ShiftTemplate]) -> Result<Vec<Conflict>, SchedError> {
        let own = self.own_templates(templates);
        Ok(detect_conflicts(
            self.schedule.week_start,
            &self.schedule.assignments,
            &own,
        )?)
    }

    pub fn check(&self, templates: &[ShiftTemplate]) -> Result<ValidationResult, SchedError> {
        let own = self.own_templates(templates);
        Ok(check_capacity(
            self.schedule.week_start,
            &self.schedule.assignments,
            &own,
        )?)
    }

    pub fn publish(
        &mut self,
        guard: &WeekGuard,
        templates: &[ShiftTemplate],
        now: NaiveDateTime,
    ) -> Result<(), SchedError> {
        lifecycle::publish(self, guard, templates, now)
    }

    pub fn archive(&mut self) -> Result<(), SchedError> {
        lifecycle::archive(self)
    }

    pub fn add_assignment(
        &mut self,
        template: &ShiftTemplate,
        shift_date: NaiveDate,
        user: UserId,
    ) -> Result<AssignmentId, SchedError> {
        mutate::add_assignment(self, template, shift_date, user)
    }

    pub fn remove_assignment(&mut self, id: &AssignmentId) -> Result<ShiftAssignment, SchedError> {
        mutate::remove_assignment(self, id)
    }

    pub fn confirm_assignment(&mut self, id: &AssignmentId) -> Result<(), SchedError> {
        mutate::confirm_assignment(self, id)
    }

    pub fn cancel_assignment(&mut self, id: &AssignmentId) -> Result<(), SchedError> {
        mutate::cancel_assignment(self, id)
    }

    fn own_templates(&self, templates: &[ShiftTemplate]) -> Vec<ShiftTemplate> {
        templates
            .iter()
            .filter(|t| t.organization_id == self.schedule.organization_id)
            .cloned()
            .collect()
    }
}
