use super::types::{ManagerOverride, OverrideAction, SchedError};
use super::util::{self, SlotKey};
use crate::calendar;
use crate::model::{AvailabilitySubmission, ShiftAssignment, UserId, WeeklySchedule};
use crate::template::{ActiveTemplates, ShiftTemplate};
use chrono::{NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

struct Candidate<'a> {
    rank: u32,
    position: usize,
    submitted_at: Option<NaiveDateTime>,
    user: &'a UserId,
}

impl Candidate<'_> {
    fn cmp_priority(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| {
                util::submitted_order(self.submitted_at).cmp(&util::submitted_order(other.submitted_at))
            })
            .then_with(|| self.user.cmp(other.user))
            .then_with(|| self.position.cmp(&other.position))
    }
}

/// Construit les affectations PENDING d'un brouillon.
///
/// Créneaux parcourus par date puis par type ; sur chacun, les épinglés
/// d'abord puis les candidats par rang, `submitted_at`, id utilisateur,
/// jusqu'à `max_staff`. Fonction pure : mêmes entrées, même liste.
///
/// Un épinglage hors semaine ou sans template actif pour son type est refusé
/// (`SchedError::UnplaceablePin`) plutôt qu'ignoré.
pub fn build_assignments(
    schedule: &WeeklySchedule,
    submissions: &[AvailabilitySubmission],
    templates: &[ShiftTemplate],
    overrides: &[ManagerOverride],
) -> Result<Vec<ShiftAssignment>, SchedError> {
    let index = ActiveTemplates::for_organization(templates, &schedule.organization_id)?;
    let week = calendar::week_start(schedule.week_start);
    check_overrides(overrides, week, &index)?;

    let mut eligible: Vec<&AvailabilitySubmission> = Vec::new();
    for submission in submissions {
        if submission.organization_id != schedule.organization_id
            || calendar::week_start(submission.week_start) != week
            || !submission.status.is_eligible()
        {
            continue;
        }
        if eligible.iter().any(|s| s.user_id == submission.user_id) {
            tracing::warn!(user = %submission.user_id, %week, "duplicate submission ignored");
            continue;
        }
        eligible.push(submission);
    }

    let mut out = Vec::new();
    for date in calendar::week_dates(week) {
        for template in index.iter() {
            let key: SlotKey = (date, template.shift_type);

            let pinned = util::pinned_users(overrides, key);
            for user in &pinned {
                out.push(ShiftAssignment::pending(
                    &schedule.id,
                    &template.id,
                    date,
                    (*user).clone(),
                ));
            }

            let mut candidates: Vec<Candidate<'_>> = eligible
                .iter()
                .copied()
                .filter(|s| !util::overridden(overrides, key, &s.user_id))
                .filter_map(|s| {
                    s.best_slot_for(date, template.shift_type)
                        .map(|(rank, position)| Candidate {
                            rank,
                            position,
                            submitted_at: s.submitted_at,
                            user: &s.user_id,
                        })
                })
                .collect();
            candidates.sort_by(|a, b| a.cmp_priority(b));

            let room = (template.max_staff as usize).saturating_sub(pinned.len());
            for candidate in candidates.into_iter().take(room) {
                out.push(ShiftAssignment::pending(
                    &schedule.id,
                    &template.id,
                    date,
                    candidate.user.clone(),
                ));
            }
        }
    }

    tracing::debug!(
        schedule = %schedule.id,
        %week,
        submissions = eligible.len(),
        assignments = out.len(),
        "assignments built"
    );
    Ok(out)
}

fn check_overrides(
    overrides: &[ManagerOverride],
    week: NaiveDate,
    index: &ActiveTemplates<'_>,
) -> Result<(), SchedError> {
    for o in overrides {
        let reason = if !calendar::in_week(o.shift_date, week) {
            "date is outside the schedule week"
        } else if index.by_type(o.shift_type).is_none() {
            "no active template for this shift type"
        } else {
            continue;
        };
        match o.action {
            OverrideAction::Pin => {
                return Err(SchedError::UnplaceablePin {
                    user: o.user_id.clone(),
                    date: o.shift_date,
                    shift_type: o.shift_type,
                    reason,
                })
            }
            // rien à écarter : sans effet
            OverrideAction::Block => {
                tracing::warn!(
                    user = %o.user_id,
                    date = %o.shift_date,
                    shift = %o.shift_type,
                    reason,
                    "block override ignored"
                );
            }
        }
    }
    Ok(())
}
