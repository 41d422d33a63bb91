use super::util::SlotKey;
use super::{Conflict, ConflictKind};
use crate::calendar;
use crate::model::{ShiftAssignment, UserId};
use crate::settings::ConfigError;
use crate::template::{ActiveTemplates, ShiftTemplate};
use crate::validation::{ValidationResult, Violation, ViolationKind};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Conflits d'une semaine : références invalides, puis par créneau
/// l'effectif hors bornes et les doubles réservations.
///
/// Les affectations annulées sont ignorées. Un même employé le matin et le
/// soir d'un même jour n'est pas un conflit.
pub fn detect_conflicts(
    week_start: NaiveDate,
    assignments: &[ShiftAssignment],
    templates: &[ShiftTemplate],
) -> Result<Vec<Conflict>, ConfigError> {
    let index = ActiveTemplates::new(templates)?;
    let week = calendar::week_start(week_start);
    let mut out = Vec::new();

    let mut per_slot: BTreeMap<SlotKey, Vec<&UserId>> = BTreeMap::new();
    for assignment in assignments.iter().filter(|a| a.is_active()) {
        let Some(template) = index.by_id(&assignment.shift_template_id) else {
            out.push(Conflict {
                shift_date: assignment.shift_date,
                shift_type: None,
                kind: ConflictKind::UnknownTemplate {
                    template: assignment.shift_template_id.clone(),
                },
            });
            continue;
        };
        if !calendar::in_week(assignment.shift_date, week) {
            out.push(Conflict {
                shift_date: assignment.shift_date,
                shift_type: Some(template.shift_type),
                kind: ConflictKind::OutsideWeek {
                    assignment: assignment.id.clone(),
                },
            });
            continue;
        }
        per_slot
            .entry((assignment.shift_date, template.shift_type))
            .or_default()
            .push(&assignment.user_id);
    }

    for date in calendar::week_dates(week) {
        for template in index.iter() {
            let key: SlotKey = (date, template.shift_type);
            let users = per_slot.get(&key).map(Vec::as_slice).unwrap_or_default();
            let assigned = users.len();

            if assigned < template.min_staff as usize {
                out.push(Conflict {
                    shift_date: date,
                    shift_type: Some(template.shift_type),
                    kind: ConflictKind::Understaffed {
                        assigned,
                        min: template.min_staff,
                    },
                });
            } else if assigned > template.max_staff as usize {
                out.push(Conflict {
                    shift_date: date,
                    shift_type: Some(template.shift_type),
                    kind: ConflictKind::Overstaffed {
                        assigned,
                        max: template.max_staff,
                    },
                });
            }

            let mut counts: BTreeMap<&UserId, usize> = BTreeMap::new();
            for user in users {
                *counts.entry(*user).or_default() += 1;
            }
            for (user, count) in counts.into_iter().filter(|(_, c)| *c > 1) {
                out.push(Conflict {
                    shift_date: date,
                    shift_type: Some(template.shift_type),
                    kind: ConflictKind::DoubleBooking {
                        user: user.clone(),
                        count,
                    },
                });
            }
        }
    }

    Ok(out)
}

/// Rendu `ValidationResult` : une violation `CONFLICT_DETECTED` par conflit.
pub fn check_capacity(
    week_start: NaiveDate,
    assignments: &[ShiftAssignment],
    templates: &[ShiftTemplate],
) -> Result<ValidationResult, ConfigError> {
    let conflicts = detect_conflicts(week_start, assignments, templates)?;
    Ok(conflicts_to_result(&conflicts))
}

pub(crate) fn conflicts_to_result(conflicts: &[Conflict]) -> ValidationResult {
    ValidationResult::from_violations(
        conflicts
            .iter()
            .map(|c| Violation::new(ViolationKind::ConflictDetected, c.to_string()))
            .collect(),
    )
}
