//! Validation d'une soumission de disponibilités.
//!
//! L'échéance est exclusive : une soumission tardive (jamais enregistrée)
//! ne reçoit que `DEADLINE_PASSED`. Sinon toutes les vérifications tournent et
//! la liste complète est renvoyée en une passe.

use crate::calendar;
use crate::model::{AvailabilitySubmission, ShiftType, SubmissionStatus};
use crate::rules::WorkRules;
use crate::settings::{BusinessSettings, ConfigError};
use crate::template::{ActiveTemplates, ShiftTemplate};
use crate::validation::{ValidationResult, Violation, ViolationCategory, ViolationKind};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;

/// Entrées organisationnelles de la validation.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionContext<'a> {
    pub settings: &'a BusinessSettings,
    pub templates: &'a [ShiftTemplate],
    pub rules: &'a WorkRules,
}

pub fn validate_submission(
    submission: &AvailabilitySubmission,
    ctx: SubmissionContext<'_>,
    now: NaiveDateTime,
) -> Result<ValidationResult, ConfigError> {
    ctx.settings.validate()?;
    ctx.rules.validate()?;
    let templates = ActiveTemplates::for_organization(ctx.templates, &submission.organization_id)?;
    let rule = ctx.rules.get(submission.employment_type)?;

    let week = calendar::week_start(submission.week_start);
    if submission.submitted_at.is_none() && ctx.settings.is_past_deadline(now, week) {
        tracing::debug!(user = %submission.user_id, %week, "submission past deadline");
        return Ok(ValidationResult::from_violations(vec![Violation::new(
            ViolationKind::DeadlinePassed,
            format!(
                "submission deadline for week {week} passed at {}",
                ctx.settings.deadline_for(week).format("%Y-%m-%d %H:%M")
            ),
        )]));
    }

    let mut result = ValidationResult::ok();

    let total = submission.slots.len();
    if total < rule.min_shifts as usize {
        result.push(Violation::new(
            ViolationKind::InsufficientShifts,
            format!(
                "{} requires at least {} shifts, {total} submitted",
                submission.employment_type, rule.min_shifts
            ),
        ));
    }

    let weekend = submission
        .slots
        .iter()
        .filter(|s| ctx.settings.is_weekend(s.shift_date))
        .count();
    if weekend < rule.min_weekend_shifts as usize {
        result.push(Violation::new(
            ViolationKind::InsufficientWeekendShifts,
            format!(
                "{} requires at least {} weekend shifts, {weekend} submitted",
                submission.employment_type, rule.min_weekend_shifts
            ),
        ));
    }

    for slot in &submission.slots {
        if templates.by_type(slot.shift_type).is_none() {
            result.push(Violation::new(
                ViolationKind::InvalidShiftType,
                format!(
                    "no active template for shift type {} (slot on {})",
                    slot.shift_type, slot.shift_date
                ),
            ));
        }
    }

    let mut seen: BTreeSet<(NaiveDate, ShiftType)> = BTreeSet::new();
    let mut reported: BTreeSet<(NaiveDate, ShiftType)> = BTreeSet::new();
    for slot in &submission.slots {
        let key = (slot.shift_date, slot.shift_type);
        if !seen.insert(key) && reported.insert(key) {
            result.push(Violation::new(
                ViolationKind::DuplicateSlot,
                format!("slot {} {} listed more than once", key.0, key.1),
            ));
        }
    }

    for slot in &submission.slots {
        if !calendar::in_week(slot.shift_date, week) {
            result.push(Violation::new(
                ViolationKind::SlotOutsideWeek,
                format!("slot on {} is outside week {week}", slot.shift_date),
            ));
        }
    }

    tracing::debug!(
        user = %submission.user_id,
        %week,
        valid = result.valid,
        violations = result.violations.len(),
        "submission validated"
    );
    Ok(result)
}

/// Statut à enregistrer pour une soumission après validation.
pub fn review_status(result: &ValidationResult) -> SubmissionStatus {
    if result.valid {
        return SubmissionStatus::Pending;
    }
    let fatal = result.violations.iter().any(|v| {
        matches!(
            v.kind.category(),
            ViolationCategory::Deadline | ViolationCategory::Structural
        )
    });
    if fatal {
        SubmissionStatus::Rejected
    } else {
        SubmissionStatus::RequiresChanges
    }
}

/// Applique le résultat : statut, et `submitted_at` posé une seule fois.
pub fn accept_submission(
    submission: &mut AvailabilitySubmission,
    result: &ValidationResult,
    now: NaiveDateTime,
) -> SubmissionStatus {
    let status = review_status(result);
    submission.status = status;
    if result.valid && submission.submitted_at.is_none() {
        submission.submitted_at = Some(now);
    }
    status
}

/// Décision d'un manager sur une soumission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl FromStr for ReviewDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" | "approved" => Ok(Self::Approve),
            "reject" | "rejected" => Ok(Self::Reject),
            _ => Err(format!("unknown review decision: {s} (approve|reject)")),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("submission is {0}: only PENDING or REQUIRES_CHANGES can be reviewed")]
    NotReviewable(SubmissionStatus),
    #[error("review window for week {week} closed at {deadline}")]
    DeadlinePassed {
        week: NaiveDate,
        deadline: NaiveDateTime,
    },
}

/// Tranche une soumission PENDING ou REQUIRES_CHANGES avant l'échéance.
///
/// Approuver une REQUIRES_CHANGES lève les manques de règles constatés par
/// la validation ; `submitted_at` n'est pas touché.
pub fn review_submission(
    submission: &mut AvailabilitySubmission,
    decision: ReviewDecision,
    settings: &BusinessSettings,
    now: NaiveDateTime,
) -> Result<SubmissionStatus, ReviewError> {
    if !submission.status.is_reviewable() {
        return Err(ReviewError::NotReviewable(submission.status));
    }
    let week = calendar::week_start(submission.week_start);
    if is_locked(submission, settings, now) {
        return Err(ReviewError::DeadlinePassed {
            week,
            deadline: settings.deadline_for(week),
        });
    }
    submission.status = match decision {
        ReviewDecision::Approve => SubmissionStatus::Approved,
        ReviewDecision::Reject => SubmissionStatus::Rejected,
    };
    tracing::info!(
        user = %submission.user_id,
        %week,
        status = %submission.status,
        "submission reviewed"
    );
    Ok(submission.status)
}

pub fn approve_submission(
    submission: &mut AvailabilitySubmission,
    settings: &BusinessSettings,
    now: NaiveDateTime,
) -> Result<SubmissionStatus, ReviewError> {
    review_submission(submission, ReviewDecision::Approve, settings, now)
}

pub fn reject_submission(
    submission: &mut AvailabilitySubmission,
    settings: &BusinessSettings,
    now: NaiveDateTime,
) -> Result<SubmissionStatus, ReviewError> {
    review_submission(submission, ReviewDecision::Reject, settings, now)
}

/// Vrai si la semaine de la soumission n'accepte plus de modification.
pub fn is_locked(
    submission: &AvailabilitySubmission,
    settings: &BusinessSettings,
    now: NaiveDateTime,
) -> bool {
    settings.is_past_deadline(now, submission.week_start)
}
