use crate::model::{AssignmentId, OrganizationId, ScheduleStatus, ShiftType, TemplateId, UserId};
use crate::settings::ConfigError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Consigne manager appliquée par le constructeur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideAction {
    /// Affecte d'office l'employé au créneau.
    Pin,
    /// Écarte l'employé du créneau.
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerOverride {
    pub user_id: UserId,
    pub shift_date: NaiveDate,
    pub shift_type: ShiftType,
    pub action: OverrideAction,
}

impl ManagerOverride {
    pub fn pin(user_id: UserId, shift_date: NaiveDate, shift_type: ShiftType) -> Self {
        Self {
            user_id,
            shift_date,
            shift_type,
            action: OverrideAction::Pin,
        }
    }

    pub fn block(user_id: UserId, shift_date: NaiveDate, shift_type: ShiftType) -> Self {
        Self {
            user_id,
            shift_date,
            shift_type,
            action: OverrideAction::Block,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    DoubleBooking { user: UserId, count: usize },
    Understaffed { assigned: usize, min: u32 },
    Overstaffed { assigned: usize, max: u32 },
    UnknownTemplate { template: TemplateId },
    OutsideWeek { assignment: AssignmentId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub shift_date: NaiveDate,
    pub shift_type: Option<ShiftType>,
    pub kind: ConflictKind,
}

impl Conflict {
    pub fn is_understaffing(&self) -> bool {
        matches!(self.kind, ConflictKind::Understaffed { .. })
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shift = self.shift_type.map_or("?", ShiftType::as_str);
        match &self.kind {
            ConflictKind::DoubleBooking { user, count } => write!(
                f,
                "{user} is booked {count} times on {} {shift}",
                self.shift_date
            ),
            ConflictKind::Understaffed { assigned, min } => write!(
                f,
                "{} {shift} is understaffed: {assigned} assigned, minimum {min}",
                self.shift_date
            ),
            ConflictKind::Overstaffed { assigned, max } => write!(
                f,
                "{} {shift} is overstaffed: {assigned} assigned, maximum {max}",
                self.shift_date
            ),
            ConflictKind::UnknownTemplate { template } => write!(
                f,
                "assignment on {} references unknown or inactive template {template}",
                self.shift_date
            ),
            ConflictKind::OutsideWeek { assignment } => write!(
                f,
                "assignment {assignment} on {} is outside the schedule week",
                self.shift_date
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: ScheduleStatus,
        to: ScheduleStatus,
    },
    #[error("publish blocked by {} conflict(s)", .0.len())]
    PublishBlocked(Vec<Conflict>),
    #[error("schedule is {0}: assignments cannot be added or removed")]
    Frozen(ScheduleStatus),
    #[error("unknown assignment: {0}")]
    UnknownAssignment(String),
    #[error("unknown or inactive template: {0}")]
    UnknownTemplate(String),
    #[error("assignment invalid: {0}")]
    AssignmentInvalid(&'static str),
    #[error("week {week} of {organization} is already being edited")]
    WeekBusy {
        organization: OrganizationId,
        week: NaiveDate,
    },
    #[error("guard held for week {week} of {organization} does not cover this schedule")]
    GuardMismatch {
        organization: OrganizationId,
        week: NaiveDate,
    },
    #[error("cannot pin {user} on {date} {shift_type}: {reason}")]
    UnplaceablePin {
        user: UserId,
        date: NaiveDate,
        shift_type: ShiftType,
        reason: &'static str,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
