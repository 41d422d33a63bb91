use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    DeadlinePassed,
    InsufficientShifts,
    InsufficientWeekendShifts,
    InvalidShiftType,
    DuplicateSlot,
    SlotOutsideWeek,
    ConflictDetected,
}

/// Famille d'une violation, qui décide du sort de la soumission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationCategory {
    Deadline,
    Rule,
    Structural,
    Capacity,
}

impl ViolationKind {
    pub fn category(self) -> ViolationCategory {
        match self {
            Self::DeadlinePassed => ViolationCategory::Deadline,
            Self::InsufficientShifts | Self::InsufficientWeekendShifts => ViolationCategory::Rule,
            Self::InvalidShiftType | Self::DuplicateSlot | Self::SlotOutsideWeek => {
                ViolationCategory::Structural
            }
            Self::ConflictDetected => ViolationCategory::Capacity,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeadlinePassed => "DEADLINE_PASSED",
            Self::InsufficientShifts => "INSUFFICIENT_SHIFTS",
            Self::InsufficientWeekendShifts => "INSUFFICIENT_WEEKEND_SHIFTS",
            Self::InvalidShiftType => "INVALID_SHIFT_TYPE",
            Self::DuplicateSlot => "DUPLICATE_SLOT",
            Self::SlotOutsideWeek => "SLOT_OUTSIDE_WEEK",
            Self::ConflictDetected => "CONFLICT_DETECTED",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new<M: Into<String>>(kind: ViolationKind, message: M) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Résultat éphémère d'une validation ; `valid` ssi aucune violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<Violation>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            violations: Vec::new(),
        }
    }

    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
        self.valid = false;
    }

    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    pub fn kinds(&self) -> Vec<ViolationKind> {
        self.violations.iter().map(|v| v.kind).collect()
    }
}
