#![forbid(unsafe_code)]
//! Roulement : moteur de règles et d'affectation pour plannings hebdomadaires.
//!
//! - Validation des disponibilités (minimums par contrat, week-end, échéance),
//!   puis décision du manager avant l'échéance.
//! - Construction d'un brouillon d'affectations par rang de préférence.
//! - Détection de conflits (double réservation, effectif hors bornes).
//! - Cycle de vie DRAFT → PUBLISHED → ARCHIVED.
//! - Tout en heure locale ; la persistance reste à l'application hôte.

pub mod calendar;
pub mod io;
pub mod model;
pub mod notification;
pub mod rules;
pub mod scheduler;
pub mod settings;
pub mod storage;
pub mod template;
pub mod validation;
pub mod validator;

pub use model::{
    AssignmentId, AssignmentStatus, AvailabilitySlot, AvailabilitySubmission, Employee,
    Organization, OrganizationId, ScheduleId, ScheduleStatus, ShiftAssignment, ShiftType,
    SubmissionId, SubmissionStatus, TemplateId, UserId, WeeklySchedule,
};
pub use notification::{prepare_notice, render_violations, NoticeRenderer, PublicationNotice, TextNotice};
pub use rules::{EmploymentType, WorkRule, WorkRules};
pub use scheduler::{
    build_assignments, check_capacity, detect_conflicts, Conflict, ConflictKind, ManagerOverride,
    OverrideAction, SchedError, ScheduleController, WeekGuard, WeekLocks,
};
pub use settings::{BusinessSettings, ConfigError, SettingsProvider, WeekendDays};
pub use storage::{JsonStorage, Storage, Workspace, WorkspaceLock};
pub use template::{load_templates_from_file, ActiveTemplates, ShiftTemplate};
pub use validation::{ValidationResult, Violation, ViolationCategory, ViolationKind};
pub use validator::{
    accept_submission, approve_submission, reject_submission, review_status, review_submission,
    validate_submission, ReviewDecision, ReviewError, SubmissionContext,
};
