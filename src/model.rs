use crate::rules::EmploymentType;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant fort pour Organization
    OrganizationId
);
string_id!(
    /// Identifiant fort pour un employé (utilisateur)
    UserId
);
string_id!(TemplateId);
string_id!(SubmissionId);
string_id!(ScheduleId);
string_id!(
    /// Identifiant d'affectation ; dérivé (UUID v5) pour rester déterministe
    AssignmentId
);

impl AssignmentId {
    pub fn derive(
        schedule: &ScheduleId,
        date: NaiveDate,
        template: &TemplateId,
        user: &UserId,
    ) -> Self {
        let name = format!("{schedule}/{date}/{template}/{user}");
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string())
    }
}

/// Type de créneau (ensemble fermé)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftType {
    Morning,
    Evening,
    EveningClose,
}

impl ShiftType {
    pub const ALL: [ShiftType; 3] = [Self::Morning, Self::Evening, Self::EveningClose];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "MORNING",
            Self::Evening => "EVENING",
            Self::EveningClose => "EVENING_CLOSE",
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == norm)
            .ok_or_else(|| format!("unknown shift type: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    /// Nom IANA, conservé tel quel : les calculs restent en heure locale.
    pub timezone: String,
}

/// Employé tel que fourni par l'application hôte
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: UserId,
    pub organization_id: OrganizationId,
    pub display_name: String,
    pub employment_type: EmploymentType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
    RequiresChanges,
}

impl SubmissionStatus {
    /// Statuts retenus par le constructeur d'affectations.
    pub fn is_eligible(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    /// Statuts sur lesquels un manager peut encore trancher.
    pub fn is_reviewable(self) -> bool {
        matches!(self, Self::Pending | Self::RequiresChanges)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::RequiresChanges => "REQUIRES_CHANGES",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Préférence (date, type) d'une soumission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub shift_date: NaiveDate,
    pub shift_type: ShiftType,
    /// Plus petit = préféré
    pub preference_rank: u32,
}

impl AvailabilitySlot {
    pub fn new(shift_date: NaiveDate, shift_type: ShiftType, preference_rank: u32) -> Self {
        Self {
            shift_date,
            shift_type,
            preference_rank,
        }
    }
}

/// Disponibilités d'un employé pour une semaine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySubmission {
    pub id: SubmissionId,
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub employment_type: EmploymentType,
    pub week_start: NaiveDate,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub submitted_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub slots: Vec<AvailabilitySlot>,
}

impl AvailabilitySubmission {
    /// `week_of` peut être n'importe quel jour de la semaine visée.
    pub fn new(
        user_id: UserId,
        organization_id: OrganizationId,
        employment_type: EmploymentType,
        week_of: NaiveDate,
    ) -> Self {
        Self {
            id: SubmissionId::random(),
            user_id,
            organization_id,
            employment_type,
            week_start: crate::calendar::week_start(week_of),
            status: SubmissionStatus::Pending,
            submitted_at: None,
            slots: Vec::new(),
        }
    }

    pub fn with_slots(mut self, slots: Vec<AvailabilitySlot>) -> Self {
        self.slots = slots;
        self
    }

    pub fn add_slot(&mut self, shift_date: NaiveDate, shift_type: ShiftType, rank: u32) {
        self.slots
            .push(AvailabilitySlot::new(shift_date, shift_type, rank));
    }

    /// Meilleur rang déclaré pour (date, type), avec sa position d'insertion.
    pub fn best_slot_for(&self, date: NaiveDate, shift_type: ShiftType) -> Option<(u32, usize)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.shift_date == date && s.shift_type == shift_type)
            .map(|(pos, s)| (s.preference_rank, pos))
            .min()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub id: AssignmentId,
    pub schedule_id: ScheduleId,
    pub user_id: UserId,
    pub shift_template_id: TemplateId,
    pub shift_date: NaiveDate,
    pub status: AssignmentStatus,
}

impl ShiftAssignment {
    pub fn pending(
        schedule_id: &ScheduleId,
        template_id: &TemplateId,
        shift_date: NaiveDate,
        user_id: UserId,
    ) -> Self {
        Self {
            id: AssignmentId::derive(schedule_id, shift_date, template_id, &user_id),
            schedule_id: schedule_id.clone(),
            user_id,
            shift_template_id: template_id.clone(),
            shift_date,
            status: AssignmentStatus::Pending,
        }
    }

    /// Non annulée
    pub fn is_active(&self) -> bool {
        self.status != AssignmentStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Draft,
    Published,
    Archived,
}

impl ScheduleStatus {
    /// Seules les transitions avant d'un cran sont permises.
    pub fn can_transition_to(self, next: ScheduleStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Published) | (Self::Published, Self::Archived)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Planning hebdomadaire et ses affectations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub id: ScheduleId,
    pub organization_id: OrganizationId,
    pub week_start: NaiveDate,
    pub status: ScheduleStatus,
    pub created_by: UserId,
    #[serde(default)]
    pub published_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub assignments: Vec<ShiftAssignment>,
}

impl WeeklySchedule {
    pub fn draft(organization_id: OrganizationId, week_of: NaiveDate, created_by: UserId) -> Self {
        Self {
            id: ScheduleId::random(),
            organization_id,
            week_start: crate::calendar::week_start(week_of),
            status: ScheduleStatus::Draft,
            created_by,
            published_at: None,
            assignments: Vec::new(),
        }
    }

    pub fn find_assignment(&self, id: &AssignmentId) -> Option<&ShiftAssignment> {
        self.assignments.iter().find(|a| &a.id == id)
    }
    pub fn find_assignment_mut(&mut self, id: &AssignmentId) -> Option<&mut ShiftAssignment> {
        self.assignments.iter_mut().find(|a| &a.id == id)
    }
    pub fn assignments_for<'a>(
        &'a self,
        user: &'a UserId,
    ) -> impl Iterator<Item = &'a ShiftAssignment> + 'a {
        self.assignments
            .iter()
            .filter(move |a| &a.user_id == user && a.is_active())
    }
}
