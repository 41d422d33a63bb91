use crate::calendar;
use crate::model::{OrganizationId, ShiftType};
use crate::rules::EmploymentType;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Défaut de configuration : relève de l'administrateur, pas de l'employé.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("weekend days cannot be empty")]
    EmptyWeekendDays,
    #[error("weekday index out of range (0-6): {0}")]
    InvalidWeekday(u8),
    #[error("duplicate weekend day: {0}")]
    DuplicateWeekendDay(u8),
    #[error("submission deadline hour out of range (0-23): {0}")]
    InvalidDeadlineHour(u8),
    #[error("template {template}: name cannot be empty")]
    EmptyTemplateName { template: String },
    #[error("template {template}: min_staff {min} exceeds max_staff {max}")]
    InvalidStaffRange { template: String, min: u32, max: u32 },
    #[error("template {template}: invalid time of day {value:?} (expected HH:MM)")]
    InvalidTimeOfDay { template: String, value: String },
    #[error("template {template}: start_time and end_time cannot be equal")]
    EmptyTimeWindow { template: String },
    #[error("several active templates for shift type {0}")]
    DuplicateShiftType(ShiftType),
    #[error("no work rule for employment type {0}")]
    MissingWorkRule(EmploymentType),
    #[error(
        "work rule for {employment_type}: min_weekend_shifts {min_weekend_shifts} exceeds min_shifts {min_shifts}"
    )]
    ContradictoryWorkRule {
        employment_type: EmploymentType,
        min_shifts: u32,
        min_weekend_shifts: u32,
    },
}

/// Ensemble normalisé des jours de week-end (0 = dimanche).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekendDays(Vec<u8>);

impl WeekendDays {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn contains(&self, day: u8) -> bool {
        self.0.contains(&day)
    }
}

impl TryFrom<Vec<u8>> for WeekendDays {
    type Error = ConfigError;

    fn try_from(days: Vec<u8>) -> Result<Self, Self::Error> {
        if days.is_empty() {
            return Err(ConfigError::EmptyWeekendDays);
        }
        let mut sorted = Vec::with_capacity(days.len());
        for day in days {
            if day > 6 {
                return Err(ConfigError::InvalidWeekday(day));
            }
            if sorted.contains(&day) {
                return Err(ConfigError::DuplicateWeekendDay(day));
            }
            sorted.push(day);
        }
        sorted.sort_unstable();
        Ok(Self(sorted))
    }
}

impl From<WeekendDays> for Vec<u8> {
    fn from(days: WeekendDays) -> Self {
        days.0
    }
}

/// Paramètres d'une organisation (1:1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessSettings {
    pub organization_id: OrganizationId,
    pub weekend_days: WeekendDays,
    pub submission_deadline_day: u8,
    pub submission_deadline_hour: u8,
}

impl BusinessSettings {
    pub const DEFAULT_WEEKEND_DAYS: [u8; 2] = [5, 6];
    pub const DEFAULT_DEADLINE_DAY: u8 = 4;
    pub const DEFAULT_DEADLINE_HOUR: u8 = 18;

    pub fn new(
        organization_id: OrganizationId,
        weekend_days: Vec<u8>,
        submission_deadline_day: u8,
        submission_deadline_hour: u8,
    ) -> Result<Self, ConfigError> {
        let settings = Self {
            organization_id,
            weekend_days: WeekendDays::try_from(weekend_days)?,
            submission_deadline_day,
            submission_deadline_hour,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Valeurs créées à la première lecture : week-end vendredi/samedi,
    /// échéance jeudi 18h.
    pub fn defaults_for(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            weekend_days: WeekendDays(Self::DEFAULT_WEEKEND_DAYS.to_vec()),
            submission_deadline_day: Self::DEFAULT_DEADLINE_DAY,
            submission_deadline_hour: Self::DEFAULT_DEADLINE_HOUR,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        WeekendDays::try_from(self.weekend_days.0.clone())?;
        if self.submission_deadline_day > 6 {
            return Err(ConfigError::InvalidWeekday(self.submission_deadline_day));
        }
        if self.submission_deadline_hour > 23 {
            return Err(ConfigError::InvalidDeadlineHour(
                self.submission_deadline_hour,
            ));
        }
        Ok(())
    }

    pub fn is_weekend(&self, date: NaiveDate) -> bool {
        calendar::is_weekend_day(date, self.weekend_days.as_slice())
    }

    pub fn deadline_for(&self, week_start: NaiveDate) -> NaiveDateTime {
        calendar::deadline_instant(
            week_start,
            self.submission_deadline_day,
            self.submission_deadline_hour,
        )
    }

    pub fn is_past_deadline(&self, now: NaiveDateTime, week_start: NaiveDate) -> bool {
        calendar::is_past_deadline(
            now,
            week_start,
            self.submission_deadline_day,
            self.submission_deadline_hour,
        )
    }
}

/// Accès aux paramètres fourni par l'application hôte.
///
/// La création paresseuse est explicite : `get_or_create` écrit les valeurs
/// par défaut si rien n'existe encore.
pub trait SettingsProvider {
    fn get_or_create(&mut self, organization_id: &OrganizationId)
        -> anyhow::Result<BusinessSettings>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekend_days_are_normalised() {
        let days = WeekendDays::try_from(vec![6, 4, 5]).unwrap();
        assert_eq!(days.as_slice(), &[4, 5, 6]);
        assert_eq!(
            WeekendDays::try_from(vec![]),
            Err(ConfigError::EmptyWeekendDays)
        );
        assert_eq!(
            WeekendDays::try_from(vec![5, 5]),
            Err(ConfigError::DuplicateWeekendDay(5))
        );
        assert_eq!(
            WeekendDays::try_from(vec![7]),
            Err(ConfigError::InvalidWeekday(7))
        );
    }

    #[test]
    fn settings_reject_bad_deadline() {
        let org = OrganizationId::new("acme");
        assert_eq!(
            BusinessSettings::new(org.clone(), vec![5, 6], 4, 24),
            Err(ConfigError::InvalidDeadlineHour(24))
        );
        assert_eq!(
            BusinessSettings::new(org.clone(), vec![5, 6], 7, 10),
            Err(ConfigError::InvalidWeekday(7))
        );
        assert!(BusinessSettings::defaults_for(org).validate().is_ok());
    }

    #[test]
    fn deserialising_duplicates_fails() {
        let raw = r#"{"organization_id":"acme","weekend_days":[5,5],"submission_deadline_day":4,"submission_deadline_hour":18}"#;
        assert!(serde_json::from_str::<BusinessSettings>(raw).is_err());
    }
}
