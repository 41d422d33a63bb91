//! Adaptateur fichier jouant le rôle du magasin d'enregistrements externe.
//!
//! Les jours de week-end sont acceptés en tableau (`[5, 6]`) ou en chaîne
//! (`"5,6"`) à la lecture et toujours réécrits en tableau ; le moteur ne voit
//! que `WeekendDays`.

use crate::calendar;
use crate::io::parse_weekend_days;
use crate::model::{
    AvailabilitySubmission, Employee, Organization, OrganizationId, UserId, WeeklySchedule,
};
use crate::settings::{BusinessSettings, SettingsProvider};
use crate::template::ShiftTemplate;
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredWeekendDays {
    List(Vec<u8>),
    Joined(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSettings {
    organization_id: OrganizationId,
    weekend_days: StoredWeekendDays,
    submission_deadline_day: u8,
    submission_deadline_hour: u8,
}

impl StoredSettings {
    fn decode(&self) -> anyhow::Result<BusinessSettings> {
        let days = match &self.weekend_days {
            StoredWeekendDays::List(days) => days.clone(),
            StoredWeekendDays::Joined(raw) => parse_weekend_days(raw)?,
        };
        BusinessSettings::new(
            self.organization_id.clone(),
            days,
            self.submission_deadline_day,
            self.submission_deadline_hour,
        )
        .with_context(|| format!("invalid settings for organization {}", self.organization_id))
    }

    fn encode(settings: &BusinessSettings) -> Self {
        Self {
            organization_id: settings.organization_id.clone(),
            weekend_days: StoredWeekendDays::List(settings.weekend_days.as_slice().to_vec()),
            submission_deadline_day: settings.submission_deadline_day,
            submission_deadline_hour: settings.submission_deadline_hour,
        }
    }
}

/// Instantané complet des enregistrements consultés par le moteur.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    settings: Vec<StoredSettings>,
    #[serde(default)]
    pub templates: Vec<ShiftTemplate>,
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub submissions: Vec<AvailabilitySubmission>,
    #[serde(default)]
    pub schedules: Vec<WeeklySchedule>,
}

impl Workspace {
    pub fn find_organization(&self, id: &OrganizationId) -> Option<&Organization> {
        self.organizations.iter().find(|o| &o.id == id)
    }

    pub fn settings_for(&self, id: &OrganizationId) -> anyhow::Result<Option<BusinessSettings>> {
        self.settings
            .iter()
            .find(|s| &s.organization_id == id)
            .map(StoredSettings::decode)
            .transpose()
    }

    /// Écriture réservée à l'administrateur de l'organisation.
    pub fn put_settings(&mut self, settings: &BusinessSettings) -> anyhow::Result<()> {
        settings.validate()?;
        let stored = StoredSettings::encode(settings);
        match self
            .settings
            .iter_mut()
            .find(|s| s.organization_id == settings.organization_id)
        {
            Some(slot) => *slot = stored,
            None => self.settings.push(stored),
        }
        Ok(())
    }

    pub fn templates_for(&self, id: &OrganizationId) -> Vec<ShiftTemplate> {
        self.templates
            .iter()
            .filter(|t| &t.organization_id == id)
            .cloned()
            .collect()
    }

    pub fn find_employee(&self, id: &UserId) -> Option<&Employee> {
        self.employees.iter().find(|e| &e.id == id)
    }

    pub fn submissions_for(&self, org: &OrganizationId, week: NaiveDate) -> Vec<AvailabilitySubmission> {
        let week = calendar::week_start(week);
        self.submissions
            .iter()
            .filter(|s| &s.organization_id == org && calendar::week_start(s.week_start) == week)
            .cloned()
            .collect()
    }

    /// Une soumission par (organisation, utilisateur, semaine) : remplace l'existante.
    pub fn upsert_submission(&mut self, submission: AvailabilitySubmission) {
        let week = calendar::week_start(submission.week_start);
        match self.submissions.iter_mut().find(|s| {
            s.organization_id == submission.organization_id
                && s.user_id == submission.user_id
                && calendar::week_start(s.week_start) == week
        }) {
            Some(slot) => *slot = submission,
            None => self.submissions.push(submission),
        }
    }

    pub fn find_submission(
        &self,
        org: &OrganizationId,
        user: &UserId,
        week: NaiveDate,
    ) -> Option<&AvailabilitySubmission> {
        let week = calendar::week_start(week);
        self.submissions.iter().find(|s| {
            &s.organization_id == org
                && &s.user_id == user
                && calendar::week_start(s.week_start) == week
        })
    }

    pub fn schedule_for(&self, org: &OrganizationId, week: NaiveDate) -> Option<&WeeklySchedule> {
        let week = calendar::week_start(week);
        self.schedules
            .iter()
            .find(|s| &s.organization_id == org && calendar::week_start(s.week_start) == week)
    }

    pub fn upsert_schedule(&mut self, schedule: WeeklySchedule) {
        match self.schedules.iter_mut().find(|s| s.id == schedule.id) {
            Some(slot) => *slot = schedule,
            None => self.schedules.push(schedule),
        }
    }
}

impl SettingsProvider for Workspace {
    fn get_or_create(&mut self, organization_id: &OrganizationId) -> anyhow::Result<BusinessSettings> {
        if let Some(settings) = self.settings_for(organization_id)? {
            return Ok(settings);
        }
        let settings = BusinessSettings::defaults_for(organization_id.clone());
        self.put_settings(&settings)?;
        tracing::debug!(organization = %organization_id, "default business settings created");
        Ok(settings)
    }
}

pub trait Storage {
    /// Charge un workspace depuis un support.
    fn load(&self) -> anyhow::Result<Workspace>;
    /// Sauvegarde de manière atomique.
    fn save(&self, workspace: &Workspace) -> anyhow::Result<()>;
}

/// Supprime le fichier verrou à la destruction.
#[derive(Debug)]
pub struct WorkspaceLock {
    path: PathBuf,
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), %err, "failed to release workspace lock");
        }
    }
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Verrou d'écrivain unique : `<workspace>.lock`, créé en exclusif.
    pub fn lock(&self) -> anyhow::Result<WorkspaceLock> {
        let mut name = self.path.clone().into_os_string();
        name.push(".lock");
        let path = PathBuf::from(name);
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("workspace is locked by another process ({})", path.display()))?;
        Ok(WorkspaceLock { path })
    }

    /// Workspace vide si le fichier n'existe pas encore.
    pub fn load_or_default(&self) -> anyhow::Result<Workspace> {
        if self.path.exists() {
            self.load()
        } else {
            Ok(Workspace::default())
        }
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<Workspace> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let workspace: Workspace =
            serde_json::from_slice(&data).with_context(|| "parsing workspace.json")?;
        Ok(workspace)
    }

    fn save(&self, workspace: &Workspace) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(workspace)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}
