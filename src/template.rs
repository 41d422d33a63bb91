use crate::model::{OrganizationId, ShiftType, TemplateId};
use crate::settings::ConfigError;
use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Créneau type récurrent : fenêtre horaire locale et effectif min/max.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTemplate {
    pub id: TemplateId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub shift_type: ShiftType,
    /// `HH:MM`, heure locale
    pub start_time: String,
    /// `HH:MM` ; une fin avant le début passe minuit
    pub end_time: String,
    pub min_staff: u32,
    pub max_staff: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ShiftTemplate {
    pub fn new<N: Into<String>>(
        organization_id: OrganizationId,
        name: N,
        shift_type: ShiftType,
        window: (&str, &str),
        staff: (u32, u32),
    ) -> Self {
        Self {
            id: TemplateId::random(),
            organization_id,
            name: name.into(),
            shift_type,
            start_time: window.0.to_owned(),
            end_time: window.1.to_owned(),
            min_staff: staff.0,
            max_staff: staff.1,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyTemplateName {
                template: self.id.to_string(),
            });
        }
        if self.min_staff > self.max_staff {
            return Err(ConfigError::InvalidStaffRange {
                template: self.name.clone(),
                min: self.min_staff,
                max: self.max_staff,
            });
        }
        let (start, end) = self.window()?;
        if start == end {
            return Err(ConfigError::EmptyTimeWindow {
                template: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Fenêtre horaire parsée.
    pub fn window(&self) -> Result<(NaiveTime, NaiveTime), ConfigError> {
        Ok((
            self.parse_time(&self.start_time)?,
            self.parse_time(&self.end_time)?,
        ))
    }

    pub fn crosses_midnight(&self) -> Result<bool, ConfigError> {
        let (start, end) = self.window()?;
        Ok(end < start)
    }

    fn parse_time(&self, raw: &str) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
            ConfigError::InvalidTimeOfDay {
                template: self.name.clone(),
                value: raw.to_owned(),
            }
        })
    }
}

/// Vue validée des templates actifs, un par type de créneau, triés par type.
#[derive(Debug, Clone)]
pub struct ActiveTemplates<'a> {
    active: Vec<&'a ShiftTemplate>,
}

impl<'a> ActiveTemplates<'a> {
    /// Valide tous les templates fournis puis retient les actifs.
    pub fn new(templates: &'a [ShiftTemplate]) -> Result<Self, ConfigError> {
        Self::build(templates.iter())
    }

    /// Comme `new`, limité à une organisation.
    pub fn for_organization(
        templates: &'a [ShiftTemplate],
        organization_id: &OrganizationId,
    ) -> Result<Self, ConfigError> {
        Self::build(
            templates
                .iter()
                .filter(|t| &t.organization_id == organization_id),
        )
    }

    fn build(templates: impl Iterator<Item = &'a ShiftTemplate>) -> Result<Self, ConfigError> {
        let mut active: Vec<&'a ShiftTemplate> = Vec::new();
        for template in templates {
            template.validate()?;
            if !template.is_active {
                continue;
            }
            if active.iter().any(|t| t.shift_type == template.shift_type) {
                return Err(ConfigError::DuplicateShiftType(template.shift_type));
            }
            active.push(template);
        }
        active.sort_by_key(|t| t.shift_type);
        Ok(Self { active })
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a ShiftTemplate> + '_ {
        self.active.iter().copied()
    }

    pub fn by_type(&self, shift_type: ShiftType) -> Option<&'a ShiftTemplate> {
        self.active.iter().copied().find(|t| t.shift_type == shift_type)
    }

    pub fn by_id(&self, id: &TemplateId) -> Option<&'a ShiftTemplate> {
        self.active.iter().copied().find(|t| &t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Charge une liste de templates JSON et les valide.
pub fn load_templates_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<ShiftTemplate>> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading templates {}", path.display()))?;
    let templates: Vec<ShiftTemplate> = serde_json::from_slice(&data)
        .with_context(|| format!("parsing templates {}", path.display()))?;
    for template in &templates {
        template.validate()?;
    }
    Ok(templates)
}
