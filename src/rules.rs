use crate::settings::ConfigError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Student,
}

impl EmploymentType {
    pub const ALL: [EmploymentType; 3] = [Self::FullTime, Self::PartTime, Self::Student];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullTime => "FULL_TIME",
            Self::PartTime => "PART_TIME",
            Self::Student => "STUDENT",
        }
    }
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmploymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == norm)
            .ok_or_else(|| format!("unknown employment type: {s}"))
    }
}

/// Minimums hebdomadaires d'une catégorie d'emploi
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRule {
    pub min_shifts: u32,
    pub min_weekend_shifts: u32,
}

impl WorkRule {
    pub const fn new(min_shifts: u32, min_weekend_shifts: u32) -> Self {
        Self {
            min_shifts,
            min_weekend_shifts,
        }
    }
}

/// Table par défaut.
pub const DEFAULT_WORK_RULES: [(EmploymentType, WorkRule); 3] = [
    (EmploymentType::FullTime, WorkRule::new(5, 2)),
    (EmploymentType::PartTime, WorkRule::new(3, 1)),
    (EmploymentType::Student, WorkRule::new(2, 1)),
];

/// Règles passées au validateur ; surchargeables par organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkRules {
    rules: BTreeMap<EmploymentType, WorkRule>,
}

impl Default for WorkRules {
    fn default() -> Self {
        Self {
            rules: DEFAULT_WORK_RULES.into_iter().collect(),
        }
    }
}

impl WorkRules {
    /// Table vide : chaque type doit être fourni explicitement.
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    pub fn with_rule(mut self, employment_type: EmploymentType, rule: WorkRule) -> Self {
        self.rules.insert(employment_type, rule);
        self
    }

    pub fn get(&self, employment_type: EmploymentType) -> Result<WorkRule, ConfigError> {
        self.rules
            .get(&employment_type)
            .copied()
            .ok_or(ConfigError::MissingWorkRule(employment_type))
    }

    /// Un minimum week-end supérieur au minimum total est contradictoire.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (employment_type, rule) in &self.rules {
            if rule.min_weekend_shifts > rule.min_shifts {
                return Err(ConfigError::ContradictoryWorkRule {
                    employment_type: *employment_type,
                    min_shifts: rule.min_shifts,
                    min_weekend_shifts: rule.min_weekend_shifts,
                });
            }
        }
        Ok(())
    }

    /// Charge des surcharges JSON (`{"FULL_TIME": {"min_shifts": 4, ...}}`)
    /// par-dessus la table par défaut.
    pub fn load_overrides<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let overrides: BTreeMap<EmploymentType, WorkRule> = serde_json::from_slice(&data)
            .with_context(|| format!("parsing work rules {}", path.display()))?;
        let mut rules = Self::default();
        rules.rules.extend(overrides);
        rules.validate()?;
        Ok(rules)
    }
}
