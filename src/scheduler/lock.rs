use super::SchedError;
use crate::model::OrganizationId;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

type WeekKey = (OrganizationId, NaiveDate);

/// Registre d'exclusivité : au plus une construction/publication en cours
/// par (organisation, semaine).
#[derive(Debug, Clone, Default)]
pub struct WeekLocks {
    held: Arc<Mutex<HashSet<WeekKey>>>,
}

impl WeekLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prend la semaine contenant `week_of` ; échoue si elle est déjà tenue.
    pub fn try_acquire(
        &self,
        organization: &OrganizationId,
        week_of: NaiveDate,
    ) -> Result<WeekGuard, SchedError> {
        let key = (organization.clone(), crate::calendar::week_start(week_of));
        if !lock(&self.held).insert(key.clone()) {
            return Err(SchedError::WeekBusy {
                organization: key.0,
                week: key.1,
            });
        }
        Ok(WeekGuard {
            held: Arc::clone(&self.held),
            key,
        })
    }

    pub fn is_held(&self, organization: &OrganizationId, week_of: NaiveDate) -> bool {
        let key = (organization.clone(), crate::calendar::week_start(week_of));
        lock(&self.held).contains(&key)
    }
}

/// Libère la semaine à la destruction.
#[derive(Debug)]
pub struct WeekGuard {
    held: Arc<Mutex<HashSet<WeekKey>>>,
    key: WeekKey,
}

impl WeekGuard {
    pub fn organization(&self) -> &OrganizationId {
        &self.key.0
    }

    pub fn week(&self) -> NaiveDate {
        self.key.1
    }

    /// Vrai si la garde couvre la semaine contenant `week_of`.
    pub fn covers(&self, organization: &OrganizationId, week_of: NaiveDate) -> bool {
        self.key.0 == *organization && self.key.1 == crate::calendar::week_start(week_of)
    }
}

impl Drop for WeekGuard {
    fn drop(&mut self) {
        lock(&self.held).remove(&self.key);
    }
}

// l'ensemble reste cohérent même si un détenteur a paniqué
fn lock(held: &Mutex<HashSet<WeekKey>>) -> MutexGuard<'_, HashSet<WeekKey>> {
    held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
