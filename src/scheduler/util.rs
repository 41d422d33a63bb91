use super::types::{ManagerOverride, OverrideAction};
use crate::model::{ShiftType, UserId};
use chrono::{NaiveDate, NaiveDateTime};

/// (date, type) : identifie un créneau dans la semaine.
pub(super) type SlotKey = (NaiveDate, ShiftType);

/// Clé de tri : horodatés d'abord (plus ancien en tête), absents en dernier.
pub(super) fn submitted_order(submitted_at: Option<NaiveDateTime>) -> (bool, Option<NaiveDateTime>) {
    (submitted_at.is_none(), submitted_at)
}

/// Employés épinglés sur `key`, triés et dédoublonnés.
pub(super) fn pinned_users(overrides: &[ManagerOverride], key: SlotKey) -> Vec<&UserId> {
    let mut users: Vec<&UserId> = overrides
        .iter()
        .filter(|o| o.action == OverrideAction::Pin && (o.shift_date, o.shift_type) == key)
        .map(|o| &o.user_id)
        .collect();
    users.sort();
    users.dedup();
    users
}

/// Vrai si une consigne (pin ou block) vise `user` sur `key`.
pub(super) fn overridden(overrides: &[ManagerOverride], key: SlotKey, user: &UserId) -> bool {
    overrides
        .iter()
        .any(|o| &o.user_id == user && (o.shift_date, o.shift_type) == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_timestamp_sorts_last() {
        let early = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let late = early + chrono::Duration::hours(3);
        let mut keys = vec![
            submitted_order(None),
            submitted_order(Some(late)),
            submitted_order(Some(early)),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                submitted_order(Some(early)),
                submitted_order(Some(late)),
                submitted_order(None)
            ]
        );
    }
}
