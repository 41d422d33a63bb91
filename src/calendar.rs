//! Arithmétique de dates en heure locale (aucune conversion UTC).
//!
//! Les semaines commencent le dimanche ; les jours sont indexés 0 (dimanche)
//! à 6 (samedi).

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Index du jour, dimanche = 0.
pub fn weekday_index(date: NaiveDate) -> u8 {
    // num_days_from_sunday() est toujours < 7
    date.weekday().num_days_from_sunday() as u8
}

/// Dimanche le plus récent (la date elle-même si c'est un dimanche).
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(weekday_index(date)))
}

/// Les 7 dates de la semaine commençant à `week_start`.
pub fn week_dates(week_start: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let first = self::week_start(week_start);
    (0..7).map(move |offset| first + Duration::days(offset))
}

pub fn in_week(date: NaiveDate, week_start: NaiveDate) -> bool {
    self::week_start(date) == self::week_start(week_start)
}

pub fn is_weekend_day(date: NaiveDate, weekend_days: &[u8]) -> bool {
    weekend_days.contains(&weekday_index(date))
}

/// Instant limite : début de semaine + `deadline_day` jours, à `deadline_hour:00`.
///
/// Les bornes (0-6, 0-23) sont garanties par `BusinessSettings::validate` ;
/// une heure hors bornes est ramenée à 23h.
pub fn deadline_instant(week_start: NaiveDate, deadline_day: u8, deadline_hour: u8) -> NaiveDateTime {
    let day = self::week_start(week_start) + Duration::days(i64::from(deadline_day.min(6)));
    let time = NaiveTime::from_hms_opt(u32::from(deadline_hour.min(23)), 0, 0)
        .unwrap_or(NaiveTime::MIN);
    day.and_time(time)
}

/// Vrai dès que `now` atteint l'échéance de la semaine.
pub fn is_past_deadline(
    now: NaiveDateTime,
    week_start: NaiveDate,
    deadline_day: u8,
    deadline_hour: u8,
) -> bool {
    now >= deadline_instant(week_start, deadline_day, deadline_hour)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn week_start_is_previous_sunday() {
        // 2024-06-10 est un lundi
        assert_eq!(week_start(d(2024, 6, 10)), d(2024, 6, 9));
        assert_eq!(week_start(d(2024, 6, 9)), d(2024, 6, 9));
        assert_eq!(week_start(d(2024, 6, 15)), d(2024, 6, 9));
        // à cheval sur deux années
        assert_eq!(week_start(d(2025, 1, 1)), d(2024, 12, 29));
    }

    #[test]
    fn week_dates_cover_sunday_to_saturday() {
        let dates: Vec<_> = week_dates(d(2024, 6, 12)).collect();
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], d(2024, 6, 9));
        assert_eq!(dates[6], d(2024, 6, 15));
        assert!(in_week(d(2024, 6, 15), d(2024, 6, 9)));
        assert!(!in_week(d(2024, 6, 16), d(2024, 6, 9)));
    }

    #[test]
    fn weekend_membership_uses_sunday_zero() {
        let weekend = [4, 5, 6];
        assert!(is_weekend_day(d(2024, 6, 13), &weekend)); // jeudi
        assert!(is_weekend_day(d(2024, 6, 15), &weekend)); // samedi
        assert!(!is_weekend_day(d(2024, 6, 9), &weekend)); // dimanche
    }

    #[test]
    fn deadline_is_inclusive() {
        let week = d(2024, 6, 9);
        let limit = d(2024, 6, 13).and_hms_opt(18, 0, 0).unwrap();
        assert_eq!(deadline_instant(week, 4, 18), limit);
        assert!(is_past_deadline(limit, week, 4, 18));
        assert!(!is_past_deadline(limit - Duration::seconds(1), week, 4, 18));
        assert!(is_past_deadline(d(2024, 6, 20).and_hms_opt(0, 0, 0).unwrap(), week, 4, 18));
    }
}
