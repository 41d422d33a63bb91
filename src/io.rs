use crate::model::{AvailabilitySlot, Employee, ShiftType, WeeklySchedule};
use crate::template::ShiftTemplate;
use anyhow::{bail, Context};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;

/// Jours de week-end sous forme `"5,6"`, `"[5, 6]"` ou `"5;6"`.
pub fn parse_weekend_days(raw: &str) -> anyhow::Result<Vec<u8>> {
    let inner = raw.trim().trim_start_matches('[').trim_end_matches(']');
    inner
        .split([',', ';'])
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            chunk
                .parse::<u8>()
                .with_context(|| format!("invalid weekday index: {chunk}"))
        })
        .collect()
}

/// Import de créneaux : header `shift_date,shift_type[,preference_rank]`.
///
/// Sans rang explicite, l'ordre des lignes sert de rang (1, 2, ...).
pub fn import_slots_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<AvailabilitySlot>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let date = rec.get(0).context("missing shift_date")?.trim();
        let kind = rec.get(1).context("missing shift_type")?.trim();
        if date.is_empty() || kind.is_empty() {
            bail!("invalid slot row {} (empty)", line + 1);
        }
        let shift_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .with_context(|| format!("invalid shift_date: {date}"))?;
        let shift_type: ShiftType = kind.parse().map_err(anyhow::Error::msg)?;
        let preference_rank = match rec.get(2).map(str::trim) {
            Some(rank) if !rank.is_empty() => rank
                .parse()
                .with_context(|| format!("invalid preference_rank: {rank}"))?,
            _ => u32::try_from(line + 1).context("too many slots")?,
        };
        out.push(AvailabilitySlot::new(shift_date, shift_type, preference_rank));
    }
    Ok(out)
}

/// Export JSON du planning (jolie mise en forme)
pub fn export_schedule_json<P: AsRef<Path>>(path: P, schedule: &WeeklySchedule) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(schedule)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV : header `id,shift_date,shift_type,template,user_id,display_name,status`
pub fn export_assignments_csv<P: AsRef<Path>>(
    path: P,
    schedule: &WeeklySchedule,
    templates: &[ShiftTemplate],
    employees: &[Employee],
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "id",
        "shift_date",
        "shift_type",
        "template",
        "user_id",
        "display_name",
        "status",
    ])?;
    for a in &schedule.assignments {
        let template = templates.iter().find(|t| t.id == a.shift_template_id);
        let shift_type = template.map_or("", |t| t.shift_type.as_str());
        let template_name = template.map_or("", |t| t.name.as_str());
        let display = employees
            .iter()
            .find(|e| e.id == a.user_id)
            .map_or("", |e| e.display_name.as_str());
        let date = a.shift_date.to_string();
        w.write_record([
            a.id.as_str(),
            date.as_str(),
            shift_type,
            template_name,
            a.user_id.as_str(),
            display,
            a.status.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekend_days_accept_both_layouts() {
        assert_eq!(parse_weekend_days("5,6").unwrap(), vec![5, 6]);
        assert_eq!(parse_weekend_days("[4, 5, 6]").unwrap(), vec![4, 5, 6]);
        assert_eq!(parse_weekend_days(" 0 ; 6 ").unwrap(), vec![0, 6]);
        assert!(parse_weekend_days("fri").is_err());
    }

    #[test]
    fn assignment_csv_carries_status_labels() {
        use crate::model::{OrganizationId, UserId};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let org = OrganizationId::new("acme");
        let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let template = ShiftTemplate::new(org.clone(), "Matin", ShiftType::Morning, ("07:00", "13:00"), (0, 2));
        let mut schedule = WeeklySchedule::draft(org, day, UserId::new("boss"));
        let mut a = crate::model::ShiftAssignment::pending(&schedule.id, &template.id, day, UserId::new("alice"));
        a.status = crate::model::AssignmentStatus::Cancelled;
        schedule.assignments.push(a);

        export_assignments_csv(&path, &schedule, &[template], &[]).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        let row = raw.lines().nth(1).unwrap();
        assert!(row.ends_with(",2024-06-10,MORNING,Matin,alice,,CANCELLED"), "{row}");
    }
}
