use crate::model::{Employee, ScheduleStatus, ShiftAssignment, WeeklySchedule};
use crate::template::ShiftTemplate;
use crate::validation::ValidationResult;
use anyhow::{bail, Result};
use std::fmt::Write;

/// Avis de publication destiné à un employé.
#[derive(Debug, Clone)]
pub struct PublicationNotice {
    pub user_id: String,
    pub week_start: String,
    pub shift_count: usize,
    pub content: String,
}

/// Une ligne de planning telle que rendue dans un avis.
#[derive(Debug, Clone)]
pub struct NoticeLine<'a> {
    pub assignment: &'a ShiftAssignment,
    pub template: Option<&'a ShiftTemplate>,
}

/// Permet de customiser le rendu du message (texte, SMS, etc.).
pub trait NoticeRenderer {
    fn render(&self, employee: &Employee, schedule: &WeeklySchedule, lines: &[NoticeLine<'_>]) -> String;
}

/// Gabarit texte simple destiné à un futur mail/SMS.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextNotice;

impl NoticeRenderer for TextNotice {
    fn render(&self, employee: &Employee, schedule: &WeeklySchedule, lines: &[NoticeLine<'_>]) -> String {
        let mut out = format!(
            "Bonjour {name},\n\nLe planning de la semaine du {week} est publié.\n",
            name = employee.display_name,
            week = schedule.week_start,
        );
        if lines.is_empty() {
            out.push_str("Aucun créneau ne t'est attribué cette semaine.\n");
            return out;
        }
        out.push_str("Tes créneaux :\n");
        for line in lines {
            let (label, window) = match line.template {
                Some(t) => (t.name.as_str(), format!("{}-{}", t.start_time, t.end_time)),
                None => ("?", String::new()),
            };
            let _ = writeln!(
                out,
                "- {} {} {}",
                line.assignment.shift_date.format("%a %d/%m"),
                label,
                window
            );
        }
        out
    }
}

/// Prépare l'avis d'un employé pour un planning publié.
pub fn prepare_notice(
    schedule: &WeeklySchedule,
    templates: &[ShiftTemplate],
    employee: &Employee,
    renderer: &dyn NoticeRenderer,
) -> Result<PublicationNotice> {
    if schedule.status != ScheduleStatus::Published {
        bail!("schedule {} is {}, not published", schedule.id, schedule.status);
    }

    let mut assignments: Vec<&ShiftAssignment> = schedule.assignments_for(&employee.id).collect();
    assignments.sort_by_key(|a| a.shift_date);
    let lines: Vec<NoticeLine<'_>> = assignments
        .into_iter()
        .map(|assignment| NoticeLine {
            assignment,
            template: templates.iter().find(|t| t.id == assignment.shift_template_id),
        })
        .collect();

    let content = renderer.render(employee, schedule, &lines);
    Ok(PublicationNotice {
        user_id: employee.id.to_string(),
        week_start: schedule.week_start.to_string(),
        shift_count: lines.len(),
        content,
    })
}

/// Liste lisible des violations, une par ligne : `TYPE: message`.
pub fn render_violations(result: &ValidationResult) -> String {
    if result.valid {
        return "OK: no violations\n".to_owned();
    }
    let mut out = String::new();
    for v in &result.violations {
        let _ = writeln!(out, "{}: {}", v.kind, v.message);
    }
    out
}
