#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use roulement::{
    io,
    notification::{prepare_notice, render_violations, TextNotice},
    scheduler::{ManagerOverride, SchedError, ScheduleController, WeekLocks},
    settings::{BusinessSettings, SettingsProvider},
    storage::{JsonStorage, Storage, Workspace},
    validator::{self, ReviewDecision, SubmissionContext},
    AssignmentId, AvailabilitySubmission, Employee, EmploymentType, Organization, OrganizationId,
    ShiftTemplate, ShiftType, UserId, ValidationResult, Violation, ViolationKind, WorkRules,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de plannings hebdomadaires (workspace JSON local)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du workspace
    #[arg(long, global = true, default_value = "workspace.json")]
    workspace: String,

    /// Surcharges JSON des règles par type de contrat
    #[arg(long, global = true)]
    rules: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Créer une organisation et ses paramètres
    InitOrg {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "UTC")]
        timezone: String,
        /// jours de week-end, ex. "5,6" (0 = dimanche)
        #[arg(long)]
        weekend: Option<String>,
        #[arg(long)]
        deadline_day: Option<u8>,
        #[arg(long)]
        deadline_hour: Option<u8>,
    },

    /// Ajouter un template de créneau
    AddTemplate {
        #[arg(long)]
        org: String,
        #[arg(long)]
        name: String,
        /// MORNING | EVENING | EVENING_CLOSE
        #[arg(long)]
        shift_type: String,
        /// HH:MM
        #[arg(long)]
        start: String,
        /// HH:MM
        #[arg(long)]
        end: String,
        #[arg(long, default_value_t = 1)]
        min_staff: u32,
        #[arg(long, default_value_t = 1)]
        max_staff: u32,
    },

    /// Importer des templates depuis un fichier JSON
    ImportTemplates {
        #[arg(long)]
        file: String,
    },

    /// Enregistrer un employé
    AddEmployee {
        #[arg(long)]
        org: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        /// FULL_TIME | PART_TIME | STUDENT
        #[arg(long)]
        employment_type: String,
    },

    /// Soumettre des disponibilités depuis un CSV et les valider
    Submit {
        #[arg(long)]
        org: String,
        #[arg(long)]
        user: String,
        /// n'importe quel jour de la semaine (YYYY-MM-DD)
        #[arg(long)]
        week: String,
        #[arg(long)]
        csv: String,
        /// instant local YYYY-MM-DDTHH:MM (défaut : maintenant)
        #[arg(long)]
        now: Option<String>,
    },

    /// Approuver ou rejeter une soumission (avant l'échéance)
    Review {
        #[arg(long)]
        org: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        week: String,
        /// approve | reject
        #[arg(long)]
        decision: String,
        #[arg(long)]
        now: Option<String>,
    },

    /// Construire le brouillon de la semaine
    Build {
        #[arg(long)]
        org: String,
        #[arg(long)]
        week: String,
        #[arg(long)]
        created_by: String,
        /// épingler : "user@YYYY-MM-DD@TYPE" (répétable)
        #[arg(long)]
        pin: Vec<String>,
        /// écarter : "user@YYYY-MM-DD@TYPE" (répétable)
        #[arg(long)]
        block: Vec<String>,
    },

    /// Vérifier les conflits du planning
    Check {
        #[arg(long)]
        org: String,
        #[arg(long)]
        week: String,
    },

    /// Publier le planning
    Publish {
        #[arg(long)]
        org: String,
        #[arg(long)]
        week: String,
        #[arg(long)]
        now: Option<String>,
    },

    /// Archiver le planning
    Archive {
        #[arg(long)]
        org: String,
        #[arg(long)]
        week: String,
    },

    /// Annuler une affectation
    Cancel {
        #[arg(long)]
        org: String,
        #[arg(long)]
        week: String,
        #[arg(long)]
        assignment: String,
    },

    /// Lister et optionnellement exporter
    List {
        #[arg(long)]
        org: String,
        #[arg(long)]
        week: String,
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Générer l'avis de publication d'un employé
    Notify {
        #[arg(long)]
        org: String,
        #[arg(long)]
        week: String,
        #[arg(long)]
        user: String,
        /// Fichier de sortie (texte brut)
        #[arg(long)]
        out: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let code = run(cli)?;
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let rules = match &cli.rules {
        Some(path) => WorkRules::load_overrides(path)?,
        None => WorkRules::default(),
    };
    let storage = JsonStorage::open(&cli.workspace)?;
    // tenu jusqu'à la fin de la commande, sauvegarde comprise
    let _lock = storage.lock()?;
    let mut ws = storage.load_or_default()?;
    let locks = WeekLocks::new();

    let code = match cli.cmd {
        Commands::InitOrg {
            id,
            name,
            timezone,
            weekend,
            deadline_day,
            deadline_hour,
        } => {
            let org = OrganizationId::new(&id);
            if ws.find_organization(&org).is_some() {
                bail!("organization already exists: {id}");
            }
            ws.organizations.push(Organization {
                id: org.clone(),
                name,
                timezone,
            });
            let defaults = ws.get_or_create(&org)?;
            let weekend_days = match weekend {
                Some(raw) => io::parse_weekend_days(&raw)?,
                None => defaults.weekend_days.as_slice().to_vec(),
            };
            let settings = BusinessSettings::new(
                org,
                weekend_days,
                deadline_day.unwrap_or(defaults.submission_deadline_day),
                deadline_hour.unwrap_or(defaults.submission_deadline_hour),
            )?;
            ws.put_settings(&settings)?;
            storage.save(&ws)?;
            0
        }
        Commands::AddTemplate {
            org,
            name,
            shift_type,
            start,
            end,
            min_staff,
            max_staff,
        } => {
            let org = require_org(&ws, &org)?;
            let shift_type: ShiftType = shift_type.parse().map_err(anyhow::Error::msg)?;
            let template = ShiftTemplate::new(
                org,
                name,
                shift_type,
                (start.as_str(), end.as_str()),
                (min_staff, max_staff),
            );
            template.validate()?;
            println!("{}", template.id);
            ws.templates.push(template);
            storage.save(&ws)?;
            0
        }
        Commands::ImportTemplates { file } => {
            let templates = roulement::load_templates_from_file(file)?;
            for t in &templates {
                require_org(&ws, t.organization_id.as_str())?;
            }
            ws.templates.extend(templates);
            storage.save(&ws)?;
            0
        }
        Commands::AddEmployee {
            org,
            id,
            name,
            employment_type,
        } => {
            let org = require_org(&ws, &org)?;
            let employment_type: EmploymentType =
                employment_type.parse().map_err(anyhow::Error::msg)?;
            let user = UserId::new(&id);
            ws.employees.retain(|e| e.id != user);
            ws.employees.push(Employee {
                id: user,
                organization_id: org,
                display_name: name,
                employment_type,
            });
            storage.save(&ws)?;
            0
        }
        Commands::Submit {
            org,
            user,
            week,
            csv,
            now,
        } => {
            let org = require_org(&ws, &org)?;
            let week = parse_date(&week)?;
            let now = parse_now(now.as_deref())?;
            let user = UserId::new(&user);
            let employee = ws
                .find_employee(&user)
                .with_context(|| format!("unknown employee: {user}"))?
                .clone();
            if employee.organization_id != org {
                bail!("employee {user} does not belong to organization {org}");
            }
            let settings = ws.get_or_create(&org)?;
            let templates = ws.templates_for(&org);

            let previous = ws.find_submission(&org, &user, week).cloned();
            if let Some(prev) = &previous {
                if validator::is_locked(prev, &settings, now) {
                    let result = ValidationResult::from_violations(vec![Violation::new(
                        ViolationKind::DeadlinePassed,
                        format!("submission for week {} can no longer be modified", prev.week_start),
                    )]);
                    eprint!("{}", render_violations(&result));
                    return Ok(2);
                }
            }

            let slots = io::import_slots_csv(csv)?;
            let mut submission = match previous {
                Some(prev) => prev.with_slots(slots),
                None => AvailabilitySubmission::new(user, org, employee.employment_type, week)
                    .with_slots(slots),
            };
            // le contrat courant prime sur celui de la première soumission
            submission.employment_type = employee.employment_type;
            let ctx = SubmissionContext {
                settings: &settings,
                templates: &templates,
                rules: &rules,
            };
            let result = validator::validate_submission(&submission, ctx, now)?;
            let status = validator::accept_submission(&mut submission, &result, now);
            println!("{} {:?}", submission.id, status);
            let code = report(&result);
            ws.upsert_submission(submission);
            storage.save(&ws)?;
            code
        }
        Commands::Review {
            org,
            user,
            week,
            decision,
            now,
        } => {
            let org = require_org(&ws, &org)?;
            let week = parse_date(&week)?;
            let now = parse_now(now.as_deref())?;
            let decision: ReviewDecision = decision.parse().map_err(anyhow::Error::msg)?;
            let user = UserId::new(&user);
            let settings = ws.get_or_create(&org)?;
            let mut submission = ws
                .find_submission(&org, &user, week)
                .with_context(|| format!("no submission from {user} for week of {week}"))?
                .clone();
            let status = validator::review_submission(&mut submission, decision, &settings, now)?;
            println!("{} {}", submission.id, status);
            ws.upsert_submission(submission);
            storage.save(&ws)?;
            0
        }
        Commands::Build {
            org,
            week,
            created_by,
            pin,
            block,
        } => {
            let org = require_org(&ws, &org)?;
            let week = parse_date(&week)?;
            let mut overrides = Vec::new();
            for raw in &pin {
                let (user, date, kind) = parse_override(raw)?;
                overrides.push(ManagerOverride::pin(user, date, kind));
            }
            for raw in &block {
                let (user, date, kind) = parse_override(raw)?;
                overrides.push(ManagerOverride::block(user, date, kind));
            }
            let mut controller = match ws.schedule_for(&org, week) {
                Some(existing) => ScheduleController::from_schedule(existing.clone()),
                None => ScheduleController::new_draft(org.clone(), week, UserId::new(created_by)),
            };
            let submissions = ws.submissions_for(&org, week);
            let templates = ws.templates_for(&org);
            let guard = locks.try_acquire(&org, week)?;
            let result = controller.build_draft(&guard, &submissions, &templates, &overrides)?;
            println!(
                "{} | {} assignment(s)",
                controller.schedule().id,
                controller.schedule().assignments.len()
            );
            // brouillon conservé même avec des conflits
            let code = report(&result);
            ws.upsert_schedule(controller.into_schedule());
            storage.save(&ws)?;
            code
        }
        Commands::Check { org, week } => {
            let (org, controller) = load_schedule(&ws, &org, &week)?;
            let result = controller.check(&ws.templates_for(&org))?;
            report(&result)
        }
        Commands::Publish { org, week, now } => {
            let (org, mut controller) = load_schedule(&ws, &org, &week)?;
            let now = parse_now(now.as_deref())?;
            let templates = ws.templates_for(&org);
            let guard = locks.try_acquire(&org, controller.schedule().week_start)?;
            match controller.publish(&guard, &templates, now) {
                Ok(()) => {
                    ws.upsert_schedule(controller.into_schedule());
                    storage.save(&ws)?;
                    0
                }
                Err(SchedError::PublishBlocked(conflicts)) => {
                    for c in &conflicts {
                        eprintln!("CONFLICT_DETECTED: {c}");
                    }
                    2
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Archive { org, week } => {
            let (_, mut controller) = load_schedule(&ws, &org, &week)?;
            controller.archive()?;
            ws.upsert_schedule(controller.into_schedule());
            storage.save(&ws)?;
            0
        }
        Commands::Cancel {
            org,
            week,
            assignment,
        } => {
            let (_, mut controller) = load_schedule(&ws, &org, &week)?;
            controller.cancel_assignment(&AssignmentId::new(assignment))?;
            ws.upsert_schedule(controller.into_schedule());
            storage.save(&ws)?;
            0
        }
        Commands::List {
            org,
            week,
            out_json,
            out_csv,
        } => {
            let (org, controller) = load_schedule(&ws, &org, &week)?;
            let schedule = controller.schedule();
            let templates = ws.templates_for(&org);
            if let Some(path) = out_json {
                io::export_schedule_json(path, schedule)?;
            }
            if let Some(path) = out_csv {
                io::export_assignments_csv(path, schedule, &templates, &ws.employees)?;
            }
            println!("{} | {} | {}", schedule.id, schedule.week_start, schedule.status);
            for a in &schedule.assignments {
                let shift = templates
                    .iter()
                    .find(|t| t.id == a.shift_template_id)
                    .map_or("-", |t| t.shift_type.as_str());
                println!(
                    "{} | {} {} | {} | {:?}",
                    a.id, a.shift_date, shift, a.user_id, a.status
                );
            }
            0
        }
        Commands::Notify {
            org,
            week,
            user,
            out,
        } => {
            let (org, controller) = load_schedule(&ws, &org, &week)?;
            let employee = ws
                .find_employee(&UserId::new(&user))
                .with_context(|| format!("unknown employee: {user}"))?;
            let notice = prepare_notice(
                controller.schedule(),
                &ws.templates_for(&org),
                employee,
                &TextNotice,
            )?;
            std::fs::write(&out, notice.content)?;
            println!(
                "Notice generated for {} ({} shift(s), week {})",
                notice.user_id, notice.shift_count, notice.week_start
            );
            0
        }
    };

    Ok(code)
}

fn require_org(ws: &Workspace, id: &str) -> Result<OrganizationId> {
    let org = OrganizationId::new(id);
    if ws.find_organization(&org).is_none() {
        bail!("unknown organization: {id}");
    }
    Ok(org)
}

fn load_schedule(ws: &Workspace, org: &str, week: &str) -> Result<(OrganizationId, ScheduleController)> {
    let org = require_org(ws, org)?;
    let week = parse_date(week)?;
    let schedule = ws
        .schedule_for(&org, week)
        .with_context(|| format!("no schedule for week of {week}"))?;
    Ok((org, ScheduleController::from_schedule(schedule.clone())))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}

fn parse_now(raw: Option<&str>) -> Result<NaiveDateTime> {
    match raw {
        Some(raw) => NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M")
            .with_context(|| format!("invalid local datetime: {raw}")),
        None => Ok(Local::now().naive_local()),
    }
}

fn parse_override(raw: &str) -> Result<(UserId, NaiveDate, ShiftType)> {
    let mut parts = raw.split('@');
    let (Some(user), Some(date), Some(kind), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        bail!("expected user@YYYY-MM-DD@TYPE, got {raw}");
    };
    let kind: ShiftType = kind.parse().map_err(anyhow::Error::msg)?;
    Ok((UserId::new(user.trim()), parse_date(date)?, kind))
}

// Code 2 = violations présentes
fn report(result: &ValidationResult) -> i32 {
    if result.valid {
        println!("{}", render_violations(result).trim_end());
        0
    } else {
        eprint!("{}", render_violations(result));
        2
    }
}
