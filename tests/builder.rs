#![forbid(unsafe_code)]
use chrono::{NaiveDate, NaiveDateTime};
use roulement::{
    build_assignments, detect_conflicts, AssignmentStatus, AvailabilitySubmission,
    EmploymentType, ManagerOverride, OrganizationId, SchedError, ShiftTemplate, ShiftType,
    SubmissionStatus, UserId, WeeklySchedule,
};

fn org() -> OrganizationId {
    OrganizationId::new("acme")
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    day(d).and_hms_opt(h, m, 0).unwrap()
}

fn schedule() -> WeeklySchedule {
    WeeklySchedule::draft(org(), day(10), UserId::new("manager"))
}

fn submission(
    user: &str,
    submitted_at: Option<NaiveDateTime>,
    slots: &[(u32, ShiftType, u32)],
) -> AvailabilitySubmission {
    let mut s = AvailabilitySubmission::new(UserId::new(user), org(), EmploymentType::PartTime, day(10));
    s.status = SubmissionStatus::Approved;
    s.submitted_at = submitted_at;
    for (d, kind, rank) in slots {
        s.add_slot(day(*d), *kind, *rank);
    }
    s
}

fn users_on(assignments: &[roulement::ShiftAssignment], date: NaiveDate) -> Vec<&str> {
    assignments
        .iter()
        .filter(|a| a.shift_date == date)
        .map(|a| a.user_id.as_str())
        .collect()
}

#[test]
fn ranked_candidates_fill_up_to_max() {
    let templates = vec![ShiftTemplate::new(
        org(),
        "Matin",
        ShiftType::Morning,
        ("07:00", "13:00"),
        (2, 5),
    )];
    let subs = vec![
        submission("carol", Some(at(8, 9, 0)), &[(10, ShiftType::Morning, 3)]),
        submission("alice", Some(at(8, 9, 0)), &[(10, ShiftType::Morning, 1)]),
        submission("bob", Some(at(8, 9, 0)), &[(10, ShiftType::Morning, 2)]),
    ];
    let sched = schedule();

    let out = build_assignments(&sched, &subs, &templates, &[]).unwrap();
    assert_eq!(users_on(&out, day(10)), ["alice", "bob", "carol"]);
    assert!(out.iter().all(|a| a.status == AssignmentStatus::Pending));
    assert!(out.iter().all(|a| a.schedule_id == sched.id));

    let conflicts = detect_conflicts(sched.week_start, &out, &templates).unwrap();
    assert!(conflicts.iter().all(|c| c.shift_date != day(10)));
    // les autres jours restent en sous-effectif, sans bloquer la construction
    assert_eq!(conflicts.len(), 6);
    assert!(conflicts.iter().all(|c| c.is_understaffing()));
}

#[test]
fn equal_rank_goes_to_earliest_submission() {
    let templates = vec![ShiftTemplate::new(
        org(),
        "Soir",
        ShiftType::Evening,
        ("13:00", "19:00"),
        (0, 1),
    )];
    let subs = vec![
        submission("zoe", Some(at(9, 10, 30)), &[(10, ShiftType::Evening, 1)]),
        submission("yann", Some(at(9, 8, 15)), &[(10, ShiftType::Evening, 1)]),
    ];
    let out = build_assignments(&schedule(), &subs, &templates, &[]).unwrap();
    assert_eq!(users_on(&out, day(10)), ["yann"]);

    let mut wider = templates.clone();
    wider[0].max_staff = 2;
    let out = build_assignments(&schedule(), &subs, &wider, &[]).unwrap();
    assert_eq!(users_on(&out, day(10)), ["yann", "zoe"]);
}

#[test]
fn user_id_breaks_remaining_ties() {
    let templates = vec![ShiftTemplate::new(
        org(),
        "Soir",
        ShiftType::Evening,
        ("13:00", "19:00"),
        (0, 1),
    )];
    let subs = vec![
        submission("mia", None, &[(11, ShiftType::Evening, 1)]),
        submission("leo", None, &[(11, ShiftType::Evening, 1)]),
        submission("noe", Some(at(9, 8, 0)), &[(11, ShiftType::Evening, 1)]),
    ];
    let out = build_assignments(&schedule(), &subs, &templates, &[]).unwrap();
    // horodaté d'abord, puis ordre des identifiants
    assert_eq!(users_on(&out, day(11)), ["noe"]);

    let mut wider = templates.clone();
    wider[0].max_staff = 3;
    let out = build_assignments(&schedule(), &subs, &wider, &[]).unwrap();
    assert_eq!(users_on(&out, day(11)), ["noe", "leo", "mia"]);
}

#[test]
fn output_is_deterministic() {
    let templates = vec![
        ShiftTemplate::new(org(), "Matin", ShiftType::Morning, ("07:00", "13:00"), (1, 2)),
        ShiftTemplate::new(org(), "Soir", ShiftType::Evening, ("13:00", "19:00"), (1, 2)),
    ];
    let subs = vec![
        submission(
            "alice",
            Some(at(8, 9, 0)),
            &[(10, ShiftType::Morning, 1), (10, ShiftType::Evening, 2), (12, ShiftType::Morning, 1)],
        ),
        submission(
            "bob",
            Some(at(8, 10, 0)),
            &[(10, ShiftType::Morning, 2), (12, ShiftType::Morning, 1), (13, ShiftType::Evening, 1)],
        ),
        submission("carol", None, &[(10, ShiftType::Morning, 1), (12, ShiftType::Morning, 1)]),
    ];
    let sched = schedule();

    let first = build_assignments(&sched, &subs, &templates, &[]).unwrap();
    let second = build_assignments(&sched, &subs, &templates, &[]).unwrap();
    assert_eq!(first, second);

    let mut reversed = subs.clone();
    reversed.reverse();
    let third = build_assignments(&sched, &reversed, &templates, &[]).unwrap();
    assert_eq!(first, third);

    // lundi matin : alice et carol au rang 1, bob (rang 2) reste dehors
    let monday_morning: Vec<_> = first
        .iter()
        .filter(|a| a.shift_date == day(10) && a.shift_template_id == templates[0].id)
        .map(|a| a.user_id.as_str())
        .collect();
    assert_eq!(monday_morning, ["alice", "carol"]);

    // un même employé peut tenir matin et soir le même jour
    let alice_monday = first
        .iter()
        .filter(|a| a.shift_date == day(10) && a.user_id.as_str() == "alice")
        .count();
    assert_eq!(alice_monday, 2);
}

#[test]
fn overrides_pin_and_block() {
    let templates = vec![ShiftTemplate::new(
        org(),
        "Matin",
        ShiftType::Morning,
        ("07:00", "13:00"),
        (1, 2),
    )];
    let subs = vec![
        submission("alice", Some(at(8, 9, 0)), &[(10, ShiftType::Morning, 1)]),
        submission("bob", Some(at(8, 9, 0)), &[(10, ShiftType::Morning, 2)]),
        submission("carol", Some(at(8, 9, 0)), &[(10, ShiftType::Morning, 3)]),
    ];
    let overrides = vec![
        ManagerOverride::pin(UserId::new("dave"), day(10), ShiftType::Morning),
        ManagerOverride::block(UserId::new("alice"), day(10), ShiftType::Morning),
        // épinglé aussi candidat : ne compte qu'une fois
        ManagerOverride::pin(UserId::new("bob"), day(10), ShiftType::Morning),
    ];
    let out = build_assignments(&schedule(), &subs, &templates, &overrides).unwrap();
    assert_eq!(users_on(&out, day(10)), ["bob", "dave"]);
}

#[test]
fn ineligible_submissions_are_ignored() {
    let templates = vec![ShiftTemplate::new(
        org(),
        "Matin",
        ShiftType::Morning,
        ("07:00", "13:00"),
        (0, 5),
    )];
    let mut rejected = submission("rita", None, &[(10, ShiftType::Morning, 1)]);
    rejected.status = SubmissionStatus::Rejected;
    let mut changes = submission("rémi", None, &[(10, ShiftType::Morning, 1)]);
    changes.status = SubmissionStatus::RequiresChanges;
    let mut next_week = submission("nina", None, &[(17, ShiftType::Morning, 1)]);
    next_week.week_start = day(16);
    let pending = {
        let mut s = submission("paul", None, &[(10, ShiftType::Morning, 1)]);
        s.status = SubmissionStatus::Pending;
        s
    };
    let mut foreign = submission("olga", None, &[(10, ShiftType::Morning, 1)]);
    foreign.organization_id = OrganizationId::new("globex");

    let subs = vec![rejected, changes, next_week, pending, foreign];
    let out = build_assignments(&schedule(), &subs, &templates, &[]).unwrap();
    let users: Vec<_> = out.iter().map(|a| a.user_id.as_str()).collect();
    assert_eq!(users, ["paul"]);
}

#[test]
fn inactive_templates_produce_nothing() {
    let mut morning =
        ShiftTemplate::new(org(), "Matin", ShiftType::Morning, ("07:00", "13:00"), (1, 2));
    morning.is_active = false;
    let subs = vec![submission("alice", None, &[(10, ShiftType::Morning, 1)])];
    let out = build_assignments(&schedule(), &subs, &[morning], &[]).unwrap();
    assert!(out.is_empty());
}

#[test]
fn pins_that_cannot_be_placed_are_refused() {
    let templates = vec![ShiftTemplate::new(
        org(),
        "Matin",
        ShiftType::Morning,
        ("07:00", "13:00"),
        (0, 2),
    )];
    let subs = vec![submission("alice", None, &[(10, ShiftType::Morning, 1)])];

    let no_template = vec![ManagerOverride::pin(UserId::new("dave"), day(10), ShiftType::Evening)];
    match build_assignments(&schedule(), &subs, &templates, &no_template) {
        Err(SchedError::UnplaceablePin { user, shift_type, .. }) => {
            assert_eq!(user.as_str(), "dave");
            assert_eq!(shift_type, ShiftType::Evening);
        }
        other => panic!("expected UnplaceablePin, got {other:?}"),
    }

    let other_week = vec![ManagerOverride::pin(UserId::new("dave"), day(24), ShiftType::Morning)];
    assert!(matches!(
        build_assignments(&schedule(), &subs, &templates, &other_week),
        Err(SchedError::UnplaceablePin { .. })
    ));

    // un block sans objet ne gêne pas la construction
    let stray_block = vec![ManagerOverride::block(UserId::new("alice"), day(24), ShiftType::Evening)];
    let out = build_assignments(&schedule(), &subs, &templates, &stray_block).unwrap();
    assert_eq!(users_on(&out, day(10)), ["alice"]);
}
