#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn cli(ws: &Path) -> Command {
    let mut cmd = Command::cargo_bin("roulement-cli").unwrap();
    cmd.arg("--workspace").arg(ws);
    cmd
}

fn setup(ws: &Path, min_staff: &str) {
    cli(ws)
        .args(["init-org", "--id", "acme", "--name", "Acme", "--weekend", "4,5,6"])
        .args(["--deadline-day", "4", "--deadline-hour", "18"])
        .assert()
        .success();
    cli(ws)
        .args(["add-template", "--org", "acme", "--name", "Matin", "--shift-type", "MORNING"])
        .args(["--start", "07:00", "--end", "13:00", "--min-staff", min_staff, "--max-staff", "2"])
        .assert()
        .success();
    cli(ws)
        .args(["add-employee", "--org", "acme", "--id", "alice", "--name", "Alice"])
        .args(["--employment-type", "FULL_TIME"])
        .assert()
        .success();
}

#[test]
fn short_submission_reports_both_minimums() {
    let dir = tempdir().unwrap();
    let ws = dir.path().join("workspace.json");
    setup(&ws, "0");
    let csv = dir.path().join("slots.csv");
    fs::write(
        &csv,
        "shift_date,shift_type,preference_rank\n2024-06-10,MORNING,1\n2024-06-11,MORNING,2\n2024-06-12,MORNING,3\n2024-06-13,MORNING,4\n",
    )
    .unwrap();

    cli(&ws)
        .args(["submit", "--org", "acme", "--user", "alice", "--week", "2024-06-10"])
        .arg("--csv")
        .arg(&csv)
        .args(["--now", "2024-06-10T09:00"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("RequiresChanges"))
        .stderr(predicate::str::contains("INSUFFICIENT_SHIFTS"))
        .stderr(predicate::str::contains("INSUFFICIENT_WEEKEND_SHIFTS"));
}

#[test]
fn late_submission_is_refused() {
    let dir = tempdir().unwrap();
    let ws = dir.path().join("workspace.json");
    setup(&ws, "0");
    let csv = dir.path().join("slots.csv");
    fs::write(&csv, "shift_date,shift_type\n2024-06-10,MORNING\n").unwrap();

    cli(&ws)
        .args(["submit", "--org", "acme", "--user", "alice", "--week", "2024-06-10"])
        .arg("--csv")
        .arg(&csv)
        .args(["--now", "2024-06-13T18:00"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("DEADLINE_PASSED"))
        .stderr(predicate::str::contains("INSUFFICIENT").not());
}

#[test]
fn submit_build_publish_notify() {
    let dir = tempdir().unwrap();
    let ws = dir.path().join("workspace.json");
    setup(&ws, "0");
    let csv = dir.path().join("slots.csv");
    fs::write(
        &csv,
        "shift_date,shift_type\n2024-06-10,MORNING\n2024-06-11,MORNING\n2024-06-12,MORNING\n2024-06-13,MORNING\n2024-06-14,MORNING\n",
    )
    .unwrap();

    cli(&ws)
        .args(["submit", "--org", "acme", "--user", "alice", "--week", "2024-06-10"])
        .arg("--csv")
        .arg(&csv)
        .args(["--now", "2024-06-10T09:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending"));

    cli(&ws)
        .args(["build", "--org", "acme", "--week", "2024-06-12", "--created-by", "boss"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5 assignment(s)"));

    cli(&ws)
        .args(["publish", "--org", "acme", "--week", "2024-06-12", "--now", "2024-06-14T19:00"])
        .assert()
        .success();

    let out = dir.path().join("notice.txt");
    cli(&ws)
        .args(["notify", "--org", "acme", "--week", "2024-06-09", "--user", "alice"])
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("5 shift(s)"));
    let notice = fs::read_to_string(&out).unwrap();
    assert!(notice.contains("Bonjour Alice"));
    assert!(notice.contains("Matin 07:00-13:00"));

    // publié : plus de reconstruction
    cli(&ws)
        .args(["build", "--org", "acme", "--week", "2024-06-12", "--created-by", "boss"])
        .assert()
        .failure();
}

#[test]
fn understaffed_schedule_is_not_published() {
    let dir = tempdir().unwrap();
    let ws = dir.path().join("workspace.json");
    setup(&ws, "1");

    cli(&ws)
        .args(["build", "--org", "acme", "--week", "2024-06-12", "--created-by", "boss"])
        .args(["--pin", "alice@2024-06-10@MORNING"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("understaffed"));

    cli(&ws)
        .args(["publish", "--org", "acme", "--week", "2024-06-12", "--now", "2024-06-14T19:00"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("CONFLICT_DETECTED"));

    cli(&ws)
        .args(["check", "--org", "acme", "--week", "2024-06-12"])
        .assert()
        .code(2);
}

#[test]
fn manager_review_approves_then_freezes() {
    let dir = tempdir().unwrap();
    let ws = dir.path().join("workspace.json");
    setup(&ws, "0");
    let csv = dir.path().join("slots.csv");
    fs::write(
        &csv,
        "shift_date,shift_type\n2024-06-10,MORNING\n2024-06-11,MORNING\n2024-06-12,MORNING\n2024-06-13,MORNING\n2024-06-14,MORNING\n",
    )
    .unwrap();
    cli(&ws)
        .args(["submit", "--org", "acme", "--user", "alice", "--week", "2024-06-10"])
        .arg("--csv")
        .arg(&csv)
        .args(["--now", "2024-06-10T09:00"])
        .assert()
        .success();

    cli(&ws)
        .args(["review", "--org", "acme", "--user", "alice", "--week", "2024-06-12"])
        .args(["--decision", "approve", "--now", "2024-06-11T10:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("APPROVED"));

    cli(&ws)
        .args(["review", "--org", "acme", "--user", "alice", "--week", "2024-06-12"])
        .args(["--decision", "reject", "--now", "2024-06-11T11:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("APPROVED"));

    let raw = fs::read_to_string(&ws).unwrap();
    assert!(raw.contains("\"APPROVED\""));
}

#[test]
fn review_after_deadline_is_refused() {
    let dir = tempdir().unwrap();
    let ws = dir.path().join("workspace.json");
    setup(&ws, "0");
    let csv = dir.path().join("slots.csv");
    fs::write(&csv, "shift_date,shift_type\n2024-06-10,MORNING\n").unwrap();
    cli(&ws)
        .args(["submit", "--org", "acme", "--user", "alice", "--week", "2024-06-10"])
        .arg("--csv")
        .arg(&csv)
        .args(["--now", "2024-06-10T09:00"])
        .assert()
        .code(2);

    cli(&ws)
        .args(["review", "--org", "acme", "--user", "alice", "--week", "2024-06-10"])
        .args(["--decision", "approve", "--now", "2024-06-13T18:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("review window"));
}

#[test]
fn resubmission_follows_current_contract() {
    let dir = tempdir().unwrap();
    let ws = dir.path().join("workspace.json");
    setup(&ws, "0");
    let csv = dir.path().join("slots.csv");
    fs::write(&csv, "shift_date,shift_type\n2024-06-10,MORNING\n2024-06-14,MORNING\n").unwrap();
    let submit = |now: &str| {
        let mut cmd = cli(&ws);
        cmd.args(["submit", "--org", "acme", "--user", "alice", "--week", "2024-06-10"])
            .arg("--csv")
            .arg(&csv)
            .args(["--now", now]);
        cmd
    };

    submit("2024-06-10T09:00")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("RequiresChanges"));

    cli(&ws)
        .args(["add-employee", "--org", "acme", "--id", "alice", "--name", "Alice"])
        .args(["--employment-type", "STUDENT"])
        .assert()
        .success();
    submit("2024-06-10T10:00")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending"));
}

#[test]
fn employee_of_another_organisation_cannot_submit() {
    let dir = tempdir().unwrap();
    let ws = dir.path().join("workspace.json");
    setup(&ws, "0");
    cli(&ws)
        .args(["init-org", "--id", "globex", "--name", "Globex"])
        .assert()
        .success();
    cli(&ws)
        .args(["add-employee", "--org", "globex", "--id", "bob", "--name", "Bob"])
        .args(["--employment-type", "STUDENT"])
        .assert()
        .success();
    let csv = dir.path().join("slots.csv");
    fs::write(&csv, "shift_date,shift_type\n2024-06-10,MORNING\n").unwrap();

    cli(&ws)
        .args(["submit", "--org", "acme", "--user", "bob", "--week", "2024-06-10"])
        .arg("--csv")
        .arg(&csv)
        .args(["--now", "2024-06-10T09:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not belong"));
}

#[test]
fn a_held_workspace_lock_blocks_commands() {
    let dir = tempdir().unwrap();
    let ws = dir.path().join("workspace.json");
    setup(&ws, "0");
    assert!(!dir.path().join("workspace.json.lock").exists());

    fs::write(dir.path().join("workspace.json.lock"), "").unwrap();
    cli(&ws)
        .args(["check", "--org", "acme", "--week", "2024-06-12"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("locked"));
}
