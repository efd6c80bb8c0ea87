#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn cli(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("frontdesk-cli").unwrap();
    cmd.current_dir(dir);
    cmd
}

#[test]
fn init_then_demand() {
    let dir = tempdir().unwrap();
    cli(dir.path())
        .args(["init", "--preset", "low", "--week-start", "2026-10-19"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Request written to request.json (15 employees)"));
    assert!(dir.path().join("request.json").exists());

    // pas d'écrasement silencieux
    cli(dir.path())
        .args(["init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    cli(dir.path())
        .args(["demand", "--out-json", "demand.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mon morning"))
        .stdout(predicate::str::contains("concierge yes"));
    let demand = fs::read_to_string(dir.path().join("demand.json")).unwrap();
    assert!(demand.contains("receptionist_min"));
}

#[test]
fn plan_writes_csv_exports() {
    let dir = tempdir().unwrap();
    cli(dir.path()).args(["init", "--preset", "low"]).assert().success();

    cli(dir.path())
        .args([
            "plan",
            "--max-nodes",
            "5000",
            "--time-limit-ms",
            "3000",
            "--out-csv",
            "plan.csv",
            "--stats-csv",
            "stats.csv",
        ])
        .assert()
        .code(predicate::in_iter([0, 2]))
        .stdout(predicate::str::contains("ratio compliance"));

    let plan = fs::read_to_string(dir.path().join("plan.csv")).unwrap();
    assert!(plan.starts_with("employee_id,display_name,day,weekday,period"));
    assert!(plan.contains("concierge"));
    assert!(dir.path().join("stats.csv").exists());
}

#[test]
fn validate_reports_hand_edited_errors() {
    let dir = tempdir().unwrap();
    cli(dir.path()).args(["init", "--preset", "low"]).assert().success();
    fs::write(
        dir.path().join("edited.csv"),
        "employee_id,day,period\nsup-1,Mon,night\n",
    )
    .unwrap();

    cli(dir.path())
        .args(["validate", "--assignment", "edited.csv", "--report", "report.csv"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("violation(s)"))
        .stderr(predicate::str::contains(
            "[role_ineligible] sup-1 (supervisor) is not eligible for Mon night",
        ));
    let report = fs::read_to_string(dir.path().join("report.csv")).unwrap();
    assert!(report.contains("role_ineligible"));
}

#[test]
fn presets_list_save_and_apply() {
    let dir = tempdir().unwrap();
    cli(dir.path())
        .args(["presets", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("high | Haute saison | builtin"));

    cli(dir.path()).args(["init", "--preset", "high"]).assert().success();
    cli(dir.path())
        .args(["presets", "save", "--id", "salon", "--name", "Salon"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Preset saved to"));
    assert!(dir.path().join("presets/salon.json").exists());

    cli(dir.path())
        .args(["presets", "apply", "low"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Forecast replaced by preset low"));
    let request = fs::read_to_string(dir.path().join("request.json")).unwrap();
    assert!(request.contains("\"check_ins\": 80"));
}
