// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Integration tests for the pickard CLI commands

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// pickard with an isolated config directory and no inherited overrides
fn pickard_env(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pickard").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("PICKARD_CATALOG")
        .env_remove("PICKARD_CONFIG")
        .env_remove("NO_COLOR")
        .env_remove("RUST_LOG");
    cmd
}

/// Like [`pickard_env`], with plain output
fn pickard(home: &TempDir) -> Command {
    let mut cmd = pickard_env(home);
    cmd.arg("--no-color");
    cmd
}

const SMALL_CATALOG: &str = r#"
chain = ["Year", "Make"]

[defaults]
Year = ["2024"]

[[entries]]
attribute = "Make"
when = { Year = "2024" }
values = ["Ford", "Toyota"]
"#;

/// Model list depends on the make only, so it survives a year change
const MAKE_ONLY_CATALOG: &str = r#"
chain = ["Year", "Make", "Model"]

[defaults]
Year = ["2024", "2023"]
Make = ["Ford"]

[[entries]]
attribute = "Model"
when = { Make = "Ford" }
values = ["F-150", "Ranger"]
"#;

#[test]
fn test_options_lists_models() {
    let home = TempDir::new().unwrap();

    pickard(&home)
        .args(["options", "Model", "--set", "Year=2024", "--set", "Make=Ford"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Model ("))
        .stdout(predicate::str::contains("F-150"))
        .stdout(predicate::str::contains("Mustang"));
}

#[test]
fn test_options_json_reports_source() {
    let home = TempDir::new().unwrap();

    let output = pickard(&home)
        .args(["--json", "options", "Model", "-s", "Year=2024", "-s", "Make=Ford"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["attribute"], "Model");
    assert_eq!(report["source"], "exact");
    assert!(report["options"]
        .as_array()
        .unwrap()
        .iter()
        .any(|v| v == "F-150"));
}

#[test]
fn test_options_requires_upstream() {
    let home = TempDir::new().unwrap();

    pickard(&home)
        .args(["options", "Model", "--set", "Year=2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("depends on Make"));
}

#[test]
fn test_select_full_chain() {
    let home = TempDir::new().unwrap();

    pickard(&home)
        .args([
            "select",
            "-s", "Year=2024",
            "-s", "Make=Ford",
            "-s", "Model=F-150",
            "-s", "Submodel=XLT",
            "-s", "Engine=3.5L V6 PowerBoost Hybrid",
            "-s", "DriveType=4WD",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("DriveType  4WD"))
        .stdout(predicate::str::contains("Selection complete."));
}

#[test]
fn test_select_rejects_invalid_value() {
    let home = TempDir::new().unwrap();

    pickard(&home)
        .args(["select", "-s", "Year=2024", "-s", "Make=Zzyzx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Selection rejected at Make=Zzyzx"))
        .stderr(predicate::str::contains("not a valid Make"));
}

#[test]
fn test_select_json_after_year_change() {
    let home = TempDir::new().unwrap();

    let output = pickard(&home)
        .args([
            "--json", "select",
            "-s", "Year=2024",
            "-s", "Make=Ford",
            "-s", "Year=2010",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["complete"], false);
    assert_eq!(report["attributes"][0]["selected"], "2010");
    assert!(report["attributes"][1]["selected"].is_null());
    assert!(report["attributes"][1]["options"]
        .as_array()
        .unwrap()
        .iter()
        .any(|v| v == "Pontiac"));
}

#[test]
fn test_session_from_stdin() {
    let home = TempDir::new().unwrap();

    pickard(&home)
        .arg("session")
        .write_stdin("set Year 2024\nset Make Ford\nset Model Nope\noptions Engine\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Vehicle picker: Year → Make"))
        .stdout(predicate::str::contains("Make       Ford"))
        .stdout(predicate::str::contains("rejected: 'Nope' is not a valid Model"))
        .stdout(predicate::str::contains("no options for Engine yet"));
}

#[test]
fn test_chain_lists_attributes() {
    let home = TempDir::new().unwrap();

    pickard(&home)
        .arg("chain")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Year → Make → Model → Submodel → Engine → DriveType",
        ))
        .stdout(predicate::str::contains("contains(Model)"));
}

#[test]
fn test_check_valid_and_invalid_catalogs() {
    let home = TempDir::new().unwrap();
    let good = home.path().join("small.toml");
    std::fs::write(&good, SMALL_CATALOG).unwrap();

    pickard(&home)
        .arg("check")
        .arg(&good)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid: Year → Make"))
        .stdout(predicate::str::contains("Make: 1 entries"));

    let bad = home.path().join("bad.toml");
    std::fs::write(
        &bad,
        "chain = [\"Year\", \"Make\"]\n\n[[entries]]\nattribute = \"Trim\"\nvalues = [\"LX\"]\n",
    )
    .unwrap();

    pickard(&home)
        .arg("check")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid catalog"));
}

#[test]
fn test_catalog_override() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("small.toml");
    std::fs::write(&path, SMALL_CATALOG).unwrap();

    pickard(&home)
        .arg("--catalog")
        .arg(&path)
        .args(["options", "Make", "-s", "Year=2024"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Toyota"))
        .stdout(predicate::str::contains("Make (2, exact)"));
}

#[test]
fn test_export_json_parses() {
    let home = TempDir::new().unwrap();

    let output = pickard(&home)
        .args(["export", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let file: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(file["chain"][0], "Year");
    assert_eq!(file["chain"][5], "DriveType");
}

#[test]
fn test_export_to_file_and_reload() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("export.toml");

    pickard(&home)
        .args(["export", "--output"])
        .arg(&out)
        .assert()
        .success();

    pickard(&home)
        .arg("check")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn test_config_reads_explicit_file() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("pickard.toml");
    std::fs::write(&path, "cascade = \"retain\"\n").unwrap();

    pickard(&home)
        .arg("--config")
        .arg(&path)
        .args(["config", "cascade"])
        .assert()
        .success()
        .stdout(predicate::str::contains("retain"));
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();

    pickard(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pickard"));
}

#[test]
fn test_no_color_env_disables_color() {
    let home = TempDir::new().unwrap();

    pickard_env(&home)
        .env("NO_COLOR", "1")
        .arg("chain")
        .assert()
        .success();

    pickard_env(&home)
        .env("NO_COLOR", "1")
        .args(["select", "-s", "Year=2024", "-s", "Make=Ford"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Make       Ford"))
        .stdout(predicate::str::contains("\u{1b}").not());
}

#[test]
fn test_empty_no_color_env_is_accepted() {
    let home = TempDir::new().unwrap();

    pickard_env(&home)
        .env("NO_COLOR", "")
        .arg("chain")
        .assert()
        .success()
        .stdout(predicate::str::contains("Year → Make"));
}

#[test]
fn test_cascade_flag_selects_policy() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("make-only.toml");
    std::fs::write(&path, MAKE_ONLY_CATALOG).unwrap();
    let sets = [
        "select", "-s", "Year=2024", "-s", "Make=Ford", "-s", "Model=F-150", "-s", "Year=2023",
    ];

    pickard(&home)
        .arg("--catalog")
        .arg(&path)
        .args(["--cascade", "retain"])
        .args(sets)
        .assert()
        .success()
        .stdout(predicate::str::contains("Model  F-150"))
        .stdout(predicate::str::contains("Selection complete."));

    pickard(&home)
        .arg("--catalog")
        .arg(&path)
        .args(sets)
        .assert()
        .success()
        .stdout(predicate::str::contains("Make   (unset)"))
        .stdout(predicate::str::contains("Selection complete.").not());

    pickard(&home)
        .args(["--cascade", "sideways", "chain"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown cascade policy 'sideways'"));
}
