//! Integration tests for itchyctl against the simulated device
//!
//! Every test points `--config` into a temp directory so the user's real
//! configuration is never read or written.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn is_json() -> impl predicates::Predicate<[u8]> {
    predicates::function::function(|s: &[u8]| {
        std::str::from_utf8(s)
            .ok()
            .is_some_and(|text| serde_json::from_str::<Value>(text).is_ok())
    })
}

fn itchyctl(dir: &TempDir) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("itchyctl")?;
    cmd.env_remove("RUST_LOG")
        .arg("--config")
        .arg(config_path(dir));
    Ok(cmd)
}

fn config_path(dir: &TempDir) -> PathBuf {
    dir.path().join("config.json")
}

#[test]
fn help_lists_commands() -> TestResult {
    let dir = TempDir::new()?;
    itchyctl(&dir)?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("calibration-target"))
        .stdout(predicate::str::contains("monitor"));
    Ok(())
}

#[test]
fn config_init_writes_defaults_once() -> TestResult {
    let dir = TempDir::new()?;

    itchyctl(&dir)?.args(["config", "init"]).assert().success();
    let written: Value = serde_json::from_str(&fs::read_to_string(config_path(&dir))?)?;
    assert_eq!(written["schema_version"], "itchy.config/1");

    itchyctl(&dir)?
        .args(["config", "init"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("already exists"));

    itchyctl(&dir)?
        .args(["config", "init", "--force"])
        .assert()
        .success();
    Ok(())
}

#[test]
fn config_show_json() -> TestResult {
    let dir = TempDir::new()?;
    itchyctl(&dir)?
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .stdout(is_json())
        .stdout(predicate::str::contains("\"timeout_ms\": 50"));
    Ok(())
}

#[test]
fn invalid_config_exits_with_4() -> TestResult {
    let dir = TempDir::new()?;
    fs::write(config_path(&dir), r#"{"schema_version": "other/9"}"#)?;
    itchyctl(&dir)?
        .args(["--simulate", "list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Invalid configuration"));
    Ok(())
}

#[test]
fn list_simulated_device_json() -> TestResult {
    let dir = TempDir::new()?;
    let output = itchyctl(&dir)?
        .args(["--simulate", "--json", "list"])
        .output()?;
    assert!(output.status.success());

    let listed: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(listed["success"], true);
    assert_eq!(listed["devices"].as_array().map(Vec::len), Some(1));
    assert_eq!(listed["devices"][0]["vendor_id"], 0x16C0);
    Ok(())
}

#[test]
fn color_command_succeeds() -> TestResult {
    let dir = TempDir::new()?;
    itchyctl(&dir)?
        .args(["--simulate", "color", "0", "128", "255"])
        .assert()
        .success()
        .stdout(predicate::str::contains("LED set to (0, 128, 255)"));
    Ok(())
}

#[test]
fn invalid_params_rejected_before_sending() -> TestResult {
    let dir = TempDir::new()?;
    itchyctl(&dir)?
        .args([
            "--simulate",
            "params",
            "--mass=-1",
            "--stiffness",
            "2000",
            "--damping",
            "30",
        ])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("mass must be positive"));
    Ok(())
}

#[test]
fn params_command_succeeds() -> TestResult {
    let dir = TempDir::new()?;
    itchyctl(&dir)?
        .args([
            "--simulate",
            "params",
            "--mass",
            "0.2",
            "--stiffness",
            "1500",
            "--damping",
            "25",
            "--update-rate",
            "10",
        ])
        .assert()
        .success();
    Ok(())
}

#[test]
fn calibration_target_validation() -> TestResult {
    let dir = TempDir::new()?;
    itchyctl(&dir)?
        .args([
            "--simulate",
            "calibration-target",
            "--width-cm",
            "0",
            "--height-cm",
            "10",
        ])
        .assert()
        .code(4);

    itchyctl(&dir)?
        .args([
            "--simulate",
            "calibration-target",
            "--width-cm",
            "30",
            "--height-cm",
            "20",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("30 x 20 cm"));
    Ok(())
}

#[test]
fn calibrate_and_save_succeed() -> TestResult {
    let dir = TempDir::new()?;
    itchyctl(&dir)?
        .args(["--simulate", "calibrate"])
        .assert()
        .success();
    itchyctl(&dir)?
        .args(["--simulate", "save", "--json"])
        .assert()
        .success()
        .stdout(is_json());
    Ok(())
}

#[test]
fn apply_sends_configured_values() -> TestResult {
    let dir = TempDir::new()?;
    fs::write(
        config_path(&dir),
        r#"{
            "simulation": {"mass": 0.2, "stiffness": 1500.0, "damping": 20.0, "update_rate_ms": 10},
            "calibration_target": [0.3, 0.2]
        }"#,
    )?;
    itchyctl(&dir)?
        .args(["--simulate", "apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration applied"));
    Ok(())
}

#[test]
fn apply_without_values_is_noop() -> TestResult {
    let dir = TempDir::new()?;
    itchyctl(&dir)?
        .args(["--simulate", "apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to apply"));
    Ok(())
}

#[test]
fn monitor_streams_json_states() -> TestResult {
    let dir = TempDir::new()?;
    let output = itchyctl(&dir)?
        .args(["--simulate", "--json", "monitor", "--duration-secs", "0.3"])
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let states: Vec<Value> = stdout
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert!(!states.is_empty());
    assert!(states.iter().all(|s| s.get("position").is_some()));
    Ok(())
}

#[test]
fn smoke_runs_against_simulator() -> TestResult {
    let dir = TempDir::new()?;
    itchyctl(&dir)?
        .args(["--simulate", "smoke", "--interval-ms", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Velocity: <Vec2("))
        .stdout(predicate::str::contains("Velocity length:"))
        .stdout(predicate::str::contains("Button pressed: false"))
        .stdout(predicate::str::contains("LED blue"));
    Ok(())
}
