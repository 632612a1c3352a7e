//! CLI surface tests for the `lbrs` binary
//!
//! Nothing here needs the network or the GDAL binaries; these cover argument
//! parsing, configuration loading, and the config echo command.

use assert_cmd::Command;
use predicates::prelude::*;

fn lbrs() -> Command {
    Command::cargo_bin("lbrs").expect("binary builds")
}

#[test]
fn bare_invocation_points_at_help() {
    lbrs()
        .assert()
        .success()
        .stdout(predicate::str::contains("lbrs --help"));
}

#[test]
fn help_lists_the_commands() {
    lbrs()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn config_command_echoes_the_effective_config() {
    let temp = tempfile::tempdir().unwrap();
    let config_file = temp.path().join("lbrs.toml");
    std::fs::write(
        &config_file,
        r#"
workspace = "/tmp/lbrs-ws"
counties = ["HAR"]
layer_types = ["CL"]
"#,
    )
    .unwrap();

    lbrs()
        .args(["--config", config_file.to_str().unwrap(), "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/lbrs-ws"))
        .stdout(predicate::str::contains("HAR"));
}

#[test]
fn missing_config_file_is_a_clean_error() {
    lbrs()
        .args(["--config", "/nonexistent/lbrs.toml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration not found"));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let config_file = temp.path().join("lbrs.toml");
    std::fs::write(&config_file, "use_arch_db = 1\n").unwrap();

    lbrs()
        .args(["--config", config_file.to_str().unwrap(), "config"])
        .assert()
        .failure();
}

#[test]
fn bad_county_narrowing_fails_before_any_work() {
    lbrs()
        .args(["sync", "--county", "NOPE!"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid county code"));
}
