#![allow(deprecated)] // Command::cargo_bin

use assert_cmd::Command;
use predicates::prelude::*;

const CREDENTIAL_VARS: [&str; 8] = [
    "SL_USERNAME",
    "SL_API_KEY",
    "SL_ENDPOINT_URL",
    "BM_API_KEY",
    "BM_REGION",
    "OW_HOST",
    "OW_AUTH_KEY",
    "OW_NAMESPACE",
];

/// Command isolated from any config file or credentials on the host
fn skyline(dir: &tempfile::TempDir) -> Command {
    let config_path = dir.path().join("empty.yaml");
    std::fs::write(&config_path, "").unwrap();

    let mut cmd = Command::cargo_bin("skyline").unwrap();
    cmd.current_dir(dir.path())
        .env("SKYLINE_CONFIG_PATH", &config_path)
        .env_remove("RUST_LOG");
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("skyline").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("vlan"))
        .stdout(predicate::str::contains("firewall"))
        .stdout(predicate::str::contains("action"))
        .stdout(predicate::str::contains("package"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("skyline").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("skyline"));
}

#[test]
fn test_name_resolves_all_parts() {
    let mut cmd = Command::cargo_bin("skyline").unwrap();
    cmd.args(["name", "/whisk.system/cloudant/delete-attachment"])
        .assert()
        .success()
        .stdout(predicate::str::contains("whisk.system"))
        .stdout(predicate::str::contains("cloudant"))
        .stdout(predicate::str::contains("/whisk.system/cloudant/delete-attachment"));
}

#[test]
fn test_name_binds_default_namespace() {
    let mut cmd = Command::cargo_bin("skyline").unwrap();
    cmd.args(["name", "hello", "--namespace", "org_dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/org_dev/hello"));
}

#[test]
fn test_malformed_name_fails() {
    let mut cmd = Command::cargo_bin("skyline").unwrap();
    cmd.args(["name", "a/b/c/d"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("a/b/c/d"));
}

#[test]
fn test_vlan_create_help() {
    let mut cmd = Command::cargo_bin("skyline").unwrap();
    cmd.args(["vlan", "create", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--datacenter"))
        .stdout(predicate::str::contains("--subnet-size"))
        .stdout(predicate::str::contains("--router-hostname"));
}

#[test]
fn test_vlan_type_is_validated_by_parser() {
    let mut cmd = Command::cargo_bin("skyline").unwrap();
    cmd.args([
        "vlan",
        "create",
        "--datacenter",
        "dal06",
        "--type",
        "INTERNAL",
        "--subnet-size",
        "8",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("PUBLIC"));
}

#[test]
fn test_vlan_show_without_credentials() {
    let dir = tempfile::tempdir().unwrap();
    skyline(&dir)
        .args(["vlan", "show", "1234"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SoftLayer credentials are not configured"));
}

#[test]
fn test_action_show_without_credentials() {
    let dir = tempfile::tempdir().unwrap();
    skyline(&dir)
        .args(["action", "show", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OpenWhisk credentials are not configured"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("skyline").unwrap();
    cmd.arg("invalid-command").assert().failure();
}
