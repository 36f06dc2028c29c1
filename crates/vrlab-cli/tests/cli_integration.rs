//! CLI subprocess integration tests.
//!
//! These tests invoke the `vrlab` binary as a subprocess against the mock
//! runtime and verify exit codes, stdout content, and JSON output.

use std::path::{Path, PathBuf};
use std::process::Command;

fn vrlab_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vrlab"));
    // The mock runtime needs neither docker nor /dev/kvm.
    cmd.env("VRLAB_SKIP_PREREQS", "1");
    cmd.env_remove("VRLAB_LOG");
    cmd
}

fn write_node_file(dir: &Path, extra: &str) -> PathBuf {
    let path = dir.join("r1.toml");
    std::fs::write(
        &path,
        format!(
            r#"node_version = 1

[lab]
name = "dc1"

[node]
name = "r1"
kind = "vr-nxos"
image = "nxos:9.3"
{extra}
"#
        ),
    )
    .unwrap();
    path
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn cli_version_exits_zero() {
    let output = vrlab_bin().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("vrlab"));
}

#[test]
fn cli_help_lists_commands() {
    let output = vrlab_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["deploy", "destroy", "inspect", "images", "kinds", "doctor"] {
        assert!(stdout.contains(cmd), "help must list '{cmd}': {stdout}");
    }
}

#[test]
fn cli_deploy_with_mock_renders_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("r1.cfg"),
        "hostname {{ .ShortName }}\n",
    )
    .unwrap();
    let node = write_node_file(dir.path(), "startup_config = \"r1.cfg\"");

    let output = vrlab_bin()
        .args(["--json", "deploy", "--runtime", "mock"])
        .arg(&node)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "deploy must exit 0. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report = stdout_json(&output);
    assert_eq!(report["kind"], "vr-nxos");
    assert_eq!(report["long_name"], "clab-dc1-r1");
    assert_eq!(report["images"]["image"], "nxos:9.3");
    assert!(report["warnings"].as_array().unwrap().is_empty());

    let rendered = dir
        .path()
        .join("clab-dc1")
        .join("r1")
        .join("config")
        .join("startup-config.cfg");
    assert_eq!(std::fs::read_to_string(rendered).unwrap(), "hostname r1\n");
}

#[test]
fn cli_deploy_with_bad_template_warns_unless_strict() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("r1.cfg"), "hostname {{ serial }}\n").unwrap();
    let node = write_node_file(dir.path(), "startup_config = \"r1.cfg\"");

    let output = vrlab_bin()
        .args(["--json", "deploy", "--runtime", "mock"])
        .arg(&node)
        .output()
        .unwrap();
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["warnings"].as_array().unwrap().len(), 1);

    let output = vrlab_bin()
        .args(["deploy", "--runtime", "mock", "--strict-render"])
        .arg(&node)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to generate config"), "{stderr}");
}

#[test]
fn cli_deploy_missing_startup_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let node = write_node_file(dir.path(), "startup_config = \"absent.cfg\"");

    let output = vrlab_bin()
        .args(["deploy", "--runtime", "mock"])
        .arg(&node)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read startup config"), "{stderr}");
}

#[test]
fn cli_invalid_node_file_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("r1.toml");
    std::fs::write(&path, "node_version = 1\n[lab]\nname = \"dc1\"\nbogus = 1\n").unwrap();

    let output = vrlab_bin().arg("inspect").arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("node file error"));
}

#[test]
fn cli_destroy_unknown_container_exits_three() {
    let dir = tempfile::tempdir().unwrap();
    let node = write_node_file(dir.path(), "");

    // Each process gets a fresh mock, so there is nothing to remove.
    let output = vrlab_bin()
        .args(["destroy", "--runtime", "mock"])
        .arg(&node)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("clab-dc1-r1"), "{stderr}");
}

#[test]
fn cli_inspect_json_shows_prepared_spec() {
    let dir = tempfile::tempdir().unwrap();
    let node = write_node_file(dir.path(), "[node.env]\nPASSWORD = \"s3cret\"");

    let output = vrlab_bin()
        .args(["--json", "inspect"])
        .arg(&node)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value = stdout_json(&output);
    assert_eq!(value["state"], "initialized");
    let spec = &value["spec"];
    assert_eq!(spec["env"]["PASSWORD"], "s3cret");
    assert_eq!(spec["env"]["USERNAME"], "admin");
    assert_eq!(spec["host_requirements"]["virt_required"], true);
    assert_eq!(
        spec["cmd"],
        "--username admin --password s3cret --hostname r1 --connection-mode tc --trace"
    );
}

#[test]
fn cli_inspect_reports_container_state() {
    let dir = tempfile::tempdir().unwrap();
    let node = write_node_file(dir.path(), "");

    let output = vrlab_bin()
        .args(["--json", "inspect", "--runtime", "mock"])
        .arg(&node)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["container"], "absent");

    let output = vrlab_bin()
        .args(["inspect", "--runtime", "mock"])
        .arg(&node)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("container:   absent"), "{stdout}");

    // Without a runtime nothing is queried.
    let output = vrlab_bin()
        .args(["--json", "inspect"])
        .arg(&node)
        .output()
        .unwrap();
    assert!(stdout_json(&output).get("container").is_none());
}

#[test]
fn cli_inspect_unknown_runtime_exits_three() {
    let dir = tempfile::tempdir().unwrap();
    let node = write_node_file(dir.path(), "");

    let output = vrlab_bin()
        .args(["inspect", "--runtime", "podman"])
        .arg(&node)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("runtime error"));
}

#[test]
fn cli_images_lists_primary_image() {
    let dir = tempfile::tempdir().unwrap();
    let node = write_node_file(dir.path(), "");

    let output = vrlab_bin().arg("images").arg(&node).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "image: nxos:9.3");
}

#[test]
fn cli_kinds_json() {
    let output = vrlab_bin().args(["--json", "kinds"]).output().unwrap();
    assert!(output.status.success());
    let kinds = stdout_json(&output);
    let names: Vec<&str> = kinds
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k["kind"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["vr-cisco_nxos", "vr-nxos"]);
    assert_eq!(kinds[0]["default_credentials"]["username"], "admin");
}

#[test]
fn cli_doctor_json_is_structured() {
    let output = vrlab_bin()
        .args(["--json", "doctor", "--runtime", "mock"])
        .output()
        .unwrap();
    let value = stdout_json(&output);
    assert!(value["healthy"].is_boolean());
    assert!(value["checks"].as_array().unwrap().len() >= 3);
}

#[test]
fn cli_completions_bash() {
    let output = vrlab_bin().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("vrlab"));
}
