// ABOUTME: Integration tests for the rollcheck CLI commands.
// ABOUTME: Validates --help output, init, and check against a fake kubectl.

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use support::fake_kubectl;

fn rollcheck_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("rollcheck"))
}

const READY: &str = r#"case "$*" in
  *"deployment web "*) echo 'deployment "web" successfully rolled out' ;;
  *) echo "error: $*" >&2; exit 1 ;;
esac"#;

#[test]
fn help_shows_commands() {
    rollcheck_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn init_creates_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("rollcheck.yml");

    rollcheck_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .success();

    assert!(config_path.exists(), "rollcheck.yml should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("resources:"), "Config should list resources");
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("rollcheck.yml");

    fs::write(&config_path, "namespace: mine\n").unwrap();

    rollcheck_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    rollcheck_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn check_without_resources_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    rollcheck_cmd()
        .current_dir(temp_dir.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no resources to check"));
}

#[test]
fn check_rejects_malformed_resource() {
    let temp_dir = tempfile::tempdir().unwrap();

    rollcheck_cmd()
        .current_dir(temp_dir.path())
        .args(["check", "web"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid resource"));
}

#[test]
fn check_succeeds_when_rolled_out() {
    let temp_dir = tempfile::tempdir().unwrap();
    let kubectl = fake_kubectl(temp_dir.path(), READY);

    rollcheck_cmd()
        .current_dir(temp_dir.path())
        .env("ROLLCHECK_KUBECTL", &kubectl)
        .args(["check", "deployment/web", "--context", "kind-test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Waiting for deployments to stabilize..."))
        .stdout(predicate::str::contains(" - default/deployment/web is ready."))
        .stdout(predicate::str::contains("Deployments stabilized in"));
}

#[test]
fn check_fails_with_failure_count() {
    let temp_dir = tempfile::tempdir().unwrap();
    let kubectl = fake_kubectl(temp_dir.path(), READY);

    rollcheck_cmd()
        .current_dir(temp_dir.path())
        .env("ROLLCHECK_KUBECTL", &kubectl)
        .args([
            "check",
            "deployment/web",
            "deployment/api",
            "--context",
            "kind-test",
        ])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains(" - default/deployment/api failed. Error:"))
        .stderr(predicate::str::contains("Error: 1/2 deployment(s) failed"));
}

#[test]
fn check_reads_resources_from_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let kubectl = fake_kubectl(temp_dir.path(), READY);
    fs::write(
        temp_dir.path().join("rollcheck.yml"),
        format!(
            "kube_context: kind-test\nkubectl: {}\nnamespace: shop\nresources:\n  - deployment/web\n",
            kubectl.display()
        ),
    )
    .unwrap();

    rollcheck_cmd()
        .current_dir(temp_dir.path())
        .env_remove("ROLLCHECK_KUBECTL")
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains(" - shop/deployment/web is ready."));
}

#[test]
fn check_json_output_is_line_delimited() {
    let temp_dir = tempfile::tempdir().unwrap();
    let kubectl = fake_kubectl(temp_dir.path(), READY);

    let output = rollcheck_cmd()
        .current_dir(temp_dir.path())
        .env("ROLLCHECK_KUBECTL", &kubectl)
        .args([
            "check",
            "deployment/web",
            "--context",
            "kind-test",
            "--output",
            "json",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert!(events.iter().any(|e| e["event"] == "ready"
        && e["resource"] == "default/deployment/web"
        && e["code"] == "SUCCESS"));

    let change = events.iter().find(|e| e["event"] == "status").unwrap();
    for key in ["resource", "status", "code", "completed", "timestamp"] {
        assert!(change.get(key).is_some(), "missing {key} in {change}");
    }
    assert_eq!(change["status"], "deployment \"web\" successfully rolled out");
    assert_eq!(change["completed"], true);
    assert_eq!(events.last().unwrap()["event"], "success");
}

#[test]
fn quiet_mode_prints_only_result() {
    let temp_dir = tempfile::tempdir().unwrap();
    let kubectl = fake_kubectl(temp_dir.path(), READY);

    rollcheck_cmd()
        .current_dir(temp_dir.path())
        .env("ROLLCHECK_KUBECTL", &kubectl)
        .args(["-q", "check", "deployment/web", "--context", "kind-test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is ready").not())
        .stdout(predicate::str::contains("1 resource(s) rolled out"));
}
