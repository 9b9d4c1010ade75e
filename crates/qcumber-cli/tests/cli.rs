//! Smoke tests for the `qcumber` binary.
#![expect(clippy::expect_used, reason = "tests use temporary directories")]

use std::fs;
use std::path::Path;
use std::str;

use assert_cmd::Command;
use rstest::{fixture, rstest};
use tempfile::TempDir;

const STEPS: &str = "\
Given /^an empty basket$/ do
end

# qcumber (add|remove) (*)
When /^I (\\w+) (\\d+) cucumbers$/ do |op, n|
end
";

const BASKET: &str = "\
@smoke
Feature: Basket

  Background:
    Given an empty basket

  @fast
  Scenario: Adding cucumbers
    When I add 3 cucumbers

  @wip
  Scenario: Eating cucumbers
    When I eat 2 cucumbers
    Then nothing is left
";

#[fixture]
fn project() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir_all(dir.path().join("features/step_definitions")).expect("dirs");
    fs::write(dir.path().join("features/basket.feature"), BASKET).expect("feature");
    fs::write(dir.path().join("features/step_definitions/basket.rb"), STEPS).expect("steps");
    dir
}

fn qcumber(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("qcumber").expect("binary exists");
    cmd.current_dir(dir)
        .env_remove("QCUMBER_LOG_LEVEL")
        .env_remove("QCUMBER_LANGUAGE")
        .env_remove("QCUMBER_OVERRIDE_MARKER")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_of(output: &std::process::Output) -> &str {
    str::from_utf8(&output.stdout).expect("utf8")
}

#[rstest]
fn steps_lists_patterns(project: TempDir) {
    let output = qcumber(project.path())
        .args(["steps", "features"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("basket.rb:1: an empty basket\n"), "{stdout}");
    assert!(stdout.contains("I (\\w+) (\\d+) cucumbers [(add|remove), *]"), "{stdout}");
}

#[rstest]
fn steps_emit_json(project: TempDir) {
    let output = qcumber(project.path())
        .args(["steps", "--json", "features/step_definitions/basket.rb"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let steps = value.as_array().expect("array");
    assert_eq!(steps.len(), 2);
    assert_eq!(
        steps.get(1).and_then(|step| step.get("line")),
        Some(&serde_json::json!(5))
    );
}

#[rstest]
fn check_reports_unmatched_and_mismatched_steps(project: TempDir) {
    let output = qcumber(project.path())
        .args(["check", "--steps", "features", "features"])
        .output()
        .expect("runs");
    assert!(!output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("unmatched step \"Then nothing is left\""), "{stdout}");
    assert!(
        stdout.contains("binds \"eat\" to parameter 1, expected (add|remove)"),
        "{stdout}"
    );
    assert!(
        stdout.contains("1 feature(s), 3 of 4 step(s) matched, 2 problem(s)"),
        "{stdout}"
    );
}

#[rstest]
fn check_reports_unreadable_files_and_keeps_going(project: TempDir) {
    fs::write(project.path().join("features/notes.feature"), "just some notes\n").expect("notes");
    let output = qcumber(project.path())
        .args(["check", "--steps", "features", "--steps", "absent", "features"])
        .output()
        .expect("runs");
    assert!(!output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("notes.feature: failed to read"), "{stdout}");
    assert!(stdout.contains("absent: "), "{stdout}");
    assert!(
        stdout.contains("1 feature(s), 3 of 4 step(s) matched, 4 problem(s)"),
        "{stdout}"
    );
}

#[rstest]
fn fmt_rewrites_good_files_despite_missing_ones(project: TempDir) {
    let path = project.path().join("features/basket.feature");
    fs::write(&path, BASKET.replace("    When I add", "\tWhen I add")).expect("sloppy");

    let output = qcumber(project.path())
        .args(["fmt", "missing.feature", "features"])
        .output()
        .expect("runs");
    assert!(!output.status.success());
    assert!(stdout_of(&output).starts_with("reformatted "));
    assert_eq!(fs::read_to_string(&path).expect("read"), BASKET);
    let stderr = str::from_utf8(&output.stderr).expect("utf8");
    assert!(stderr.contains("missing.feature"), "{stderr}");
}

#[rstest]
fn steps_lists_readable_definitions_when_a_root_is_missing(project: TempDir) {
    let output = qcumber(project.path())
        .args(["steps", "absent", "features"])
        .output()
        .expect("runs");
    assert!(!output.status.success());
    assert!(stdout_of(&output).contains("basket.rb:1: an empty basket\n"));
}

#[rstest]
fn fmt_check_then_rewrite(project: TempDir) {
    let path = project.path().join("features/basket.feature");
    fs::write(&path, BASKET.replace("    When I add", "\tWhen I add")).expect("sloppy");

    let output = qcumber(project.path())
        .args(["fmt", "--check", "features"])
        .output()
        .expect("runs");
    assert!(!output.status.success());
    assert!(stdout_of(&output).starts_with("would reformat "));

    let output = qcumber(project.path())
        .args(["fmt", "features"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&path).expect("read"), BASKET);

    let output = qcumber(project.path())
        .args(["fmt", "--check", "features"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[rstest]
fn tags_build_a_run_selection(project: TempDir) {
    let output = qcumber(project.path())
        .args(["tags", "features", "--toggle", "smoke", "--toggle", "wip", "--toggle", "@wip"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    assert_eq!(
        stdout_of(&output),
        "@fast\n@smoke\n@wip\n--tags @smoke ~@wip\n"
    );
}

#[rstest]
fn scenario_prints_feature_context(project: TempDir) {
    let output = qcumber(project.path())
        .args(["scenario", "features/basket.feature", "Eating cucumbers"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    assert_eq!(
        stdout_of(&output),
        "\
@smoke
Feature: Basket

  Background:
    Given an empty basket

  @wip
  Scenario: Eating cucumbers
    When I eat 2 cucumbers
    Then nothing is left
"
    );
}

#[rstest]
fn unknown_scenarios_fail(project: TempDir) {
    let output = qcumber(project.path())
        .args(["scenario", "features/basket.feature", "Juggling"])
        .output()
        .expect("runs");
    assert!(!output.status.success());
    let stderr = str::from_utf8(&output.stderr).expect("utf8");
    assert!(stderr.contains("no scenario titled 'Juggling'"), "{stderr}");
}

#[rstest]
fn new_creates_a_template(project: TempDir) {
    let output = qcumber(project.path())
        .args(["new", "drafts"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    let created = stdout_of(&output)
        .trim()
        .strip_prefix("created ")
        .expect("created line")
        .to_string();
    assert!(created.contains("noname_"));
    let text = fs::read_to_string(project.path().join(&created)).expect("template");
    assert_eq!(text, "Feature: New Feature\n\n  Scenario: New Scenario\n");
}

#[rstest]
fn invalid_log_level_is_rejected(project: TempDir) {
    let output = qcumber(project.path())
        .args(["--log-level", "loud", "steps", "features"])
        .output()
        .expect("runs");
    assert!(!output.status.success());
}
