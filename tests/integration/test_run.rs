//! Tests for the `run` command

use crate::helpers::*;
use anyhow::Result;

/// `cmd/api → api(tests) → dbtype`, `cmd/worker → worker(tests)`, `common(tests)`
fn services() -> Result<TestWorkspace> {
  let workspace = TestWorkspace::new()?;
  workspace.add_package("cmd/api", &["api"], false)?;
  workspace.add_package("cmd/worker", &["worker"], false)?;
  workspace.add_package("api", &["dbtype"], true)?;
  workspace.add_package("worker", &[], true)?;
  workspace.add_package("dbtype", &[], false)?;
  workspace.add_package("common", &[], true)?;
  Ok(workspace)
}

#[test]
fn test_run_propagates_to_dependants() -> Result<()> {
  let workspace = services()?;

  run_bevaluate(&workspace.path, &["run", "--changes", "M\tdbtype/dbtype.go\n"])?;

  assert_eq!(workspace.read_lines("retest.out")?, sorted(&["api"]));
  assert_eq!(workspace.read_lines("redeploy.out")?, sorted(&["cmd/api"]));

  Ok(())
}

#[test]
fn test_run_test_file_change_only_retests() -> Result<()> {
  let workspace = services()?;

  run_bevaluate(&workspace.path, &["run", "--changes", "M\tworker/worker_test.go"])?;

  assert_eq!(workspace.read_lines("retest.out")?, sorted(&["worker"]));
  assert!(workspace.read_lines("redeploy.out")?.is_empty());

  Ok(())
}

#[test]
fn test_run_full_scale_on_go_mod() -> Result<()> {
  let workspace = services()?;

  run_bevaluate(&workspace.path, &["run", "--changes", "M\tgo.mod\nM\tdbtype/dbtype.go\n"])?;

  assert_eq!(workspace.read_lines("retest.out")?, sorted(&["api", "worker", "common"]));
  assert_eq!(workspace.read_lines("redeploy.out")?, sorted(&["cmd/api", "cmd/worker"]));

  Ok(())
}

#[test]
fn test_run_changes_from_file() -> Result<()> {
  let workspace = services()?;
  workspace.write_file("changes.txt", "M\tcommon/common.go\nD\tgone/gone.go\n")?;

  run_bevaluate(&workspace.path, &["run", "--changes", "changes.txt", "--file"])?;

  assert_eq!(workspace.read_lines("retest.out")?, sorted(&["common"]));
  assert!(workspace.read_lines("redeploy.out")?.is_empty());

  Ok(())
}

#[test]
fn test_run_ignored_dirs_are_not_packages() -> Result<()> {
  let workspace = services()?;
  workspace.add_package("api/mocks", &["api"], true)?;
  workspace.add_package("vendor/github.com/x", &[], true)?;

  run_bevaluate(&workspace.path, &["run", "--changes", "M\tapi/api.go"])?;

  assert_eq!(workspace.read_lines("retest.out")?, sorted(&["api"]));
  assert_eq!(workspace.read_lines("redeploy.out")?, sorted(&["cmd/api"]));

  Ok(())
}

#[test]
fn test_run_uses_config() -> Result<()> {
  let workspace = services()?;
  workspace.write_file(
    "bevaluate.toml",
    r#"
[evaluations]
retest_out = "out/retest.txt"
redeploy_out = "out/redeploy.txt"

[evaluations.special_cases]
retest = ["^helm/"]
"#,
  )?;

  run_bevaluate(&workspace.path, &["run", "--changes", "M\thelm/values.yaml"])?;

  assert_eq!(workspace.read_lines("out/retest.txt")?, sorted(&["api", "worker", "common"]));
  assert!(workspace.read_lines("out/redeploy.txt")?.is_empty());
  assert!(!workspace.file_exists("retest.out"));

  Ok(())
}

#[test]
fn test_run_json_output() -> Result<()> {
  let workspace = services()?;

  let output = run_bevaluate(
    &workspace.path,
    &["run", "--changes", "M\tworker/worker.go", "--format", "json"],
  )?;

  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(json["retest"], serde_json::json!(["worker"]));
  assert_eq!(json["redeploy"], serde_json::json!(["cmd/worker"]));
  assert_eq!(json["summary"]["changed_files_count"], 1);

  Ok(())
}

#[test]
fn test_run_dry_run_writes_nothing() -> Result<()> {
  let workspace = services()?;

  let output = run_bevaluate(&workspace.path, &["run", "--changes", "D\tapi/api.go", "--dry-run"])?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("DRY RUN"));
  assert!(stdout.contains("D api/api.go"));
  assert!(!workspace.file_exists("retest.out"));

  Ok(())
}

#[test]
fn test_run_without_changes_writes_nothing() -> Result<()> {
  let workspace = services()?;

  let output = run_bevaluate(&workspace.path, &["run", "--changes", ""])?;

  assert!(String::from_utf8_lossy(&output.stdout).contains("Retest: 0 packages"));
  assert!(!workspace.file_exists("retest.out"));
  assert!(!workspace.file_exists("redeploy.out"));

  Ok(())
}

#[test]
fn test_run_missing_package_fails() -> Result<()> {
  let workspace = services()?;

  let output = run_bevaluate_raw(&workspace.path, &["run", "--changes", "M\tnowhere/new.go"])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Missing package"));
  assert!(stderr.contains("nowhere"));
  assert!(!workspace.file_exists("retest.out"));

  Ok(())
}

#[test]
fn test_run_malformed_changes_exit_code() -> Result<()> {
  let workspace = services()?;

  let output = run_bevaluate_raw(&workspace.path, &["run", "--changes", "baba is you"])?;

  assert_eq!(output.status.code(), Some(4));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid changes format"));

  Ok(())
}

#[test]
fn test_run_invalid_config_exit_code() -> Result<()> {
  let workspace = services()?;
  workspace.write_file("bevaluate.toml", "[packages]\nignored_dirs = [\"[\"]\n")?;

  let output = run_bevaluate_raw(&workspace.path, &["run", "--changes", "M\tapi/api.go"])?;

  assert_eq!(output.status.code(), Some(3));

  Ok(())
}

#[test]
fn test_run_unresolved_import_fails() -> Result<()> {
  let workspace = services()?;
  workspace.add_package("broken", &["does/not/exist"], false)?;

  let output = run_bevaluate_raw(&workspace.path, &["run", "--changes", "M\tapi/api.go"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("does/not/exist"));

  Ok(())
}
