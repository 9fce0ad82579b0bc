//! Tests for the `init` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_init_creates_config() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  run_bevaluate(&workspace.path, &["init"])?;

  assert!(workspace.file_exists("bevaluate.toml"));
  let config = workspace.read_file("bevaluate.toml")?;
  assert!(config.contains("[packages]"));
  assert!(config.contains("deployments_dir = \"cmd/\""));
  assert!(config.contains("go.mod"));

  Ok(())
}

#[test]
fn test_init_refuses_to_overwrite() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file("bevaluate.toml", "[evaluations]\ndeployments_dir = \"services/\"\n")?;

  let output = run_bevaluate_raw(&workspace.path, &["init"])?;

  assert_eq!(output.status.code(), Some(3));
  assert!(workspace.read_file("bevaluate.toml")?.contains("services/"));

  Ok(())
}

#[test]
fn test_init_then_run() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.add_package("cmd/svc", &["svc"], false)?;
  workspace.add_package("svc", &[], true)?;

  run_bevaluate(&workspace.path, &["init"])?;
  run_bevaluate(&workspace.path, &["run", "--changes", "M\tsvc/svc.go"])?;

  assert_eq!(workspace.read_lines("retest.out")?, sorted(&["svc"]));
  assert_eq!(workspace.read_lines("redeploy.out")?, sorted(&["cmd/svc"]));

  Ok(())
}
