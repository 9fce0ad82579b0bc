//! Tests for `run --since`, collecting changes from git

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_run_since_ref() -> Result<()> {
  if !git_available() {
    eprintln!("git not available, skipping");
    return Ok(());
  }

  let workspace = TestWorkspace::new()?;
  workspace.add_package("cmd/api", &["api"], false)?;
  workspace.add_package("api", &["store"], true)?;
  workspace.add_package("store", &[], true)?;
  workspace.add_package("other", &[], true)?;
  workspace.init_git()?;
  let head = git(&workspace.path, &["rev-parse", "HEAD"])?;
  let base = String::from_utf8_lossy(&head.stdout).trim().to_string();

  workspace.write_file("store/store.go", "package store\n\nfunc Changed() {}\n")?;
  workspace.commit("Change store")?;

  run_bevaluate(&workspace.path, &["run", "--since", &base])?;

  assert_eq!(workspace.read_lines("retest.out")?, sorted(&["api", "store"]));
  assert_eq!(workspace.read_lines("redeploy.out")?, sorted(&["cmd/api"]));

  Ok(())
}

#[test]
fn test_run_since_outside_repository() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  let output = run_bevaluate_raw(&workspace.path, &["run", "--since", "main"])?;

  assert_eq!(output.status.code(), Some(5));

  Ok(())
}

#[test]
fn test_run_since_in_module_subdirectory() -> Result<()> {
  if !git_available() {
    eprintln!("git not available, skipping");
    return Ok(());
  }

  // The repository root holds the module under svc/
  let workspace = TestWorkspace::new()?;
  std::fs::remove_file(workspace.path.join("go.mod"))?;
  workspace.write_file("svc/go.mod", &format!("module {}\n\ngo 1.22\n", MODULE))?;
  workspace.add_package("svc/cmd/api", &["api"], false)?;
  workspace.add_package("svc/api", &[], true)?;
  workspace.write_file("README.md", "# monorepo\n")?;
  workspace.init_git()?;

  workspace.write_file("svc/api/api.go", "package api\n\nfunc Changed() {}\n")?;
  workspace.write_file("README.md", "# monorepo\n\nchanged\n")?;

  let module_dir = workspace.path.join("svc");
  run_bevaluate(&module_dir, &["run", "--since", "HEAD"])?;

  assert_eq!(workspace.read_lines("svc/retest.out")?, sorted(&["api"]));
  assert_eq!(workspace.read_lines("svc/redeploy.out")?, sorted(&["cmd/api"]));

  Ok(())
}
