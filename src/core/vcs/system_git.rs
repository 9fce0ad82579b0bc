//! System git backend
//!
//! Shells out to the `git` binary with an isolated environment. The only query
//! bevaluate needs is the name-status diff against a reference, which is fed
//! verbatim into the change parser.

use crate::core::error::{BevalError, BevalResult, GitError, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git
pub struct SystemGit {
  /// Directory git runs in; diff paths are relative to it
  pub(crate) repo_path: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  pub fn open(path: &Path) -> BevalResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(BevalError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(BevalError::Git(GitError::CommandFailed {
        command: "git rev-parse --show-toplevel".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    Ok(Self {
      repo_path: path.to_path_buf(),
    })
  }

  /// Name-status diff of the working tree against `since`
  ///
  /// Renames are disabled so every entry is a single `<status>\t<path>` line,
  /// which is the only shape the change parser accepts. Paths are relative to
  /// the directory the backend was opened in, and changes outside it are left
  /// out, so a module below the repository root sees its own paths.
  pub fn diff_name_status(&self, since: &str) -> BevalResult<String> {
    let output = self
      .git_cmd()
      .args(["diff", "--name-status", "--no-renames", "--relative", since, "--"])
      .output()
      .context("Failed to execute git diff")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(BevalError::Git(GitError::CommandFailed {
        command: format!("git diff --name-status {}", since),
        stderr: stderr.to_string(),
      }));
    }

    let diff = String::from_utf8(output.stdout)?;
    tracing::debug!(since, lines = diff.lines().count(), "collected git changes");
    Ok(diff)
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Disables path quoting so non-ASCII paths arrive verbatim
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("core.quotePath=false");

    cmd
  }
}
