//! Concurrent package inventory
//!
//! Each top-level directory of the repository is an independent subtree, walked
//! by its own rayon task with an explicit directory stack. The orchestrator
//! collects exactly one outcome per task and returns the first failure it sees
//! without waiting for the rest; late results are dropped on the floor.

use super::imports::scan_imports;
use super::{PackageInfo, TEST_PACKAGE, is_source_file, is_test_file};
use crate::core::config::compile_patterns;
use crate::core::error::{BevalError, BevalResult, InventoryError, ResultExt};
use crate::storage::{DirReader, FileOpener};
use regex::Regex;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;

/// Directories excluded from the walk
#[derive(Debug, Clone, Default)]
pub struct InventoryConfig {
  ignored_dirs: Vec<Regex>,
}

impl InventoryConfig {
  /// Compile ignored-directory patterns; an invalid pattern is a config error
  pub fn new<S: AsRef<str>>(ignored_dirs: &[S]) -> BevalResult<Self> {
    Ok(Self {
      ignored_dirs: compile_patterns("packages.ignored_dirs", ignored_dirs)?,
    })
  }

  /// Whether a repository-relative directory path is ignored
  pub fn is_ignored(&self, path: &str) -> bool {
    self.ignored_dirs.iter().any(|exp| exp.is_match(path))
  }
}

/// Builds the package inventory of a repository
pub struct PackageReader<D: ?Sized, F: ?Sized> {
  dir_reader: Arc<D>,
  file_opener: Arc<F>,
  config: Arc<InventoryConfig>,
}

impl<D: ?Sized, F: ?Sized> Clone for PackageReader<D, F> {
  fn clone(&self) -> Self {
    Self {
      dir_reader: Arc::clone(&self.dir_reader),
      file_opener: Arc::clone(&self.file_opener),
      config: Arc::clone(&self.config),
    }
  }
}

type SubtreeOutcome = (usize, BevalResult<Vec<PackageInfo>>);

impl<D, F> PackageReader<D, F>
where
  D: DirReader + ?Sized + 'static,
  F: FileOpener + ?Sized + 'static,
{
  pub fn new(dir_reader: Arc<D>, file_opener: Arc<F>, config: InventoryConfig) -> Self {
    Self {
      dir_reader,
      file_opener,
      config: Arc::new(config),
    }
  }

  /// Read every package below `root`.
  ///
  /// `module_name` is the import prefix that marks a dependency as internal.
  /// Packages are returned grouped by top-level subtree, in listing order, and
  /// in walk order within a subtree.
  pub fn read_packages(&self, root: &Path, module_name: &str) -> BevalResult<Vec<PackageInfo>> {
    let entries = self
      .dir_reader
      .read_dir(root)
      .map_err(|source| InventoryError::ReadDir {
        path: root.to_path_buf(),
        source,
      })
      .context("could not read root directory")?;

    let subtrees: Vec<String> = entries
      .into_iter()
      .filter(|entry| entry.is_dir && !self.config.is_ignored(&entry.name))
      .map(|entry| entry.name)
      .collect();

    tracing::debug!(root = %root.display(), subtrees = subtrees.len(), "reading packages");

    let packages = self.read_subtrees(root, module_name, &subtrees)?;

    tracing::info!(packages = packages.len(), "package inventory complete");
    Ok(packages)
  }

  fn read_subtrees(&self, root: &Path, module_name: &str, subtrees: &[String]) -> BevalResult<Vec<PackageInfo>> {
    let (tx, rx) = mpsc::channel::<SubtreeOutcome>();
    let root = Arc::new(root.to_path_buf());
    let module_name: Arc<str> = Arc::from(module_name);

    for (index, subtree) in subtrees.iter().enumerate() {
      let reader = self.clone();
      let tx = tx.clone();
      let root = Arc::clone(&root);
      let module_name = Arc::clone(&module_name);
      let subtree = subtree.clone();

      rayon::spawn(move || {
        let outcome = reader
          .read_subtree(&root, &module_name, &subtree)
          .with_context(|| format!("could not read subtree {:?}", subtree));
        // The receiver is gone once another subtree has failed.
        let _ = tx.send((index, outcome));
      });
    }
    drop(tx);

    let mut slots: Vec<Option<Vec<PackageInfo>>> = subtrees.iter().map(|_| None).collect();
    for _ in 0..subtrees.len() {
      let (index, outcome) = rx
        .recv()
        .map_err(|_| BevalError::message("inventory task exited without reporting a result"))?;

      match outcome {
        Ok(packages) => slots[index] = Some(packages),
        Err(err) => {
          tracing::debug!(subtree = %subtrees[index], "aborting inventory on first failure");
          return Err(err);
        }
      }
    }

    Ok(slots.into_iter().flatten().flatten().collect())
  }

  /// Walk one subtree with an explicit stack
  fn read_subtree(&self, root: &Path, module_name: &str, subtree: &str) -> BevalResult<Vec<PackageInfo>> {
    let mut stack = vec![subtree.to_string()];
    let mut packages = Vec::new();

    while let Some(dir) = stack.pop() {
      let dir_path = root.join(&dir);
      let entries = self
        .dir_reader
        .read_dir(&dir_path)
        .map_err(|source| InventoryError::ReadDir { path: dir_path, source })?;

      let mut source_files = Vec::new();
      for entry in entries {
        let entry_path = format!("{}/{}", dir, entry.name);
        if entry.is_dir {
          if self.config.is_ignored(&entry_path) {
            tracing::trace!(dir = %entry_path, "ignored");
          } else {
            stack.push(entry_path);
          }
          continue;
        }

        if is_source_file(&entry_path) {
          source_files.push(entry_path);
        }
      }

      if source_files.is_empty() {
        continue;
      }

      packages.push(self.read_package(root, &dir, module_name, &source_files)?);
    }

    Ok(packages)
  }

  fn read_package(&self, root: &Path, dir: &str, module_name: &str, source_files: &[String]) -> BevalResult<PackageInfo> {
    let mut dependencies = BTreeSet::new();
    let mut contains_tests = false;

    for file in source_files {
      let is_test = is_test_file(file);

      for import in self.read_imports(&root.join(file))? {
        if is_test && import == TEST_PACKAGE {
          contains_tests = true;
          continue;
        }

        let Some(dependency) = internal_path(module_name, &import) else {
          continue;
        };
        if dependency == dir {
          continue;
        }

        dependencies.insert(dependency.to_string());
      }
    }

    tracing::debug!(
      package = dir,
      dependencies = dependencies.len(),
      contains_tests,
      "read package"
    );

    Ok(PackageInfo {
      path: dir.to_string(),
      dependencies,
      contains_tests,
    })
  }

  fn read_imports(&self, path: &Path) -> BevalResult<Vec<String>> {
    let mut data = Vec::new();
    self
      .file_opener
      .open_read(path)
      .and_then(|mut file| file.read_to_end(&mut data))
      .map_err(|source| InventoryError::ReadFile {
        path: path.to_path_buf(),
        source,
      })?;

    let imports = scan_imports(&String::from_utf8_lossy(&data)).map_err(|reason| InventoryError::ParseImports {
      path: PathBuf::from(path),
      reason,
    })?;
    Ok(imports)
  }
}

/// Repository-relative path of an internal import, `None` for external ones.
///
/// The module root itself is never a package (root-level files are not
/// inventoried), so importing it yields `None` as well.
fn internal_path<'a>(module_name: &str, import: &'a str) -> Option<&'a str> {
  import
    .strip_prefix(module_name)?
    .strip_prefix('/')
    .filter(|rest| !rest.is_empty())
}
