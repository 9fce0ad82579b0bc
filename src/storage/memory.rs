//! In-memory tree for exercising the inventory walk without touching disk

use super::{DirEntry, DirReader, FileOpener};
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct MemoryStore {
  dirs: HashMap<PathBuf, BTreeMap<String, bool>>,
  files: HashMap<PathBuf, String>,
  fail_read_dir: bool,
  fail_open: bool,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register an empty directory and all of its ancestors
  pub fn dir(mut self, path: impl AsRef<Path>) -> Self {
    self.register(path.as_ref(), true);
    self
  }

  /// Register a file with content and all of its ancestors
  pub fn file(mut self, path: impl AsRef<Path>, content: &str) -> Self {
    let path = path.as_ref();
    self.register(path, false);
    self.files.insert(path.to_path_buf(), content.to_string());
    self
  }

  pub fn failing_read_dir(mut self) -> Self {
    self.fail_read_dir = true;
    self
  }

  pub fn failing_open(mut self) -> Self {
    self.fail_open = true;
    self
  }

  fn register(&mut self, path: &Path, is_dir: bool) {
    if is_dir {
      self.dirs.entry(path.to_path_buf()).or_default();
    }

    let mut child = path;
    let mut child_is_dir = is_dir;
    while let Some(parent) = child.parent() {
      let Some(name) = child.file_name() else { break };
      self
        .dirs
        .entry(parent.to_path_buf())
        .or_default()
        .insert(name.to_string_lossy().into_owned(), child_is_dir);
      child = parent;
      child_is_dir = true;
    }
  }
}

impl DirReader for MemoryStore {
  fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
    if self.fail_read_dir {
      return Err(io::Error::other("kaboom"));
    }

    let entries = self
      .dirs
      .get(path)
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such dir: {}", path.display())))?;

    Ok(
      entries
        .iter()
        .map(|(name, is_dir)| DirEntry {
          name: name.clone(),
          is_dir: *is_dir,
        })
        .collect(),
    )
  }
}

impl FileOpener for MemoryStore {
  fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
    if self.fail_open {
      return Err(io::Error::other("kaboom"));
    }

    let content = self
      .files
      .get(path)
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such file: {}", path.display())))?;

    Ok(Box::new(Cursor::new(content.clone().into_bytes())))
  }
}
