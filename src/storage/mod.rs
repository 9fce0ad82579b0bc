//! Filesystem collaborators
//!
//! The inventory builder never touches `std::fs` directly; it goes through
//! [`DirReader`] and [`FileOpener`] so the walk can be exercised against an
//! in-memory tree in tests.

#[cfg(test)]
pub mod memory;

use crate::core::error::{BevalResult, ResultExt};
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
  pub name: String,
  pub is_dir: bool,
}

#[cfg(test)]
impl DirEntry {
  pub fn file(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      is_dir: false,
    }
  }

  pub fn dir(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      is_dir: true,
    }
  }
}

/// Lists the immediate entries of a directory
pub trait DirReader: Send + Sync {
  fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;
}

/// Opens a file for reading
pub trait FileOpener: Send + Sync {
  fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl DirReader for FsStore {
  /// Entries are sorted by name so walks are reproducible across platforms.
  fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path)? {
      let entry = entry?;
      entries.push(DirEntry {
        name: entry.file_name().to_string_lossy().into_owned(),
        is_dir: entry.file_type()?.is_dir(),
      });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
  }
}

impl FileOpener for FsStore {
  fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
    Ok(Box::new(fs::File::open(path)?))
  }
}

/// Write `lines` newline-joined to `path`, creating parent directories
pub fn write_lines(path: &Path, lines: &[String]) -> BevalResult<()> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;
  }

  fs::write(path, lines.join("\n")).with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(())
}
