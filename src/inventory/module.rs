//! Module identifier lookup

use crate::core::error::{BevalError, BevalResult, InventoryError};
use crate::storage::FileOpener;
use std::io::Read;
use std::path::Path;

/// Read the module path declared by the `module` directive of a go.mod file
pub fn read_module_name(path: &Path, opener: &dyn FileOpener) -> BevalResult<String> {
  let mut content = String::new();
  opener
    .open_read(path)
    .and_then(|mut file| file.read_to_string(&mut content))
    .map_err(|source| InventoryError::ReadFile {
      path: path.to_path_buf(),
      source,
    })?;

  parse_module_directive(&content).ok_or_else(|| {
    BevalError::from(InventoryError::ModuleName {
      path: path.to_path_buf(),
      reason: "no module directive".to_string(),
    })
  })
}

fn parse_module_directive(content: &str) -> Option<String> {
  content.lines().find_map(|line| {
    let rest = line.trim().strip_prefix("module")?;
    if !rest.starts_with([' ', '\t']) {
      return None;
    }

    let rest = rest.split("//").next().unwrap_or_default().trim();
    let name = rest.trim_matches(|c| c == '"' || c == '`');
    (!name.is_empty()).then(|| name.to_string())
  })
}
