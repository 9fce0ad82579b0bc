//! Change list parsing
//!
//! Input is the output of `git diff --name-status`: one `<status>\t<path>` line
//! per changed file. A blank line (or the end of input) terminates the list.

use crate::core::error::ChangeFormatError;

/// A single changed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeInfo {
  /// Repository-relative file path
  pub path: String,
  /// Whether the file was removed
  pub is_deleted: bool,
}

#[cfg(test)]
impl ChangeInfo {
  pub fn modified(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      is_deleted: false,
    }
  }

  pub fn deleted(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      is_deleted: true,
    }
  }
}

/// Parse a name-status report into change records, in input order.
///
/// Any malformed line rejects the whole report; there are no partial results.
pub fn parse_changes(content: &str) -> Result<Vec<ChangeInfo>, ChangeFormatError> {
  let mut result = Vec::new();

  for raw in content.split('\n') {
    let line = raw.strip_suffix('\r').unwrap_or(raw);
    if line.is_empty() {
      break;
    }

    if !is_valid_change(line) {
      return Err(ChangeFormatError { line: line.to_string() });
    }

    let path = line[2..].trim_matches(' ');
    if path.is_empty() {
      return Err(ChangeFormatError { line: line.to_string() });
    }

    result.push(ChangeInfo {
      path: path.to_string(),
      is_deleted: line.as_bytes()[0] == b'D',
    });
  }

  Ok(result)
}

fn is_valid_change(line: &str) -> bool {
  let bytes = line.as_bytes();
  bytes.len() >= 3 && !bytes[0].is_ascii_digit() && bytes[1] == b'\t'
}
