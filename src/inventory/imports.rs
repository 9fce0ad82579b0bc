//! Import header scanning
//!
//! Parses a Go source file with tree-sitter and reads the package clause and
//! the import declarations that follow it. Reading stops at the first
//! top-level node that is not an import, so errors in the rest of the file
//! never matter.
//!
//! ```text
//! package name
//! import "a"
//! import alias "b"
//! import (
//!     "c"
//!     _ "d"
//!     . "e"
//! )
//! ```

use tree_sitter::{Node, Parser};

/// Import paths declared in the header of a Go source file, in source order.
///
/// Fails when the file does not start with a well-formed package clause or
/// when an import declaration is malformed.
pub fn scan_imports(src: &str) -> Result<Vec<String>, String> {
  let mut parser = Parser::new();
  let language: tree_sitter::Language = tree_sitter_go::LANGUAGE.into();
  parser
    .set_language(&language)
    .map_err(|e| format!("could not load Go grammar: {}", e))?;
  let tree = parser
    .parse(src, None)
    .ok_or_else(|| "failed to parse source".to_string())?;

  let root = tree.root_node();
  let mut cursor = root.walk();
  let mut header = root.named_children(&mut cursor).filter(|node| node.kind() != "comment");

  match header.next() {
    Some(node) if node.kind() == "package_clause" && !node.has_error() => {}
    _ => return Err("expected 'package' clause".to_string()),
  }

  let mut imports = Vec::new();
  for node in header {
    match node.kind() {
      "import_declaration" if !node.has_error() => import_declaration(node, src, &mut imports)?,
      "import_declaration" => return Err(format!("malformed import declaration at line {}", line(node))),
      // Nothing parsed between the imports and this node, so it cannot be told apart from the header
      _ if node.is_error() => return Err(format!("syntax error at line {}", line(node))),
      _ => break,
    }
  }

  Ok(imports)
}

/// Collect the paths of a single spec or a parenthesized spec list
fn import_declaration(node: Node<'_>, src: &str, imports: &mut Vec<String>) -> Result<(), String> {
  let mut cursor = node.walk();
  for child in node.named_children(&mut cursor) {
    match child.kind() {
      "import_spec" => imports.push(import_path(child, src)?),
      "import_spec_list" => {
        let mut list_cursor = child.walk();
        for spec in child.named_children(&mut list_cursor) {
          if spec.kind() == "import_spec" {
            imports.push(import_path(spec, src)?);
          }
        }
      }
      _ => {}
    }
  }
  Ok(())
}

/// The unquoted `path` of an import spec
fn import_path(spec: Node<'_>, src: &str) -> Result<String, String> {
  let node = spec
    .child_by_field_name("path")
    .ok_or_else(|| format!("import without path at line {}", line(spec)))?;
  let literal = &src[node.byte_range()];

  let path = match node.kind() {
    "raw_string_literal" => literal.trim_matches('`').to_string(),
    // Go and JSON share the escapes that can appear in an import path
    "interpreted_string_literal" => serde_json::from_str::<String>(literal)
      .map_err(|e| format!("invalid import path {} at line {}: {}", literal, line(node), e))?,
    other => return Err(format!("expected import path, found {} at line {}", other, line(node))),
  };

  if path.is_empty() {
    return Err(format!("empty import path at line {}", line(node)));
  }
  Ok(path)
}

fn line(node: Node<'_>) -> usize {
  node.start_position().row + 1
}
