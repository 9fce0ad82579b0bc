//! Package inventory
//!
//! Walks the source tree and records, for every directory holding Go source
//! files, which other internal packages it imports and whether it has tests.
//!
//! - **imports**: import header scanner (package clause + import declarations)
//! - **module**: module identifier lookup from go.mod
//! - **package_reader**: concurrent per-subtree walk producing [`PackageInfo`]s

pub mod imports;
pub mod module;
pub mod package_reader;

pub use module::read_module_name;
pub use package_reader::{InventoryConfig, PackageReader};

use std::collections::BTreeSet;

/// Extension of recognized source files
pub const SOURCE_EXTENSION: &str = ".go";

/// Suffix of test source files
pub const TEST_SUFFIX: &str = "_test.go";

/// Import that marks a test file as actually containing tests
pub const TEST_PACKAGE: &str = "testing";

/// File declaring the module identifier, at the repository root
pub const MODULE_FILE: &str = "go.mod";

/// A package: a directory with at least one source file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageInfo {
  /// Repository-relative directory, `/`-separated
  pub path: String,
  /// Internal packages imported by this package's files (never itself)
  pub dependencies: BTreeSet<String>,
  /// Whether a test file imports the testing package
  pub contains_tests: bool,
}

/// Builders for test inventories
#[cfg(test)]
impl PackageInfo {
  pub fn new(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      ..Default::default()
    }
  }

  pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.dependencies.extend(dependencies.into_iter().map(Into::into));
    self
  }

  pub fn with_tests(mut self) -> Self {
    self.contains_tests = true;
    self
  }
}

/// True for recognized source files, test files included
pub fn is_source_file(path: &str) -> bool {
  path.ends_with(SOURCE_EXTENSION)
}

/// True for test source files
pub fn is_test_file(path: &str) -> bool {
  path.ends_with(TEST_SUFFIX)
}
