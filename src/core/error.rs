//! Error types for bevaluate with contextual messages and exit codes
//!
//! Every failure mode of a run maps onto one category here. Each category knows
//! its exit code and, where it makes sense, a hint for the user.
//!
//! A changed file with no owning package and no ancestor package is not an
//! error: the evaluator turns it into a full-scale evaluation.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for bevaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// Evaluation or generic failure
  General = 1,
  /// Malformed or unreadable configuration
  Config = 3,
  /// Invalid arguments or change input
  InvalidArgs = 4,
  /// Filesystem, inventory or git failure
  Io = 5,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for bevaluate
#[derive(Debug)]
pub enum BevalError {
  /// Configuration errors
  Config(ConfigError),

  /// Dependency graph and change classification errors
  Graph(GraphError),

  /// Package inventory errors (directory walk, import scanning)
  Inventory(InventoryError),

  /// Malformed change list
  Changes(ChangeFormatError),

  /// Git operation errors
  Git(GitError),

  /// I/O errors
  Io(io::Error),

  /// A categorized error wrapped with additional context
  Context { context: String, source: Box<BevalError> },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl BevalError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    BevalError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      BevalError::Message { message, context, help } => BevalError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      other => BevalError::Context {
        context: ctx_str,
        source: Box::new(other),
      },
    }
  }

  /// The innermost error, with all context layers removed
  #[cfg(test)]
  pub fn root_cause(&self) -> &BevalError {
    let mut current = self;
    while let BevalError::Context { source, .. } = current {
      current = source;
    }
    current
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      BevalError::Config(_) => ExitCode::Config,
      BevalError::Graph(_) => ExitCode::General,
      BevalError::Inventory(_) => ExitCode::Io,
      BevalError::Changes(_) => ExitCode::InvalidArgs,
      BevalError::Git(_) => ExitCode::Io,
      BevalError::Io(_) => ExitCode::Io,
      BevalError::Context { source, .. } => source.exit_code(),
      BevalError::Message { .. } => ExitCode::General,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      BevalError::Config(e) => e.help_message(),
      BevalError::Graph(e) => e.help_message(),
      BevalError::Changes(_) => {
        Some("Changes must be in `git diff --name-status` format: <status><TAB><path> per line.".to_string())
      }
      BevalError::Git(e) => e.help_message(),
      BevalError::Context { source, .. } => source.help_message(),
      BevalError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for BevalError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BevalError::Config(e) => write!(f, "{}", e),
      BevalError::Graph(e) => write!(f, "{}", e),
      BevalError::Inventory(e) => write!(f, "{}", e),
      BevalError::Changes(e) => write!(f, "{}", e),
      BevalError::Git(e) => write!(f, "{}", e),
      BevalError::Io(e) => write!(f, "I/O error: {}", e),
      BevalError::Context { context, source } => write!(f, "{}: {}", context, source),
      BevalError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for BevalError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      BevalError::Io(e) => Some(e),
      BevalError::Inventory(e) => e.io_source().map(|e| e as &(dyn std::error::Error + 'static)),
      BevalError::Context { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for BevalError {
  fn from(err: io::Error) -> Self {
    BevalError::Io(err)
  }
}

impl From<String> for BevalError {
  fn from(msg: String) -> Self {
    BevalError::message(msg)
  }
}

impl From<&str> for BevalError {
  fn from(msg: &str) -> Self {
    BevalError::message(msg)
  }
}

impl From<ConfigError> for BevalError {
  fn from(err: ConfigError) -> Self {
    BevalError::Config(err)
  }
}

impl From<GraphError> for BevalError {
  fn from(err: GraphError) -> Self {
    BevalError::Graph(err)
  }
}

impl From<InventoryError> for BevalError {
  fn from(err: InventoryError) -> Self {
    BevalError::Inventory(err)
  }
}

impl From<ChangeFormatError> for BevalError {
  fn from(err: ChangeFormatError) -> Self {
    BevalError::Changes(err)
  }
}

impl From<GitError> for BevalError {
  fn from(err: GitError) -> Self {
    BevalError::Git(err)
  }
}

impl From<toml_edit::de::Error> for BevalError {
  fn from(err: toml_edit::de::Error) -> Self {
    BevalError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for BevalError {
  fn from(err: toml_edit::ser::Error) -> Self {
    BevalError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for BevalError {
  fn from(err: serde_json::Error) -> Self {
    BevalError::message(format!("JSON error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for BevalError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    BevalError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// A trigger or ignore pattern is not a valid regular expression
  InvalidPattern {
    field: String,
    pattern: String,
    reason: String,
  },

  /// The configuration could not be parsed
  Malformed { path: PathBuf, reason: String },

  /// `init` would overwrite an existing configuration
  AlreadyExists { path: PathBuf },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::InvalidPattern { field, .. } => Some(format!(
        "Entries of `{}` are regular expressions; escape literal characters such as `.` or `[`.",
        field
      )),
      ConfigError::AlreadyExists { path } => Some(format!(
        "Edit {} directly or remove it before running `bevaluate init`.",
        path.display()
      )),
      ConfigError::Malformed { .. } => Some("Run `bevaluate init` in an empty directory to see the expected layout.".to_string()),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::InvalidPattern { field, pattern, reason } => {
        write!(f, "Invalid pattern {:?} in {}: {}", pattern, field, reason)
      }
      ConfigError::Malformed { path, reason } => {
        write!(f, "Could not parse config {}: {}", path.display(), reason)
      }
      ConfigError::AlreadyExists { path } => {
        write!(f, "Config file already exists: {}", path.display())
      }
    }
  }
}

/// Dependency graph and change classification errors
#[derive(Debug)]
pub enum GraphError {
  /// A package declares a dependency on a path with no package
  UnresolvedDependency { dependency: String, dependant: String },

  /// A source file changed in a directory that is not a known package
  MissingPackage { path: String },
}

impl GraphError {
  fn help_message(&self) -> Option<String> {
    match self {
      GraphError::UnresolvedDependency { .. } => {
        Some("Check that the imported directory exists and is not matched by `packages.ignored_dirs`.".to_string())
      }
      GraphError::MissingPackage { .. } => {
        Some("The package inventory is out of date with the change list; make sure both come from the same checkout.".to_string())
      }
    }
  }
}

impl fmt::Display for GraphError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GraphError::UnresolvedDependency { dependency, dependant } => {
        write!(f, "Unresolved dependency {:?} declared by package {:?}", dependency, dependant)
      }
      GraphError::MissingPackage { path } => {
        write!(f, "Missing package at: {:?}", path)
      }
    }
  }
}

/// Package inventory errors
#[derive(Debug)]
pub enum InventoryError {
  /// Listing a directory failed
  ReadDir { path: PathBuf, source: io::Error },

  /// Opening or reading a source file failed
  ReadFile { path: PathBuf, source: io::Error },

  /// A source file's import header could not be scanned
  ParseImports { path: PathBuf, reason: String },

  /// The module identifier could not be determined
  ModuleName { path: PathBuf, reason: String },
}

impl InventoryError {
  fn io_source(&self) -> Option<&io::Error> {
    match self {
      InventoryError::ReadDir { source, .. } | InventoryError::ReadFile { source, .. } => Some(source),
      _ => None,
    }
  }
}

impl fmt::Display for InventoryError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      InventoryError::ReadDir { path, source } => {
        write!(f, "Could not read directory {}: {}", path.display(), source)
      }
      InventoryError::ReadFile { path, source } => {
        write!(f, "Could not read source file {}: {}", path.display(), source)
      }
      InventoryError::ParseImports { path, reason } => {
        write!(f, "Could not parse imports of {}: {}", path.display(), reason)
      }
      InventoryError::ModuleName { path, reason } => {
        write!(f, "Could not read module name from {}: {}", path.display(), reason)
      }
    }
  }
}

/// Malformed change list
#[derive(Debug)]
pub struct ChangeFormatError {
  /// The offending line
  pub line: String,
}

impl fmt::Display for ChangeFormatError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Invalid changes format at line {:?}", self.line)
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Run bevaluate inside a git checkout or pass --changes instead of --since: {}",
        path.display()
      )),
      GitError::CommandFailed { stderr, .. } => {
        if stderr.contains("unknown revision") || stderr.contains("bad revision") {
          Some("The reference passed to --since does not exist locally; fetch it first.".to_string())
        } else {
          None
        }
      }
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
    }
  }
}

/// Result type alias for bevaluate
pub type BevalResult<T> = Result<T, BevalError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> BevalResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> BevalResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<BevalError>,
{
  fn context(self, ctx: impl Into<String>) -> BevalResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> BevalResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &BevalError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
