use crate::core::error::{BevalError, BevalResult, ConfigError, ResultExt};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file, looked up at the repository root
pub const CONFIG_FILE: &str = "bevaluate.toml";

/// Configuration for bevaluate
///
/// Every section is optional; a missing file or section falls back to the defaults
/// below, so an empty `bevaluate.toml` behaves like no file at all.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BevaluateConfig {
  #[serde(default)]
  pub packages: PackagesConfig,
  #[serde(default)]
  pub evaluations: EvaluationsConfig,
}

/// How the package inventory walks the tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagesConfig {
  /// Directory patterns (regex) skipped during the walk, matched against
  /// repository-relative paths
  #[serde(default = "default_ignored_dirs")]
  pub ignored_dirs: Vec<String>,
}

fn default_ignored_dirs() -> Vec<String> {
  vec!["build$".to_string(), "vendor$".to_string(), ".*/mocks$".to_string()]
}

impl Default for PackagesConfig {
  fn default() -> Self {
    Self {
      ignored_dirs: default_ignored_dirs(),
    }
  }
}

/// How changes are evaluated and where results go
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationsConfig {
  /// Packages under this prefix are deployment-eligible (e.g. "cmd/")
  #[serde(default = "default_deployments_dir")]
  pub deployments_dir: String,

  /// Output file for packages to retest
  #[serde(default = "default_retest_out")]
  pub retest_out: PathBuf,

  /// Output file for packages to redeploy
  #[serde(default = "default_redeploy_out")]
  pub redeploy_out: PathBuf,

  #[serde(default)]
  pub special_cases: SpecialCasesConfig,
}

fn default_deployments_dir() -> String {
  "cmd/".to_string()
}

fn default_retest_out() -> PathBuf {
  PathBuf::from("retest.out")
}

fn default_redeploy_out() -> PathBuf {
  PathBuf::from("redeploy.out")
}

impl Default for EvaluationsConfig {
  fn default() -> Self {
    Self {
      deployments_dir: default_deployments_dir(),
      retest_out: default_retest_out(),
      redeploy_out: default_redeploy_out(),
      special_cases: SpecialCasesConfig::default(),
    }
  }
}

/// Change paths that bypass graph propagation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialCasesConfig {
  /// Any match retests every test-bearing package
  #[serde(default)]
  pub retest: Vec<String>,

  /// Any match retests and redeploys everything and ends the evaluation
  #[serde(default = "default_full_scale")]
  pub full_scale: Vec<String>,
}

fn default_full_scale() -> Vec<String> {
  vec!["go.mod".to_string()]
}

impl Default for SpecialCasesConfig {
  fn default() -> Self {
    Self {
      retest: Vec::new(),
      full_scale: default_full_scale(),
    }
  }
}

impl BevaluateConfig {
  /// Path of the config file under a repository root
  pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
  }

  /// Check if config exists at the given root
  pub fn exists(root: &Path) -> bool {
    Self::config_path(root).exists()
  }

  /// Load config from bevaluate.toml, or the defaults when there is none
  pub fn load(root: &Path) -> BevalResult<Self> {
    let config_path = Self::config_path(root);
    if !config_path.exists() {
      tracing::debug!(path = %config_path.display(), "no config file, using defaults");
      return Ok(Self::default());
    }

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content).map_err(|e| ConfigError::Malformed {
      path: config_path.clone(),
      reason: e.to_string(),
    })?;

    config
      .validate()
      .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    tracing::debug!(path = %config_path.display(), "loaded config");
    Ok(config)
  }

  /// Parse config from TOML text without validating patterns
  pub fn parse(content: &str) -> Result<Self, toml_edit::de::Error> {
    toml_edit::de::from_str(content)
  }

  /// Save config to bevaluate.toml under `root`
  pub fn save(&self, root: &Path) -> BevalResult<()> {
    let config_path = Self::config_path(root);
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(())
  }

  /// Validate that every pattern compiles
  pub fn validate(&self) -> BevalResult<()> {
    compile_patterns("packages.ignored_dirs", &self.packages.ignored_dirs)?;
    compile_patterns(
      "evaluations.special_cases.retest",
      &self.evaluations.special_cases.retest,
    )?;
    compile_patterns(
      "evaluations.special_cases.full_scale",
      &self.evaluations.special_cases.full_scale,
    )?;
    Ok(())
  }
}

/// Compile an ordered list of patterns, naming the config field on failure
pub fn compile_patterns<S: AsRef<str>>(field: &str, patterns: &[S]) -> BevalResult<Vec<Regex>> {
  patterns
    .iter()
    .map(|pattern| {
      Regex::new(pattern.as_ref()).map_err(|e| {
        BevalError::from(ConfigError::InvalidPattern {
          field: field.to_string(),
          pattern: pattern.as_ref().to_string(),
          reason: e.to_string(),
        })
      })
    })
    .collect()
}
