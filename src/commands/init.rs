//! `bevaluate init` - Write the default configuration

use crate::core::config::BevaluateConfig;
use crate::core::error::{BevalResult, ConfigError};
use std::path::Path;

/// Write a default bevaluate.toml under `root`, refusing to overwrite one
pub fn run_init(root: &Path) -> BevalResult<()> {
  let config_path = BevaluateConfig::config_path(root);
  if BevaluateConfig::exists(root) {
    return Err(ConfigError::AlreadyExists { path: config_path }.into());
  }

  BevaluateConfig::default().save(root)?;
  tracing::debug!(path = %config_path.display(), "wrote default config");

  println!("✅ Created {}", config_path.display());
  Ok(())
}
