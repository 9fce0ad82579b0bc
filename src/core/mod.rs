//! Core building blocks shared by all commands
//!
//! - **config**: bevaluate.toml parsing and validation
//! - **error**: Error types with contextual help messages and exit codes
//! - **vcs**: Git operations (SystemGit)

pub mod config;
pub mod error;
pub mod vcs;
