//! CLI commands for bevaluate
//!
//! - **run**: Evaluate a change list and write the retest/redeploy lists
//! - **init**: Write the default bevaluate.toml

pub mod init;
pub mod run;

pub use init::run_init;
pub use run::{ChangeSource, run_evaluate};
