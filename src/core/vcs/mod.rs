//! Change collection from the local git checkout

pub mod system_git;

pub use system_git::SystemGit;
