pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod marker;
pub mod process;
pub mod settle;
pub mod timestamp;
pub mod vcs;

pub use error::{RehearsalError, Result};

#[cfg(test)]
pub mod test_helpers;
