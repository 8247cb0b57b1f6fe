//! CLI argument parsing.

mod args;
mod validators;

pub use args::{Cli, Command, ConfigAction, DirArgs, ResultsAction, WatchArgs};
pub use validators::{parse_confidence, parse_result_prefix};
