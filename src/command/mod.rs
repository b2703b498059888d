//! Command surface
//!
//! `clearlag [reload|status]` -> ClearlagCommand -> CommandExecutor -> replies

pub mod executor;
pub mod parser;

pub use executor::{CommandExecutor, ExecutionResult};
pub use parser::{parse_command, ClearlagCommand, CommandSender};
