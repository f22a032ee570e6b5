//! Built-in commands.

mod clear;
mod delete;
mod help;
mod pins;
mod react;

pub use clear::{line_chunks, max_lines_per_chunk, ClearCommand, SEPARATOR};
pub use delete::DeleteCommand;
pub use help::HelpCommand;
pub use pins::{ClearPinsCommand, RestorePinsCommand};
pub use react::{emoji_candidates, pick_reactions, ReactCommand};

use crate::error::CommandError;
use crate::router::CommandRegistry;

/// Registry with every built-in command.
pub fn registry() -> CommandRegistry {
    CommandRegistry::new()
        .with(ClearPinsCommand)
        .with(RestorePinsCommand)
        .with(ClearCommand)
        .with(ReactCommand)
        .with(DeleteCommand)
        .with(HelpCommand)
}

/// First argument as a count; missing or zero means `default`.
fn count_arg(args: &[String], default: usize) -> Result<usize, CommandError> {
    let Some(raw) = args.first() else {
        return Ok(default);
    };
    match raw.parse::<usize>() {
        Ok(0) => Ok(default),
        Ok(n) => Ok(n),
        Err(_) => Err(CommandError::User(format!("{raw} is not a valid number"))),
    }
}
