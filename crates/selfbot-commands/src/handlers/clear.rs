use async_trait::async_trait;
use selfbot_core::service::MAX_MESSAGE_LEN;
use tracing::debug;

use crate::context::BotContext;
use crate::error::CommandError;
use crate::router::{Command, Invocation};

pub const SEPARATOR: &str = "***";
const DEFAULT_LINES: usize = 60;

/// Pushes the visible chat up by sending messages made of blank lines.
pub struct ClearCommand;

/// Newlines that fit in one message between two separators.
pub fn max_lines_per_chunk(max_len: usize, separator: &str) -> usize {
    max_len.saturating_sub(separator.len() * 2).max(1)
}

/// Newline count of each message needed to send `total` newlines.
///
/// Every chunk is full except the last, which carries the remainder. Chunks
/// are produced on demand, so `total` may be arbitrarily large.
pub fn line_chunks(total: usize, max_len: usize, separator: &str) -> impl Iterator<Item = usize> {
    let per_chunk = max_lines_per_chunk(max_len, separator);
    let mut left = total;
    std::iter::from_fn(move || {
        if left == 0 {
            return None;
        }
        let lines = left.min(per_chunk);
        left -= lines;
        Some(lines)
    })
}

fn payload(lines: usize) -> String {
    format!("{SEPARATOR}{}{SEPARATOR}", "\n".repeat(lines))
}

#[async_trait]
impl Command for ClearCommand {
    fn name(&self) -> &'static str {
        "clear"
    }

    fn usage(&self) -> &'static str {
        "clear [lines=60]"
    }

    fn description(&self) -> &'static str {
        "scroll the chat away with blank lines"
    }

    async fn run(&self, bot: &BotContext, inv: &Invocation<'_>) -> Result<(), CommandError> {
        let total = super::count_arg(inv.args, DEFAULT_LINES)?;
        let channel = inv.message.channel_id;

        for lines in line_chunks(total, MAX_MESSAGE_LEN, SEPARATOR) {
            bot.service.send_message(channel, &payload(lines)).await?;
            debug!(channel_id = %channel, lines, "sent clear chunk");
        }
        Ok(())
    }
}
