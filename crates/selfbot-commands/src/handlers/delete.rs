use async_trait::async_trait;
use selfbot_core::{Message, MessageService, UserId};
use tracing::info;

use crate::context::BotContext;
use crate::error::CommandError;
use crate::history::{walk, MessageAction, MessageCursor, Outcome};
use crate::router::{Command, Invocation};

const DEFAULT_COUNT: usize = 1;

/// Deletes our own most recent messages in the channel.
pub struct DeleteCommand;

struct DeleteOwn<'a> {
    service: &'a dyn MessageService,
    me: UserId,
}

#[async_trait]
impl MessageAction for DeleteOwn<'_> {
    async fn apply(&self, message: &Message) -> Outcome {
        if message.author_id != self.me {
            return Outcome::Skipped;
        }
        match self
            .service
            .delete_message(message.channel_id, message.id)
            .await
        {
            Ok(()) => Outcome::Done,
            Err(e) => Outcome::Failed(e),
        }
    }
}

#[async_trait]
impl Command for DeleteCommand {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn usage(&self) -> &'static str {
        "delete [count=1]"
    }

    fn description(&self) -> &'static str {
        "delete your most recent messages in this channel"
    }

    async fn run(&self, bot: &BotContext, inv: &Invocation<'_>) -> Result<(), CommandError> {
        let count = super::count_arg(inv.args, DEFAULT_COUNT)?;
        let channel = inv.message.channel_id;

        let action = DeleteOwn {
            service: bot.service.as_ref(),
            me: bot.me.id,
        };
        let mut cursor = MessageCursor::history(bot.service.as_ref(), channel);
        let report = walk(&mut cursor, count, &action).await?;

        info!(
            channel_id = %channel,
            deleted = report.processed,
            requested = count,
            failed = report.failed,
            "delete finished"
        );

        if report.fell_short() {
            bot.notifier
                .info(
                    channel,
                    &format!("Deleted {} of {} messages", report.processed, count),
                    true,
                )
                .await?;
        }
        Ok(())
    }
}
