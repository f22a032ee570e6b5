use async_trait::async_trait;
use selfbot_core::{Message, MessageService};
use tracing::info;

use crate::context::BotContext;
use crate::error::CommandError;
use crate::history::{walk, MessageAction, MessageCursor, Outcome};
use crate::pins::PinCache;
use crate::router::{Command, Invocation};

const DEFAULT_COUNT: usize = 50;

/// Unpins messages in the channel, oldest pin first, caching them for
/// `restorepins`.
pub struct ClearPinsCommand;

/// Re-pins everything `clearpins` removed in this channel.
pub struct RestorePinsCommand;

struct UnpinAndCache<'a> {
    service: &'a dyn MessageService,
    cache: &'a PinCache,
}

#[async_trait]
impl MessageAction for UnpinAndCache<'_> {
    async fn apply(&self, message: &Message) -> Outcome {
        match self.cache.unpin(self.service, message).await {
            Ok(()) => Outcome::Done,
            Err(e) => Outcome::Failed(e),
        }
    }
}

#[async_trait]
impl Command for ClearPinsCommand {
    fn name(&self) -> &'static str {
        "clearpins"
    }

    fn usage(&self) -> &'static str {
        "clearpins [count=50]"
    }

    fn description(&self) -> &'static str {
        "unpin messages, oldest first (undo with restorepins)"
    }

    async fn run(&self, bot: &BotContext, inv: &Invocation<'_>) -> Result<(), CommandError> {
        let count = super::count_arg(inv.args, DEFAULT_COUNT)?;
        let channel = inv.message.channel_id;

        let action = UnpinAndCache {
            service: bot.service.as_ref(),
            cache: &bot.pins,
        };
        let mut cursor = MessageCursor::pinned(bot.service.as_ref(), channel);
        let report = walk(&mut cursor, count, &action).await?;

        info!(channel_id = %channel, unpinned = report.processed, failed = report.failed, "clearpins finished");
        bot.notifier
            .info(
                channel,
                &format!("Unpinned {} messages", report.processed),
                true,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Command for RestorePinsCommand {
    fn name(&self) -> &'static str {
        "restorepins"
    }

    fn usage(&self) -> &'static str {
        "restorepins"
    }

    fn description(&self) -> &'static str {
        "re-pin the messages clearpins removed here"
    }

    async fn run(&self, bot: &BotContext, inv: &Invocation<'_>) -> Result<(), CommandError> {
        let channel = inv.message.channel_id;
        let restored = bot.pins.restore(bot.service.as_ref(), channel).await?;

        info!(channel_id = %channel, restored, "restorepins finished");
        bot.notifier
            .info(channel, &format!("Restored {restored} pins"), true)
            .await?;
        Ok(())
    }
}
