use async_trait::async_trait;

use crate::context::BotContext;
use crate::error::CommandError;
use crate::router::{Command, Invocation};

/// Lists the registered commands.
pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn usage(&self) -> &'static str {
        "help"
    }

    fn description(&self) -> &'static str {
        "list available commands"
    }

    async fn run(&self, bot: &BotContext, inv: &Invocation<'_>) -> Result<(), CommandError> {
        let listing = inv
            .commands
            .iter()
            .map(|c| format!("`{}` {}", c.usage(), c.description()))
            .collect::<Vec<_>>()
            .join("\n");

        bot.notifier
            .info(inv.message.channel_id, &listing, true)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::registry;
    use crate::notify::INFO_TITLE;
    use crate::testing::{context, MemoryService, CHANNEL, ME};

    #[tokio::test]
    async fn lists_every_command() {
        let service = MemoryService::new();
        let trigger = service.push(CHANNEL, ME, ".help");
        let bot = context(&service);

        registry().run(&bot, "help", &[], &trigger).await.unwrap();

        let notices = service.notices();
        let notice = &notices[0];
        assert_eq!(notice.title, INFO_TITLE);
        assert_eq!(notice.body.lines().count(), 6);
        assert!(notice.body.contains("`delete [count=1]`"));
        assert!(notice.body.contains("`clearpins [count=50]`"));
    }
}
