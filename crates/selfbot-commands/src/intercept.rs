//! Entry point for message-create events.
//!
//! Only messages written by the controlling account are looked at. Those
//! that start with the prefix are deleted, dispatched, and any failure is
//! shown as an expiring error notice.

use std::sync::Arc;

use selfbot_core::Message;
use tracing::{debug, error, warn};

use crate::context::BotContext;
use crate::error::CommandError;
use crate::notify::ExpiryHandle;
use crate::router::CommandRegistry;

/// Split `content` into a command name and its arguments.
///
/// Returns `None` unless `content` starts with `prefix` directly followed by
/// something other than a space. Splitting is on single spaces, so runs of
/// spaces produce empty arguments.
pub fn parse_invocation<'a>(prefix: &str, content: &'a str) -> Option<(&'a str, Vec<&'a str>)> {
    let rest = content.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with(' ') {
        return None;
    }

    let mut tokens = rest.split(' ');
    let name = tokens.next()?;
    Some((name, tokens.collect()))
}

pub struct Interceptor {
    bot: Arc<BotContext>,
    commands: Arc<CommandRegistry>,
    prefix: String,
}

impl Interceptor {
    pub fn new(bot: Arc<BotContext>, commands: Arc<CommandRegistry>, prefix: impl Into<String>) -> Self {
        Self {
            bot,
            commands,
            prefix: prefix.into(),
        }
    }

    /// Handle one message-create event.
    ///
    /// Returns the expiry handle of the error notice, if one was shown.
    /// Nothing here propagates: remote failures around the command itself
    /// (deleting the trigger, sending the notice) are logged.
    pub async fn on_message(&self, message: &Message) -> Option<ExpiryHandle> {
        if message.author_id != self.bot.me.id {
            return None;
        }

        let (name, args) = parse_invocation(&self.prefix, &message.content)?;
        let args: Vec<String> = args.into_iter().map(str::to_string).collect();
        debug!(command = name, ?args, channel_id = %message.channel_id, "received command");

        if let Err(e) = self
            .bot
            .service
            .delete_message(message.channel_id, message.id)
            .await
        {
            error!(message_id = %message.id, error = %e, "failed to delete command message");
        }

        let err = match self.commands.run(&self.bot, name, &args, message).await {
            Ok(()) => return None,
            Err(err) => err,
        };

        match &err {
            CommandError::System(e) => {
                error!(command = name, error = %e, "command failed");
            }
            CommandError::User(text) => {
                warn!(command = name, error = %text, "command rejected");
            }
        }

        match self
            .bot
            .notifier
            .error(message.channel_id, &err.user_message())
            .await
        {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(channel_id = %message.channel_id, error = %e, "failed to send error notice");
                None
            }
        }
    }
}
