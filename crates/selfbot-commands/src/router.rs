//! Name → command lookup and dispatch.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use selfbot_core::Message;
use tracing::debug;

use crate::context::BotContext;
use crate::error::CommandError;

/// Everything a command gets to see about the call that triggered it.
pub struct Invocation<'a> {
    pub name: &'a str,
    pub args: &'a [String],
    /// The (already deleted) message that carried the command.
    pub message: &'a Message,
    pub commands: &'a CommandRegistry,
}

#[async_trait]
pub trait Command: Send + Sync {
    /// Name the command is invoked by (case-sensitive).
    fn name(&self) -> &'static str;
    /// Call syntax, e.g. `delete [count=1]`.
    fn usage(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn run(&self, bot: &BotContext, inv: &Invocation<'_>) -> Result<(), CommandError>;
}

/// Immutable set of commands, built once at startup.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command; a later registration under the same name wins.
    pub fn with(mut self, command: impl Command + 'static) -> Self {
        self.commands.insert(command.name(), Arc::new(command));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.commands.get(name)
    }

    /// Registered commands, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Command>> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run the command registered as `name`.
    ///
    /// Unknown names are a user error. Whatever the command returns is passed
    /// through untouched.
    pub async fn run(
        &self,
        bot: &BotContext,
        name: &str,
        args: &[String],
        message: &Message,
    ) -> Result<(), CommandError> {
        let Some(command) = self.get(name) else {
            return Err(CommandError::User(format!("unknown command: {name}")));
        };

        debug!(command = name, ?args, "dispatching command");
        let inv = Invocation {
            name,
            args,
            message,
            commands: self,
        };
        command.run(bot, &inv).await
    }
}
