//! Command core of the selfbot: interception of our own messages, dispatch
//! to named commands, and the shared machinery those commands use
//! (ephemeral notices, the pin cache, paginated history walks).

pub mod context;
pub mod error;
pub mod handlers;
pub mod history;
pub mod intercept;
pub mod notify;
pub mod pins;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;

pub use context::BotContext;
pub use error::CommandError;
pub use intercept::Interceptor;
pub use router::{Command, CommandRegistry, Invocation};
