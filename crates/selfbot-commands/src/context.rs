use std::sync::Arc;
use std::time::Duration;

use selfbot_core::{MessageService, User};

use crate::notify::Notifier;
use crate::pins::PinCache;

/// State shared by every command invocation.
///
/// Built once at startup and handed to the interceptor behind an `Arc`.
/// The pin cache is the only mutable part and carries its own lock.
pub struct BotContext {
    pub service: Arc<dyn MessageService>,
    /// The controlling account; only its messages are ever interpreted.
    pub me: User,
    pub pins: PinCache,
    pub notifier: Notifier,
}

impl BotContext {
    pub fn new(service: Arc<dyn MessageService>, me: User, notice_lifetime: Duration) -> Self {
        let notifier = Notifier::new(Arc::clone(&service), notice_lifetime);
        Self {
            service,
            me,
            pins: PinCache::new(),
            notifier,
        }
    }
}
