use std::sync::Arc;

use tracing::info;

use selfbot_commands::Interceptor;
use selfbot_core::{Message, User};

/// Receiver of the gateway events the selfbot cares about.
pub trait GatewayHandler: Send + Sync {
    fn ready(&self, user: &User);
    fn message(&self, message: Message);
}

/// Feeds message-create events to the interceptor.
///
/// Every event runs on its own task, so a long command (a big `delete`)
/// never holds up the gateway loop or the next event.
pub struct SelfbotHandler {
    pub interceptor: Arc<Interceptor>,
}

impl GatewayHandler for SelfbotHandler {
    fn ready(&self, user: &User) {
        info!(user = %user, "Discord session ready");
    }

    fn message(&self, message: Message) {
        let interceptor = Arc::clone(&self.interceptor);
        tokio::spawn(async move {
            // The error notice's expiry keeps running after the handle is dropped.
            let _ = interceptor.on_message(&message).await;
        });
    }
}
