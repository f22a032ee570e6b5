use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use selfbot_commands::Interceptor;

use crate::gateway::{self, Session, GATEWAY_URL};
use crate::handler::SelfbotHandler;

/// Discord gateway adapter.
///
/// Owns the websocket session and drives it until the process exits.
/// Reconnects (with a fresh identify) whenever the gateway drops.
pub struct DiscordAdapter {
    token: String,
    handler: SelfbotHandler,
}

impl DiscordAdapter {
    pub fn new(token: impl Into<String>, interceptor: Arc<Interceptor>) -> Self {
        Self {
            token: token.into(),
            handler: SelfbotHandler { interceptor },
        }
    }

    /// Connect to the gateway and keep reconnecting whenever it drops.
    ///
    /// Never returns.
    pub async fn run(self) {
        loop {
            let socket = loop {
                match gateway::connect(GATEWAY_URL).await {
                    Ok(s) => break s,
                    Err(e) => {
                        error!("Discord: connect failed ({e}), retrying in 30s");
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                }
            };

            info!("Discord: gateway connected");
            if let Err(e) = Session::new(&self.token, &self.handler).run(socket).await {
                warn!("Discord: gateway error ({e}), reconnecting in 5s");
            } else {
                info!("Discord: gateway session ended, reconnecting in 5s");
            }

            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }
}
