//! Styled notices that clean up after themselves.
//!
//! Error notices always expire; info notices expire when the caller asks.
//! Expiry runs as a detached task so the caller never waits on it.

use std::sync::Arc;
use std::time::Duration;

use selfbot_core::{ChannelId, Message, MessageService, Notice, ServiceError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

pub const ERROR_TITLE: &str = "Error";
pub const ERROR_COLOR: u32 = 0xea5455;
pub const INFO_TITLE: &str = "Info";
pub const INFO_COLOR: u32 = 0x28c76f;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Info { expire: bool },
}

impl NoticeKind {
    fn expires(self) -> bool {
        match self {
            NoticeKind::Error => true,
            NoticeKind::Info { expire } => expire,
        }
    }

    fn style(self, text: &str) -> Notice {
        let (title, color) = match self {
            NoticeKind::Error => (ERROR_TITLE, ERROR_COLOR),
            NoticeKind::Info { .. } => (INFO_TITLE, INFO_COLOR),
        };
        Notice {
            title: title.to_string(),
            body: text.to_string(),
            color,
        }
    }
}

/// Handle to a pending notice deletion.
///
/// Dropping it leaves the deletion scheduled.
pub struct ExpiryHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ExpiryHandle {
    /// Keep the notice; the pending deletion is abandoned.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait until the deletion ran (or was cancelled).
    pub async fn finished(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "notice expiry task panicked");
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    service: Arc<dyn MessageService>,
    lifetime: Duration,
}

impl Notifier {
    pub fn new(service: Arc<dyn MessageService>, lifetime: Duration) -> Self {
        Self { service, lifetime }
    }

    /// Send a styled notice; schedule its deletion if `kind` expires.
    pub async fn notify(
        &self,
        channel: ChannelId,
        text: &str,
        kind: NoticeKind,
    ) -> Result<Option<ExpiryHandle>, ServiceError> {
        let sent = self.send(channel, text, kind).await?;
        Ok(kind.expires().then(|| self.expire(&sent)))
    }

    pub async fn error(&self, channel: ChannelId, text: &str) -> Result<ExpiryHandle, ServiceError> {
        let sent = self.send(channel, text, NoticeKind::Error).await?;
        Ok(self.expire(&sent))
    }

    pub async fn info(
        &self,
        channel: ChannelId,
        text: &str,
        expire: bool,
    ) -> Result<Option<ExpiryHandle>, ServiceError> {
        self.notify(channel, text, NoticeKind::Info { expire }).await
    }

    async fn send(
        &self,
        channel: ChannelId,
        text: &str,
        kind: NoticeKind,
    ) -> Result<Message, ServiceError> {
        self.service.send_notice(channel, &kind.style(text)).await
    }

    /// Delete `message` once the notice lifetime has passed.
    ///
    /// A failed delete is logged and otherwise ignored.
    pub fn expire(&self, message: &Message) -> ExpiryHandle {
        let token = CancellationToken::new();
        let service = Arc::clone(&self.service);
        let lifetime = self.lifetime;
        let channel = message.channel_id;
        let id = message.id;
        let cancelled = token.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {
                    debug!(channel_id = %channel, message_id = %id, "notice expiry cancelled");
                }
                _ = tokio::time::sleep(lifetime) => {
                    if let Err(e) = service.delete_message(channel, id).await {
                        error!(channel_id = %channel, message_id = %id, error = %e, "failed to delete expired notice");
                    }
                }
            }
        });

        ExpiryHandle { token, task }
    }
}
