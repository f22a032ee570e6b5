//! Boundary to the remote messaging service.
//!
//! Everything the selfbot does to the outside world goes through
//! [`MessageService`]. The Discord crate provides the real implementation;
//! tests use an in-memory one.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ChannelId, Message, MessageId, User};

/// Largest page the history endpoint will return.
pub const MAX_HISTORY_PAGE: u8 = 100;

/// Largest plain-text message the service accepts, in characters.
pub const MAX_MESSAGE_LEN: usize = 2000;

/// A remote call failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{op} failed: {reason}")]
pub struct ServiceError {
    /// Name of the operation, e.g. `"delete_message"`.
    pub op: &'static str,
    pub reason: String,
}

impl ServiceError {
    pub fn new(op: &'static str, reason: impl Into<String>) -> Self {
        Self {
            op,
            reason: reason.into(),
        }
    }
}

/// A styled notice (an embed on Discord).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub color: u32,
}

#[async_trait]
pub trait MessageService: Send + Sync {
    /// Up to `limit` messages older than `before` (or the newest ones when
    /// `before` is `None`), newest first.
    async fn fetch_history(
        &self,
        channel: ChannelId,
        limit: u8,
        before: Option<MessageId>,
    ) -> Result<Vec<Message>, ServiceError>;

    async fn send_message(&self, channel: ChannelId, text: &str) -> Result<Message, ServiceError>;

    async fn send_notice(&self, channel: ChannelId, notice: &Notice)
        -> Result<Message, ServiceError>;

    async fn delete_message(&self, channel: ChannelId, id: MessageId) -> Result<(), ServiceError>;

    async fn pin_message(&self, channel: ChannelId, id: MessageId) -> Result<(), ServiceError>;

    async fn unpin_message(&self, channel: ChannelId, id: MessageId) -> Result<(), ServiceError>;

    /// Currently pinned messages, newest pin first.
    async fn fetch_pinned(&self, channel: ChannelId) -> Result<Vec<Message>, ServiceError>;

    async fn add_reaction(
        &self,
        channel: ChannelId,
        id: MessageId,
        emoji: &str,
    ) -> Result<(), ServiceError>;

    async fn current_user(&self) -> Result<User, ServiceError>;
}
