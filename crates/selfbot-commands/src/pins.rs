//! Cache of messages we unpinned, so `restorepins` can put them back.

use std::sync::Mutex;

use selfbot_core::{ChannelId, Message, MessageService, ServiceError};
use tracing::debug;

use crate::error::CommandError;

pub const NOTHING_TO_RESTORE: &str = "There are no cached unpinned messages for this channel";

/// Process-lifetime record of programmatic unpins, oldest first.
///
/// A message is cached at most once and leaves the cache exactly when it is
/// re-pinned.
#[derive(Default)]
pub struct PinCache {
    entries: Mutex<Vec<Message>>,
}

impl PinCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unpin `message` remotely, then remember it.
    ///
    /// Nothing is cached when the remote unpin fails.
    pub async fn unpin(
        &self,
        service: &dyn MessageService,
        message: &Message,
    ) -> Result<(), ServiceError> {
        service
            .unpin_message(message.channel_id, message.id)
            .await?;

        let mut entries = self.entries.lock().expect("pin cache poisoned");
        if !entries.iter().any(|m| m.id == message.id) {
            entries.push(message.clone());
        }
        debug!(
            channel_id = %message.channel_id,
            message_id = %message.id,
            content = %message.content,
            "unpinned message"
        );
        Ok(())
    }

    /// Cached messages for `channel`, in the order they were unpinned.
    pub fn pending(&self, channel: ChannelId) -> Vec<Message> {
        self.entries
            .lock()
            .expect("pin cache poisoned")
            .iter()
            .filter(|m| m.channel_id == channel)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("pin cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-pin every cached message of `channel`, oldest unpin first.
    ///
    /// Stops at the first failed re-pin and reports it as a system error;
    /// entries restored before that point are already gone from the cache,
    /// the rest stay cached.
    pub async fn restore(
        &self,
        service: &dyn MessageService,
        channel: ChannelId,
    ) -> Result<usize, CommandError> {
        let pending = self.pending(channel);
        if pending.is_empty() {
            return Err(CommandError::user(NOTHING_TO_RESTORE));
        }

        let mut restored = 0;
        for message in pending {
            service.pin_message(message.channel_id, message.id).await?;

            {
                let mut entries = self.entries.lock().expect("pin cache poisoned");
                if let Some(idx) = entries.iter().position(|m| m.id == message.id) {
                    entries.remove(idx);
                }
            }
            restored += 1;

            debug!(
                channel_id = %message.channel_id,
                message_id = %message.id,
                content = %message.content,
                "restored pinned message"
            );
        }

        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryService, CHANNEL, OTHER_CHANNEL};

    #[tokio::test]
    async fn unpin_then_restore_round_trips() {
        let service = MemoryService::new();
        let pinned = service.push_pinned(CHANNEL, "keep");
        let cache = PinCache::new();

        cache.unpin(service.as_ref(), &pinned).await.unwrap();
        assert!(service.pinned_ids(CHANNEL).is_empty());
        assert_eq!(cache.len(), 1);

        let restored = cache.restore(service.as_ref(), CHANNEL).await.unwrap();
        assert_eq!(restored, 1);
        assert!(cache.is_empty());
        assert_eq!(service.pinned_ids(CHANNEL), vec![pinned.id]);
    }

    #[tokio::test]
    async fn failed_unpin_is_not_cached() {
        let service = MemoryService::new();
        let pinned = service.push_pinned(CHANNEL, "stuck");
        service.fail("unpin_message");
        let cache = PinCache::new();

        assert!(cache.unpin(service.as_ref(), &pinned).await.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn restore_without_entries_for_channel_is_a_user_error() {
        let service = MemoryService::new();
        let elsewhere = service.push_pinned(OTHER_CHANNEL, "elsewhere");
        let cache = PinCache::new();
        cache.unpin(service.as_ref(), &elsewhere).await.unwrap();

        let err = cache.restore(service.as_ref(), CHANNEL).await.unwrap_err();
        assert!(matches!(err, CommandError::User(ref m) if m == NOTHING_TO_RESTORE));
        assert_eq!(cache.pending(OTHER_CHANNEL), vec![elsewhere]);
    }

    #[tokio::test]
    async fn restore_follows_unpin_order_and_leaves_other_channels() {
        let service = MemoryService::new();
        let a = service.push_pinned(CHANNEL, "a");
        let b = service.push_pinned(CHANNEL, "b");
        let x = service.push_pinned(OTHER_CHANNEL, "x");
        let cache = PinCache::new();
        for m in [&b, &x, &a] {
            cache.unpin(service.as_ref(), m).await.unwrap();
        }

        assert_eq!(cache.restore(service.as_ref(), CHANNEL).await.unwrap(), 2);
        assert_eq!(service.pinned_ids(CHANNEL), vec![b.id, a.id]);
        assert_eq!(cache.pending(OTHER_CHANNEL), vec![x]);
    }

    #[tokio::test]
    async fn first_failed_repin_aborts_the_batch() {
        let service = MemoryService::new();
        let a = service.push_pinned(CHANNEL, "a");
        let b = service.push_pinned(CHANNEL, "b");
        let c = service.push_pinned(CHANNEL, "c");
        let cache = PinCache::new();
        for m in [&a, &b, &c] {
            cache.unpin(service.as_ref(), m).await.unwrap();
        }
        service.fail_on("pin_message", b.id);

        let err = cache.restore(service.as_ref(), CHANNEL).await.unwrap_err();
        assert!(err.is_system());
        assert_eq!(service.pinned_ids(CHANNEL), vec![a.id]);
        assert_eq!(cache.pending(CHANNEL), vec![b.clone(), c.clone()]);

        service.heal();
        assert_eq!(cache.restore(service.as_ref(), CHANNEL).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn message_is_cached_once() {
        let service = MemoryService::new();
        let pinned = service.push_pinned(CHANNEL, "twice");
        let cache = PinCache::new();
        cache.unpin(service.as_ref(), &pinned).await.unwrap();
        cache.unpin(service.as_ref(), &pinned).await.unwrap();
        assert_eq!(cache.len(), 1);
    }
}
