//! Paginated walks over a channel's messages.
//!
//! [`MessageCursor`] yields messages newest first, fetching pages of up to
//! [`MAX_HISTORY_PAGE`] lazily. The pagination cursor moves past every
//! message that is *observed*, independent of what the caller then does with
//! it, so a message that keeps failing is never fetched again.
//!
//! [`walk`] drives a cursor with a [`MessageAction`] until enough messages
//! were handled or the listing runs dry.

use std::collections::VecDeque;

use async_trait::async_trait;
use selfbot_core::service::MAX_HISTORY_PAGE;
use selfbot_core::{ChannelId, Message, MessageId, MessageService, ServiceError};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
    /// Channel history, paged with a "before" cursor.
    History,
    /// The pinned list, which the service returns in one piece.
    Pinned,
}

pub struct MessageCursor<'a> {
    service: &'a dyn MessageService,
    channel: ChannelId,
    listing: Listing,
    before: Option<MessageId>,
    page: VecDeque<Message>,
    fetched: bool,
    exhausted: bool,
}

impl<'a> MessageCursor<'a> {
    /// Walk the channel history from the newest message backwards.
    pub fn history(service: &'a dyn MessageService, channel: ChannelId) -> Self {
        Self::new(service, channel, Listing::History)
    }

    /// Walk the channel's pins, earliest pinned first.
    pub fn pinned(service: &'a dyn MessageService, channel: ChannelId) -> Self {
        Self::new(service, channel, Listing::Pinned)
    }

    fn new(service: &'a dyn MessageService, channel: ChannelId, listing: Listing) -> Self {
        Self {
            service,
            channel,
            listing,
            before: None,
            page: VecDeque::new(),
            fetched: false,
            exhausted: false,
        }
    }

    /// Last message handed out; the next history page starts before it.
    pub fn position(&self) -> Option<MessageId> {
        self.before
    }

    /// Next message, or `None` once the listing is exhausted.
    pub async fn next(&mut self) -> Result<Option<Message>, ServiceError> {
        if self.page.is_empty() && !self.exhausted {
            self.fill().await?;
        }

        let Some(message) = self.page.pop_front() else {
            return Ok(None);
        };
        self.before = Some(message.id);
        Ok(Some(message))
    }

    async fn fill(&mut self) -> Result<(), ServiceError> {
        let batch = match self.listing {
            Listing::History => {
                self.service
                    .fetch_history(self.channel, MAX_HISTORY_PAGE, self.before)
                    .await?
            }
            Listing::Pinned if self.fetched => Vec::new(),
            Listing::Pinned => {
                let mut pins = self.service.fetch_pinned(self.channel).await?;
                pins.reverse();
                pins
            }
        };
        self.fetched = true;

        debug!(
            channel_id = %self.channel,
            before = ?self.before,
            size = batch.len(),
            "fetched message page"
        );

        if batch.is_empty() {
            self.exhausted = true;
        }
        self.page.extend(batch);
        Ok(())
    }
}

/// What applying an action to one message came to.
#[derive(Debug)]
pub enum Outcome {
    /// Counts toward the target.
    Done,
    /// Not a message this action cares about.
    Skipped,
    /// The action failed on this message; the walk moves on.
    Failed(ServiceError),
}

#[async_trait]
pub trait MessageAction: Send + Sync {
    async fn apply(&self, message: &Message) -> Outcome;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkReport {
    pub target: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl WalkReport {
    /// The listing ran out before the target was reached.
    pub fn fell_short(&self) -> bool {
        self.processed < self.target
    }
}

/// Apply `action` to messages from `cursor` until `target` of them
/// succeeded or there are no messages left.
///
/// Per-message failures are logged and skipped. Only a failed page fetch
/// ends the walk with an error.
pub async fn walk(
    cursor: &mut MessageCursor<'_>,
    target: usize,
    action: &dyn MessageAction,
) -> Result<WalkReport, ServiceError> {
    let mut report = WalkReport {
        target,
        ..WalkReport::default()
    };

    while report.processed < target {
        let Some(message) = cursor.next().await? else {
            debug!(
                processed = report.processed,
                wanted = target,
                "listing exhausted before target"
            );
            break;
        };

        match action.apply(&message).await {
            Outcome::Done => report.processed += 1,
            Outcome::Skipped => report.skipped += 1,
            Outcome::Failed(e) => {
                report.failed += 1;
                warn!(
                    count = report.processed,
                    kind = %message.kind,
                    content = %message.content,
                    message_id = %message.id,
                    error = %e,
                    "action failed on message, continuing"
                );
            }
        }
    }

    Ok(report)
}
