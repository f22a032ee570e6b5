//! In-memory `MessageService` for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use selfbot_core::{
    ChannelId, Message, MessageId, MessageService, Notice, ServiceError, User, UserId,
};

use crate::context::BotContext;

pub const ME: UserId = UserId(1);
pub const OTHER: UserId = UserId(2);
pub const CHANNEL: ChannelId = ChannelId(10);
pub const OTHER_CHANNEL: ChannelId = ChannelId(20);

/// Remote calls that change something, in the order they were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Sent(ChannelId, String),
    Notice(ChannelId, Notice),
    Deleted(ChannelId, MessageId),
    Pinned(ChannelId, MessageId),
    Unpinned(ChannelId, MessageId),
    Reacted(ChannelId, MessageId, String),
}

#[derive(Default)]
struct State {
    /// Oldest first.
    history: HashMap<ChannelId, Vec<Message>>,
    /// Pin order, oldest pin first.
    pinned: HashMap<ChannelId, Vec<MessageId>>,
    calls: Vec<Call>,
    history_fetches: usize,
    failures: Vec<(&'static str, Option<MessageId>)>,
    failing_emoji: Vec<String>,
}

pub struct MemoryService {
    me: User,
    next_id: AtomicU64,
    state: Mutex<State>,
}

impl MemoryService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            me: User {
                id: ME,
                name: "me".to_string(),
            },
            next_id: AtomicU64::new(1000),
            state: Mutex::new(State::default()),
        })
    }

    pub fn me(&self) -> User {
        self.me.clone()
    }

    /// Append a message to the channel's history.
    pub fn push(&self, channel: ChannelId, author: UserId, content: &str) -> Message {
        let message = Message {
            id: MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)),
            channel_id: channel,
            author_id: author,
            content: content.to_string(),
            kind: "Regular".to_string(),
        };
        self.lock()
            .history
            .entry(channel)
            .or_default()
            .push(message.clone());
        message
    }

    /// Append a message and pin it.
    pub fn push_pinned(&self, channel: ChannelId, content: &str) -> Message {
        let message = self.push(channel, OTHER, content);
        self.lock()
            .pinned
            .entry(channel)
            .or_default()
            .push(message.id);
        message
    }

    /// Drop a message from history without recording a call, as if it had
    /// been deleted before the test started.
    pub fn remove(&self, message: &Message) {
        if let Some(msgs) = self.lock().history.get_mut(&message.channel_id) {
            msgs.retain(|m| m.id != message.id);
        }
    }

    /// Make every call of `op` fail.
    pub fn fail(&self, op: &'static str) {
        self.lock().failures.push((op, None));
    }

    /// Make `op` fail for one message only.
    pub fn fail_on(&self, op: &'static str, id: MessageId) {
        self.lock().failures.push((op, Some(id)));
    }

    /// Make reacting with one emoji fail.
    pub fn fail_emoji(&self, emoji: &str) {
        self.lock().failing_emoji.push(emoji.to_string());
    }

    pub fn heal(&self) {
        let mut state = self.lock();
        state.failures.clear();
        state.failing_emoji.clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Deleted(_, id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Notice(_, n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn sent(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Sent(_, text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn history(&self, channel: ChannelId) -> Vec<Message> {
        self.lock()
            .history
            .get(&channel)
            .cloned()
            .unwrap_or_default()
    }

    pub fn pinned_ids(&self, channel: ChannelId) -> Vec<MessageId> {
        self.lock()
            .pinned
            .get(&channel)
            .cloned()
            .unwrap_or_default()
    }

    pub fn history_fetches(&self) -> usize {
        self.lock().history_fetches
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn check(&self, op: &'static str, id: Option<MessageId>) -> Result<(), ServiceError> {
        let failing = self
            .lock()
            .failures
            .iter()
            .any(|(o, target)| *o == op && (target.is_none() || *target == id));
        if failing {
            Err(ServiceError::new(op, "injected failure"))
        } else {
            Ok(())
        }
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }

    fn find(&self, channel: ChannelId, id: MessageId) -> Option<Message> {
        self.lock()
            .history
            .get(&channel)
            .and_then(|msgs| msgs.iter().find(|m| m.id == id).cloned())
    }
}

#[async_trait]
impl MessageService for MemoryService {
    async fn fetch_history(
        &self,
        channel: ChannelId,
        limit: u8,
        before: Option<MessageId>,
    ) -> Result<Vec<Message>, ServiceError> {
        self.check("fetch_history", None)?;
        let mut state = self.lock();
        state.history_fetches += 1;
        let page = state
            .history
            .get(&channel)
            .map(|msgs| {
                msgs.iter()
                    .rev()
                    .filter(|m| before.map_or(true, |b| m.id < b))
                    .take(limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(page)
    }

    async fn send_message(&self, channel: ChannelId, text: &str) -> Result<Message, ServiceError> {
        self.check("send_message", None)?;
        self.record(Call::Sent(channel, text.to_string()));
        Ok(self.push(channel, ME, text))
    }

    async fn send_notice(
        &self,
        channel: ChannelId,
        notice: &Notice,
    ) -> Result<Message, ServiceError> {
        self.check("send_notice", None)?;
        self.record(Call::Notice(channel, notice.clone()));
        let mut message = self.push(channel, ME, "");
        message.kind = "Notice".to_string();
        Ok(message)
    }

    async fn delete_message(&self, channel: ChannelId, id: MessageId) -> Result<(), ServiceError> {
        self.check("delete_message", Some(id))?;
        {
            let mut state = self.lock();
            if let Some(msgs) = state.history.get_mut(&channel) {
                msgs.retain(|m| m.id != id);
            }
            if let Some(pins) = state.pinned.get_mut(&channel) {
                pins.retain(|p| *p != id);
            }
        }
        self.record(Call::Deleted(channel, id));
        Ok(())
    }

    async fn pin_message(&self, channel: ChannelId, id: MessageId) -> Result<(), ServiceError> {
        self.check("pin_message", Some(id))?;
        self.lock().pinned.entry(channel).or_default().push(id);
        self.record(Call::Pinned(channel, id));
        Ok(())
    }

    async fn unpin_message(&self, channel: ChannelId, id: MessageId) -> Result<(), ServiceError> {
        self.check("unpin_message", Some(id))?;
        if let Some(pins) = self.lock().pinned.get_mut(&channel) {
            pins.retain(|p| *p != id);
        }
        self.record(Call::Unpinned(channel, id));
        Ok(())
    }

    async fn fetch_pinned(&self, channel: ChannelId) -> Result<Vec<Message>, ServiceError> {
        self.check("fetch_pinned", None)?;
        let ids = self.pinned_ids(channel);
        Ok(ids
            .into_iter()
            .rev()
            .filter_map(|id| self.find(channel, id))
            .collect())
    }

    async fn add_reaction(
        &self,
        channel: ChannelId,
        id: MessageId,
        emoji: &str,
    ) -> Result<(), ServiceError> {
        self.check("add_reaction", Some(id))?;
        if self.lock().failing_emoji.iter().any(|e| e == emoji) {
            return Err(ServiceError::new("add_reaction", "unknown emoji"));
        }
        self.record(Call::Reacted(channel, id, emoji.to_string()));
        Ok(())
    }

    async fn current_user(&self) -> Result<User, ServiceError> {
        Ok(self.me.clone())
    }
}

/// A bot context over `service` with a 5 second notice lifetime.
pub fn context(service: &Arc<MemoryService>) -> BotContext {
    let me = service.me();
    BotContext::new(service.clone(), me, Duration::from_secs(5))
}
