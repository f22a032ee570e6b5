//! `MessageService` over Discord's REST API.
//!
//! Requests carry the account token verbatim in `Authorization`. User
//! tokens are sent bare; a bot token only works when written as `Bot <token>`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_LENGTH, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, Response, Url};
use tracing::{debug, warn};

use selfbot_core::{ChannelId, Message, MessageId, MessageService, Notice, ServiceError, User};

use crate::error::DiscordError;
use crate::wire::{WireMessage, WireUser};

pub const API_BASE: &str = "https://discord.com/api/v10";

const USER_AGENT: &str = concat!("selfbot/", env!("CARGO_PKG_VERSION"));

/// 429 responses are retried this many times before the call fails.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Discord REST client for the controlling account.
///
/// Stateless apart from the connection pool, so it stays valid across
/// gateway reconnects.
#[derive(Clone)]
pub struct DiscordService {
    client: reqwest::Client,
    token: String,
    base: Url,
}

impl DiscordService {
    pub fn new(token: &str) -> Result<Self, DiscordError> {
        Self::with_base(token, API_BASE)
    }

    /// Like [`DiscordService::new`], against a different API root.
    pub fn with_base(token: &str, base: &str) -> Result<Self, DiscordError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DiscordError::NoToken);
        }
        let base = Url::parse(base).map_err(|e| DiscordError::BadUrl(format!("{base}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(DiscordError::BadUrl(base.to_string()));
        }
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            token: token.to_string(),
            base,
        })
    }

    /// Build the client and resolve the account it belongs to.
    pub async fn connect(token: &str) -> Result<(Self, User), DiscordError> {
        let service = Self::new(token)?;
        let me = service.current_user().await?;
        Ok((service, me))
    }

    /// API URL for `segments`, each one percent-encoded as a path segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // cannot_be_a_base was ruled out in with_base
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client
            .request(method, self.endpoint(segments))
            .header(AUTHORIZATION, self.token.as_str())
    }

    /// Bodiless PUT/DELETE; Discord wants an explicit zero length on PUT.
    fn empty(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.request(method, segments).header(CONTENT_LENGTH, "0")
    }

    fn history_request(
        &self,
        channel: ChannelId,
        limit: u8,
        before: Option<MessageId>,
    ) -> RequestBuilder {
        let channel = channel.to_string();
        let req = self
            .request(Method::GET, &["channels", &channel, "messages"])
            .query(&[("limit", limit.to_string())]);
        match before {
            Some(before) => req.query(&[("before", before.to_string())]),
            None => req,
        }
    }

    /// Send `req`, waiting out rate limits, and fail on any non-2xx status.
    async fn execute(&self, op: &'static str, req: RequestBuilder) -> Result<Response, ServiceError> {
        let mut pending = req;
        let mut attempt = 0;

        loop {
            let retry = pending.try_clone();
            let resp = pending.send().await.map_err(remote(op))?;
            let status = resp.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS && attempt < MAX_RATE_LIMIT_RETRIES {
                if let Some(next) = retry {
                    let wait = retry_after(resp.headers());
                    warn!(op, attempt, wait_ms = wait.as_millis() as u64, "rate limited, retrying");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                    pending = next;
                    continue;
                }
            }

            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(ServiceError::new(
                    op,
                    format!("HTTP {}: {}", status.as_u16(), body),
                ));
            }

            debug!(op, status = status.as_u16(), "request ok");
            return Ok(resp);
        }
    }
}

/// Delay asked for by a 429 response, in (possibly fractional) seconds.
fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(Duration::from_secs(1))
}

fn notice_body(notice: &Notice) -> serde_json::Value {
    serde_json::json!({
        "embeds": [{
            "title": notice.title,
            "description": notice.body,
            "color": notice.color,
        }]
    })
}

fn remote(op: &'static str) -> impl FnOnce(reqwest::Error) -> ServiceError {
    move |e| ServiceError::new(op, e.to_string())
}

#[async_trait]
impl MessageService for DiscordService {
    async fn fetch_history(
        &self,
        channel: ChannelId,
        limit: u8,
        before: Option<MessageId>,
    ) -> Result<Vec<Message>, ServiceError> {
        let req = self.history_request(channel, limit, before);
        let page: Vec<WireMessage> = self
            .execute("fetch_history", req)
            .await?
            .json()
            .await
            .map_err(remote("fetch_history"))?;
        Ok(page.into_iter().map(Message::from).collect())
    }

    async fn send_message(&self, channel: ChannelId, text: &str) -> Result<Message, ServiceError> {
        let channel = channel.to_string();
        let req = self
            .request(Method::POST, &["channels", &channel, "messages"])
            .json(&serde_json::json!({ "content": text }));
        let sent: WireMessage = self
            .execute("send_message", req)
            .await?
            .json()
            .await
            .map_err(remote("send_message"))?;
        Ok(sent.into())
    }

    async fn send_notice(&self, channel: ChannelId, notice: &Notice) -> Result<Message, ServiceError> {
        let channel = channel.to_string();
        let req = self
            .request(Method::POST, &["channels", &channel, "messages"])
            .json(&notice_body(notice));
        let sent: WireMessage = self
            .execute("send_notice", req)
            .await?
            .json()
            .await
            .map_err(remote("send_notice"))?;
        Ok(sent.into())
    }

    async fn delete_message(&self, channel: ChannelId, id: MessageId) -> Result<(), ServiceError> {
        let (channel, id) = (channel.to_string(), id.to_string());
        let req = self.empty(Method::DELETE, &["channels", &channel, "messages", &id]);
        self.execute("delete_message", req).await?;
        Ok(())
    }

    async fn pin_message(&self, channel: ChannelId, id: MessageId) -> Result<(), ServiceError> {
        let (channel, id) = (channel.to_string(), id.to_string());
        let req = self.empty(Method::PUT, &["channels", &channel, "pins", &id]);
        self.execute("pin_message", req).await?;
        Ok(())
    }

    async fn unpin_message(&self, channel: ChannelId, id: MessageId) -> Result<(), ServiceError> {
        let (channel, id) = (channel.to_string(), id.to_string());
        let req = self.empty(Method::DELETE, &["channels", &channel, "pins", &id]);
        self.execute("unpin_message", req).await?;
        Ok(())
    }

    async fn fetch_pinned(&self, channel: ChannelId) -> Result<Vec<Message>, ServiceError> {
        let channel = channel.to_string();
        let req = self.request(Method::GET, &["channels", &channel, "pins"]);
        let pins: Vec<WireMessage> = self
            .execute("fetch_pinned", req)
            .await?
            .json()
            .await
            .map_err(remote("fetch_pinned"))?;
        Ok(pins.into_iter().map(Message::from).collect())
    }

    async fn add_reaction(
        &self,
        channel: ChannelId,
        id: MessageId,
        emoji: &str,
    ) -> Result<(), ServiceError> {
        let (channel, id) = (channel.to_string(), id.to_string());
        let req = self.empty(
            Method::PUT,
            &["channels", &channel, "messages", &id, "reactions", emoji, "@me"],
        );
        self.execute("add_reaction", req).await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<User, ServiceError> {
        let req = self.request(Method::GET, &["users", "@me"]);
        let me: WireUser = self
            .execute("current_user", req)
            .await?
            .json()
            .await
            .map_err(remote("current_user"))?;
        Ok(me.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn service(token: &str) -> DiscordService {
        DiscordService::new(token).unwrap()
    }

    #[test]
    fn blank_token_is_rejected() {
        assert!(matches!(
            DiscordService::new("   "),
            Err(DiscordError::NoToken)
        ));
    }

    #[test]
    fn bad_api_base_is_rejected() {
        assert!(matches!(
            DiscordService::with_base("t", "not a url"),
            Err(DiscordError::BadUrl(_))
        ));
        assert!(matches!(
            DiscordService::with_base("t", "mailto:x@example.com"),
            Err(DiscordError::BadUrl(_))
        ));
    }

    #[test]
    fn account_token_is_sent_without_bot_prefix() {
        let svc = service("  mfa.user-token  ");
        let req = svc.request(Method::GET, &["users", "@me"]).build().unwrap();

        assert_eq!(req.url().as_str(), "https://discord.com/api/v10/users/@me");
        assert_eq!(
            req.headers().get(AUTHORIZATION),
            Some(&HeaderValue::from_static("mfa.user-token"))
        );
    }

    #[test]
    fn explicit_bot_prefix_is_kept_verbatim() {
        let svc = service("Bot abc");
        let req = svc.request(Method::GET, &["users", "@me"]).build().unwrap();
        assert_eq!(
            req.headers().get(AUTHORIZATION),
            Some(&HeaderValue::from_static("Bot abc"))
        );
    }

    #[test]
    fn history_request_carries_limit_and_cursor() {
        let svc = service("t");
        let first = svc.history_request(ChannelId(10), 100, None).build().unwrap();
        assert_eq!(
            first.url().as_str(),
            "https://discord.com/api/v10/channels/10/messages?limit=100"
        );

        let next = svc
            .history_request(ChannelId(10), 100, Some(MessageId(55)))
            .build()
            .unwrap();
        assert_eq!(next.url().query(), Some("limit=100&before=55"));
    }

    #[test]
    fn reaction_emoji_is_percent_encoded() {
        let svc = service("t");
        let url = svc.endpoint(&["channels", "1", "messages", "2", "reactions", "#️⃣", "@me"]);
        let path = url.path();
        assert!(path.starts_with("/api/v10/channels/1/messages/2/reactions/%23"));
        assert!(path.ends_with("/@me"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn bodiless_writes_send_zero_length() {
        let svc = service("t");
        let req = svc.empty(Method::PUT, &["channels", "1", "pins", "2"]).build().unwrap();
        assert_eq!(req.headers().get(CONTENT_LENGTH), Some(&HeaderValue::from_static("0")));
    }

    #[test]
    fn notice_becomes_titled_embed() {
        let body = notice_body(&Notice {
            title: "Error".into(),
            body: "unknown command: x".into(),
            color: 0xea5455,
        });
        assert_eq!(body["embeds"][0]["title"], "Error");
        assert_eq!(body["embeds"][0]["description"], "unknown command: x");
        assert_eq!(body["embeds"][0]["color"], 0xea5455);
    }

    #[test]
    fn retry_after_reads_fractional_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), Duration::from_secs(1));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("1.5"));
        assert_eq!(retry_after(&headers), Duration::from_millis(1500));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), Duration::from_secs(1));
    }
}
