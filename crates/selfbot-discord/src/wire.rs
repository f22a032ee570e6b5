//! JSON shapes shared by the REST API and gateway dispatches.
//!
//! Only the fields the selfbot reads are modelled; everything else in the
//! payload is ignored.

use serde::{Deserialize, Deserializer};

use selfbot_core::{ChannelId, Message, MessageId, User, UserId};

/// Discord sends snowflakes as decimal strings.
fn snowflake<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    let raw = String::deserialize(de)?;
    raw.parse().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireUser {
    #[serde(deserialize_with = "snowflake")]
    pub id: u64,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMessage {
    #[serde(deserialize_with = "snowflake")]
    pub id: u64,
    #[serde(deserialize_with = "snowflake")]
    pub channel_id: u64,
    pub author: WireUser,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: u8,
}

/// Readable name of a message type, for logs.
pub(crate) fn kind_name(kind: u8) -> String {
    match kind {
        0 => "Default".to_string(),
        6 => "PinsAdd".to_string(),
        7 => "MemberJoin".to_string(),
        19 => "Reply".to_string(),
        20 => "SlashCommand".to_string(),
        other => format!("Type{other}"),
    }
}

impl From<WireUser> for User {
    fn from(user: WireUser) -> Self {
        User {
            id: UserId(user.id),
            name: user.username,
        }
    }
}

impl From<WireMessage> for Message {
    fn from(msg: WireMessage) -> Self {
        Message {
            id: MessageId(msg.id),
            channel_id: ChannelId(msg.channel_id),
            author_id: UserId(msg.author.id),
            content: msg.content,
            kind: kind_name(msg.kind),
        }
    }
}
