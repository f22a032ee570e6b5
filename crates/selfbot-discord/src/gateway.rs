//! Discord gateway session: hello, identify, heartbeat, dispatch.
//!
//! One [`Session`] lives for one websocket connection. It never resumes;
//! the adapter opens a fresh connection and identifies again instead.

use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::{interval_at, Instant};
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use selfbot_core::{Message, User};

use crate::error::DiscordError;
use crate::handler::GatewayHandler;
use crate::wire::{WireMessage, WireUser};

pub const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// GUILD_MESSAGES | DIRECT_MESSAGES | MESSAGE_CONTENT
const INTENTS: u64 = (1 << 9) | (1 << 12) | (1 << 15);

mod op {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

pub(crate) type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub(crate) async fn connect(url: &str) -> Result<Socket, DiscordError> {
    let (socket, _response) = connect_async(url).await?;
    Ok(socket)
}

#[derive(Debug, Deserialize)]
struct Frame {
    op: u8,
    #[serde(rename = "d", default)]
    data: Value,
    #[serde(rename = "s", default)]
    seq: Option<u64>,
    #[serde(rename = "t", default)]
    kind: Option<String>,
}

#[derive(Debug)]
enum Event {
    Hello { heartbeat: Duration },
    HeartbeatAck,
    HeartbeatRequest,
    Reconnect,
    InvalidSession,
    Ready(User),
    MessageCreate(Message),
    Other,
}

#[derive(Deserialize)]
struct ReadyData {
    user: WireUser,
}

impl Frame {
    fn parse(text: &str) -> Result<Self, DiscordError> {
        Ok(serde_json::from_str(text)?)
    }

    fn into_event(self) -> Result<Event, DiscordError> {
        let event = match self.op {
            op::HELLO => {
                let ms = self
                    .data
                    .get("heartbeat_interval")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| DiscordError::Session("hello without heartbeat_interval".into()))?;
                Event::Hello {
                    heartbeat: Duration::from_millis(ms),
                }
            }
            op::HEARTBEAT_ACK => Event::HeartbeatAck,
            op::HEARTBEAT => Event::HeartbeatRequest,
            op::RECONNECT => Event::Reconnect,
            op::INVALID_SESSION => Event::InvalidSession,
            op::DISPATCH => match self.kind.as_deref() {
                Some("READY") => {
                    let ready: ReadyData = serde_json::from_value(self.data)?;
                    Event::Ready(ready.user.into())
                }
                Some("MESSAGE_CREATE") => {
                    let msg: WireMessage = serde_json::from_value(self.data)?;
                    Event::MessageCreate(msg.into())
                }
                _ => Event::Other,
            },
            _ => Event::Other,
        };
        Ok(event)
    }
}

/// Identify takes the bare token, even for bot accounts.
fn identify_payload(token: &str) -> Value {
    let token = token.strip_prefix("Bot ").unwrap_or(token);
    json!({
        "op": op::IDENTIFY,
        "d": {
            "token": token,
            "intents": INTENTS,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "selfbot",
                "device": "selfbot",
            },
        },
    })
}

fn heartbeat_payload(seq: Option<u64>) -> Value {
    json!({ "op": op::HEARTBEAT, "d": seq })
}

async fn send<S>(sink: &mut S, payload: Value) -> Result<(), DiscordError>
where
    S: Sink<WsMessage, Error = tungstenite::Error> + Unpin,
{
    sink.send(WsMessage::Text(payload.to_string())).await?;
    Ok(())
}

/// Wait for the hello frame that opens every connection.
async fn hello<S>(source: &mut S) -> Result<Duration, DiscordError>
where
    S: Stream<Item = Result<WsMessage, tungstenite::Error>> + Unpin,
{
    while let Some(incoming) = source.next().await {
        if let WsMessage::Text(text) = incoming? {
            return match Frame::parse(&text)?.into_event()? {
                Event::Hello { heartbeat } => Ok(heartbeat),
                other => Err(DiscordError::Session(format!("expected hello, got {other:?}"))),
            };
        }
    }
    Err(DiscordError::Session("connection closed before hello".into()))
}

pub(crate) struct Session<'a> {
    token: &'a str,
    handler: &'a dyn GatewayHandler,
    seq: Option<u64>,
}

impl<'a> Session<'a> {
    pub(crate) fn new(token: &'a str, handler: &'a dyn GatewayHandler) -> Self {
        Self {
            token,
            handler,
            seq: None,
        }
    }

    /// Drive `socket` until the gateway closes it or asks for a reconnect.
    ///
    /// `Ok` means reconnecting is the expected next step. A missed heartbeat
    /// ack or an invalid session is an error.
    pub(crate) async fn run(mut self, socket: Socket) -> Result<(), DiscordError> {
        let (mut sink, mut source) = socket.split();

        let heartbeat = hello(&mut source).await?;
        debug!(interval_ms = heartbeat.as_millis() as u64, "gateway hello");
        send(&mut sink, identify_payload(self.token)).await?;

        let mut ticker = interval_at(Instant::now() + heartbeat, heartbeat);
        let mut acked = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !acked {
                        return Err(DiscordError::Session("heartbeat not acknowledged".into()));
                    }
                    acked = false;
                    send(&mut sink, heartbeat_payload(self.seq)).await?;
                }
                incoming = source.next() => {
                    let Some(incoming) = incoming else {
                        return Ok(());
                    };
                    let text = match incoming? {
                        WsMessage::Text(text) => text,
                        WsMessage::Binary(bytes) => match String::from_utf8(bytes) {
                            Ok(text) => text,
                            Err(e) => {
                                warn!(error = %e, "non-utf8 gateway frame");
                                continue;
                            }
                        },
                        WsMessage::Close(frame) => {
                            info!(?frame, "gateway closed the connection");
                            return Ok(());
                        }
                        _ => continue,
                    };

                    let frame = match Frame::parse(&text) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!(error = %e, "unreadable gateway frame");
                            continue;
                        }
                    };
                    if frame.seq.is_some() {
                        self.seq = frame.seq;
                    }

                    match frame.into_event() {
                        Ok(Event::HeartbeatAck) => acked = true,
                        Ok(Event::HeartbeatRequest) => {
                            send(&mut sink, heartbeat_payload(self.seq)).await?;
                        }
                        Ok(Event::Reconnect) => {
                            info!("gateway requested a reconnect");
                            return Ok(());
                        }
                        Ok(Event::InvalidSession) => {
                            return Err(DiscordError::Session("invalid session".into()));
                        }
                        Ok(Event::Ready(user)) => self.handler.ready(&user),
                        Ok(Event::MessageCreate(message)) => self.handler.message(message),
                        Ok(Event::Hello { .. }) | Ok(Event::Other) => {}
                        Err(e) => warn!(error = %e, "skipping malformed dispatch"),
                    }
                }
            }
        }
    }
}
