//! Discord gateway (websocket) client.
//!
//! The gateway delivers the events the bot reacts to. A session goes through:
//!
//! 1. connect and receive `Hello` (op 10) with the heartbeat interval
//! 2. send `Identify` (op 2), or `Resume` (op 6) when a previous session is known
//! 3. heartbeat (op 1) on the interval, the first beat jittered; a missing
//!    `Heartbeat ACK` (op 11) before the next beat means the connection is dead
//! 4. forward `READY`, `MESSAGE_CREATE` and `INTERACTION_CREATE` dispatches
//!
//! `Reconnect` (op 7), `Invalid Session` (op 9) and non-fatal close codes end
//! the session and [`Gateway::run`] starts a new one with exponential backoff.
//! Close codes that indicate a configuration problem (bad token, disallowed
//! intents) are returned as [`Error::FatalClose`].

use std::time::Duration;

use futures::{Sink, SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, interval_at, sleep, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::models::{Interaction, Message, User};

/// Default gateway endpoint.
pub const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// Gateway intents.
pub mod intents {
    pub const GUILDS: u64 = 1 << 0;
    pub const GUILD_MEMBERS: u64 = 1 << 1;
    pub const GUILD_MESSAGES: u64 = 1 << 9;
    pub const MESSAGE_CONTENT: u64 = 1 << 15;

    /// What the streak bot subscribes to.
    pub const DEFAULT: u64 = GUILDS | GUILD_MEMBERS | GUILD_MESSAGES | MESSAGE_CONTENT;
}

/// Gateway opcodes.
pub mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RESUME: u8 = 6;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// Events forwarded to the bot.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// Session established.
    Ready { user: User, session_id: String },
    /// A message was posted.
    MessageCreate(Box<Message>),
    /// A slash command or component interaction.
    InteractionCreate(Box<Interaction>),
}

/// A raw gateway frame.
#[derive(Debug, Clone, Deserialize)]
pub struct Payload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

/// Options for reconnecting after a session ends.
#[derive(Debug, Clone)]
pub struct ReconnectOptions {
    /// Maximum consecutive failed attempts (None = unlimited).
    pub max_attempts: Option<u32>,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay.
    pub max_delay: Duration,
    /// Multiplier applied after each failure.
    pub backoff_multiplier: f64,
}

impl Default for ReconnectOptions {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectOptions {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self
            .backoff_multiplier
            .powi(attempt.saturating_sub(1).min(32) as i32);
        let secs = self.initial_delay.as_secs_f64() * exp;
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Gateway client configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub token: String,
    pub intents: u64,
    pub url: String,
    pub connect_timeout: Duration,
    pub reconnect: ReconnectOptions,
}

impl GatewayConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            intents: intents::DEFAULT,
            url: GATEWAY_URL.to_string(),
            connect_timeout: Duration::from_secs(15),
            reconnect: ReconnectOptions::default(),
        }
    }
}

/// What to do after the server closes the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// Reconnect and try to resume.
    Resume,
    /// Reconnect with a fresh identify.
    Reidentify,
    /// Stop; retrying cannot succeed.
    Fatal,
}

/// Classify a gateway close code.
pub fn close_action(code: u16) -> CloseAction {
    match code {
        // authentication failed, invalid shard, sharding required,
        // invalid API version, invalid intents, disallowed intents
        4004 | 4010 | 4011 | 4012 | 4013 | 4014 => CloseAction::Fatal,
        // invalid seq, session timed out
        4007 | 4009 => CloseAction::Reidentify,
        // normal closure from our side, or going away: the session is gone
        1000 | 1001 => CloseAction::Reidentify,
        _ => CloseAction::Resume,
    }
}

/// Parse a text frame.
pub fn parse_payload(text: &str) -> Result<Payload> {
    serde_json::from_str(text).map_err(|e| Error::Protocol(format!("bad frame: {e}")))
}

pub fn identify_payload(token: &str, intents: u64) -> Value {
    json!({
        "op": opcode::IDENTIFY,
        "d": {
            "token": token,
            "intents": intents,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "streak-bot",
                "device": "streak-bot"
            }
        }
    })
}

pub fn resume_payload(token: &str, session_id: &str, seq: Option<u64>) -> Value {
    json!({
        "op": opcode::RESUME,
        "d": { "token": token, "session_id": session_id, "seq": seq }
    })
}

pub fn heartbeat_payload(seq: Option<u64>) -> Value {
    json!({ "op": opcode::HEARTBEAT, "d": seq })
}

/// Decode a dispatch into an event, `None` for dispatches the bot ignores.
pub fn decode_dispatch(kind: &str, data: Value) -> Result<Option<GatewayEvent>> {
    let event = match kind {
        "READY" => {
            #[derive(Deserialize)]
            struct Ready {
                user: User,
                session_id: String,
            }
            let ready: Ready = serde_json::from_value(data)?;
            GatewayEvent::Ready {
                user: ready.user,
                session_id: ready.session_id,
            }
        }
        "MESSAGE_CREATE" => GatewayEvent::MessageCreate(Box::new(serde_json::from_value(data)?)),
        "INTERACTION_CREATE" => {
            GatewayEvent::InteractionCreate(Box::new(serde_json::from_value(data)?))
        }
        _ => return Ok(None),
    };
    Ok(Some(event))
}

/// Resumable session state carried across connections.
#[derive(Debug, Clone, Default)]
struct Session {
    id: Option<String>,
    resume_url: Option<String>,
    seq: Option<u64>,
}

impl Session {
    fn clear(&mut self) {
        *self = Self::default();
    }

    fn can_resume(&self) -> bool {
        self.id.is_some()
    }
}

/// Why a session ended.
#[derive(Debug)]
enum SessionEnd {
    Shutdown,
    Reconnect,
}

/// Discord gateway client.
pub struct Gateway {
    config: GatewayConfig,
    session: Session,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            session: Session::default(),
        }
    }

    /// Run sessions until `shutdown` flips to true or the receiver is dropped.
    pub async fn run(
        mut self,
        events: mpsc::Sender<GatewayEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut attempt = 0u32;

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            match self.run_session(&events, &mut shutdown).await {
                Ok(SessionEnd::Shutdown) => {
                    info!("Gateway shut down");
                    return Ok(());
                }
                Ok(SessionEnd::Reconnect) => {
                    attempt = 0;
                    debug!("Gateway session ended, reconnecting");
                }
                Err(e @ Error::FatalClose { .. }) => {
                    error!("{}", e);
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    if let Some(max) = self.config.reconnect.max_attempts
                        && attempt > max
                    {
                        error!("Gateway failed {} times, giving up: {}", max, e);
                        return Err(e);
                    }
                    let delay = self.config.reconnect.delay_for_attempt(attempt);
                    warn!(
                        "Gateway error: {} (attempt {}, retrying in {:?})",
                        e, attempt, delay
                    );
                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = shutdown.changed() => return Ok(()),
                    }
                }
            }
        }
    }

    async fn run_session(
        &mut self,
        events: &mpsc::Sender<GatewayEvent>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd> {
        let url = self
            .session
            .resume_url
            .as_deref()
            .map(|u| format!("{}/?v=10&encoding=json", u.trim_end_matches('/')))
            .unwrap_or_else(|| self.config.url.clone());

        debug!("Connecting to gateway at {}", url);
        let (stream, _response) = timeout(self.config.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| Error::Timeout(self.config.connect_timeout))?
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        let (mut writer, mut reader) = stream.split();

        let hello = match timeout(self.config.connect_timeout, reader.next()).await {
            Ok(Some(Ok(WsMessage::Text(text)))) => parse_payload(text.as_str())?,
            Ok(Some(Ok(other))) => {
                return Err(Error::Protocol(format!("expected Hello, got {other:?}")));
            }
            Ok(Some(Err(e))) => return Err(Error::WebSocket(e.to_string())),
            Ok(None) => return Err(Error::WebSocket("closed before Hello".to_string())),
            Err(_) => return Err(Error::Timeout(self.config.connect_timeout)),
        };
        if hello.op != opcode::HELLO {
            return Err(Error::Protocol(format!("expected Hello, got op {}", hello.op)));
        }
        let interval_ms = hello
            .d
            .get("heartbeat_interval")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::Protocol("Hello without heartbeat_interval".to_string()))?;
        let heartbeat_every = Duration::from_millis(interval_ms);

        let handshake = match &self.session.id {
            Some(session_id) if self.session.can_resume() => {
                info!("Resuming gateway session");
                resume_payload(&self.config.token, session_id, self.session.seq)
            }
            _ => {
                info!("Identifying with gateway");
                identify_payload(&self.config.token, self.config.intents)
            }
        };
        send_json(&mut writer, &handshake).await?;

        let first_beat = heartbeat_every.mul_f64(rand::random::<f64>());
        let mut heartbeat = interval_at(Instant::now() + first_beat, heartbeat_every);
        let mut acked = true;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    let _ = writer.send(WsMessage::Close(None)).await;
                    return Ok(SessionEnd::Shutdown);
                }
                _ = heartbeat.tick() => {
                    if !acked {
                        warn!("Heartbeat not acknowledged, reconnecting");
                        let _ = writer.send(WsMessage::Close(None)).await;
                        return Ok(SessionEnd::Reconnect);
                    }
                    acked = false;
                    send_json(&mut writer, &heartbeat_payload(self.session.seq)).await?;
                }
                frame = reader.next() => {
                    let frame = match frame {
                        Some(Ok(frame)) => frame,
                        Some(Err(e)) => return Err(Error::WebSocket(e.to_string())),
                        None => return Err(Error::WebSocket("connection closed".to_string())),
                    };

                    let text = match frame {
                        WsMessage::Text(text) => text,
                        WsMessage::Close(frame) => return self.handle_close(frame),
                        _ => continue,
                    };

                    let payload = match parse_payload(text.as_str()) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!("{}", e);
                            continue;
                        }
                    };
                    if payload.s.is_some() {
                        self.session.seq = payload.s;
                    }

                    match payload.op {
                        opcode::DISPATCH => {
                            let Some(kind) = payload.t.as_deref() else {
                                continue;
                            };
                            if kind == "READY" {
                                self.session.id = payload.d.get("session_id").and_then(Value::as_str).map(str::to_string);
                                self.session.resume_url = payload.d.get("resume_gateway_url").and_then(Value::as_str).map(str::to_string);
                            } else if kind == "RESUMED" {
                                info!("Gateway session resumed");
                            }
                            match decode_dispatch(kind, payload.d) {
                                Ok(Some(event)) => {
                                    if events.send(event).await.is_err() {
                                        debug!("Event receiver dropped, closing gateway");
                                        let _ = writer.send(WsMessage::Close(None)).await;
                                        return Ok(SessionEnd::Shutdown);
                                    }
                                }
                                Ok(None) => {}
                                Err(e) => warn!("Failed to decode {} dispatch: {}", kind, e),
                            }
                        }
                        opcode::HEARTBEAT => {
                            send_json(&mut writer, &heartbeat_payload(self.session.seq)).await?;
                        }
                        opcode::HEARTBEAT_ACK => acked = true,
                        opcode::RECONNECT => {
                            info!("Gateway requested reconnect");
                            return Ok(SessionEnd::Reconnect);
                        }
                        opcode::INVALID_SESSION => {
                            let resumable = payload.d.as_bool().unwrap_or(false);
                            warn!("Gateway session invalidated (resumable: {})", resumable);
                            if !resumable {
                                self.session.clear();
                            }
                            // Discord asks for a 1-5s pause before identifying again.
                            sleep(Duration::from_millis(1000 + rand::random::<u64>() % 4000)).await;
                            return Ok(SessionEnd::Reconnect);
                        }
                        other => debug!("Ignoring gateway op {}", other),
                    }
                }
            }
        }
    }

    fn handle_close(&mut self, frame: Option<CloseFrame>) -> Result<SessionEnd> {
        let (code, reason) = frame
            .map(|f| (u16::from(f.code), f.reason.to_string()))
            .unwrap_or((1000, String::new()));

        match close_action(code) {
            CloseAction::Fatal => Err(Error::FatalClose { code, reason }),
            CloseAction::Reidentify => {
                info!("Gateway closed ({} {}), starting a new session", code, reason);
                self.session.clear();
                Ok(SessionEnd::Reconnect)
            }
            CloseAction::Resume => {
                info!("Gateway closed ({} {}), resuming", code, reason);
                Ok(SessionEnd::Reconnect)
            }
        }
    }
}

async fn send_json<S>(writer: &mut S, value: &Value) -> Result<()>
where
    S: Sink<WsMessage> + Unpin,
    S::Error: std::fmt::Display,
{
    writer
        .send(WsMessage::Text(value.to_string().into()))
        .await
        .map_err(|e| Error::WebSocket(e.to_string()))
}
