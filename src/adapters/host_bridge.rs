//! Host bridge — line-delimited JSON over stdio.
//!
//! The mirror host talks to this process with one JSON object per line:
//!
//! ```text
//! {"notification": "SCREEN_WAKEUP", "payload": null}
//! ```
//!
//! | Direction | Notification        | Payload                        |
//! |-----------|---------------------|--------------------------------|
//! | in        | `CONFIG`            | configuration object           |
//! | in        | `SCREEN_WAKEUP`     | ignored                        |
//! | in        | `ALEXA_MIRROR_ON`   | ignored                        |
//! | in        | `ALEXA_MIRROR_OFF`  | ignored                        |
//! | out       | `USER_PRESENCE`     | bool                           |
//! | out       | `ALWAYS_ON`         | bool                           |
//! | out       | `ALWAYS_OFF`        | bool                           |
//! | out       | `SHOW_ALERT`        | `{title?, message, timer?}`    |
//! | out       | `SCREEN_WAKEUP`     | null                           |
//!
//! Only the first valid `CONFIG` starts the controller; commands that
//! arrive before it are dropped.  End of input shuts the controller down.

use core::fmt;
use std::io::{self, Write};
use std::thread::JoinHandle;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::commands::AppCommand;
use crate::app::events::{Alert, AppEvent};
use crate::app::ports::EventSink;
use crate::config::SystemConfig;
use crate::events::{Event, EventQueue};

// ───────────────────────────────────────────────────────────────
// Inbound
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawHostMessage {
    notification: String,
    #[serde(default)]
    payload: Value,
}

/// A decoded inbound line.
#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    /// Configuration payload, not yet validated.
    Config(Value),
    Command(AppCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Not a `{"notification", "payload"}` JSON object.
    Malformed(String),
    /// Well-formed, but not a notification this process handles.
    UnknownNotification(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed host message: {e}"),
            Self::UnknownNotification(n) => write!(f, "unknown notification {n:?}"),
        }
    }
}

impl std::error::Error for BridgeError {}

impl HostMessage {
    pub fn parse(line: &str) -> Result<Self, BridgeError> {
        let raw: RawHostMessage =
            serde_json::from_str(line).map_err(|e| BridgeError::Malformed(e.to_string()))?;
        match raw.notification.as_str() {
            "CONFIG" => Ok(Self::Config(raw.payload)),
            "SCREEN_WAKEUP" => Ok(Self::Command(AppCommand::ExternalWake)),
            "ALEXA_MIRROR_ON" => Ok(Self::Command(AppCommand::VoiceOn)),
            "ALEXA_MIRROR_OFF" => Ok(Self::Command(AppCommand::VoiceOff)),
            _ => Err(BridgeError::UnknownNotification(raw.notification)),
        }
    }
}

/// What the bridge wants done with an accepted message.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeAction {
    Start(SystemConfig),
    Forward(AppCommand),
}

/// Inbound protocol state: has the controller been started yet?
#[derive(Debug, Default)]
pub struct HostBridge {
    started: bool,
}

impl HostBridge {
    /// A bridge still waiting for its `CONFIG`.
    pub fn new() -> Self {
        Self { started: false }
    }

    /// A bridge whose configuration came from elsewhere (`--config`).
    pub fn already_started() -> Self {
        Self { started: true }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn accept(&mut self, msg: HostMessage) -> Option<BridgeAction> {
        match msg {
            HostMessage::Config(_) if self.started => {
                info!("Host: CONFIG ignored, controller already configured");
                None
            }
            HostMessage::Config(payload) => {
                let config = SystemConfig::from_value(payload)
                    .and_then(|c| c.validate().map(|()| c));
                match config {
                    Ok(config) => {
                        self.started = true;
                        Some(BridgeAction::Start(config))
                    }
                    Err(e) => {
                        warn!("Host: CONFIG rejected: {}", e);
                        None
                    }
                }
            }
            HostMessage::Command(cmd) if !self.started => {
                debug!("Host: {:?} dropped, not configured yet", cmd);
                None
            }
            HostMessage::Command(cmd) => Some(BridgeAction::Forward(cmd)),
        }
    }

    /// Parse and accept one raw line.  Bad lines are logged and dropped.
    pub fn handle_line(&mut self, line: &str) -> Option<BridgeAction> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match HostMessage::parse(line) {
            Ok(msg) => self.accept(msg),
            Err(e) => {
                warn!("Host: {}", e);
                None
            }
        }
    }
}

/// Read lines until the first valid `CONFIG`.  `None` on end of input.
pub fn await_config<I>(lines: &mut I, bridge: &mut HostBridge) -> Option<SystemConfig>
where
    I: Iterator<Item = io::Result<String>>,
{
    for line in lines {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Host: read failed: {}", e);
                return None;
            }
        };
        if let Some(BridgeAction::Start(config)) = bridge.handle_line(&line) {
            return Some(config);
        }
    }
    None
}

/// Feed host commands into `queue` until end of input, then push
/// [`Event::Shutdown`].
pub fn forward_host_input<I>(lines: I, bridge: &mut HostBridge, queue: &EventQueue)
where
    I: Iterator<Item = io::Result<String>>,
{
    for line in lines {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Host: read failed: {}", e);
                break;
            }
        };
        if let Some(BridgeAction::Forward(cmd)) = bridge.handle_line(&line) {
            queue.push(Event::Command(cmd));
        }
    }
    info!("Host: input closed, shutting down");
    queue.push(Event::Shutdown);
}

/// Run [`forward_host_input`] on its own thread.
pub fn spawn_host_reader<I>(
    lines: I,
    mut bridge: HostBridge,
    queue: EventQueue,
) -> io::Result<JoinHandle<()>>
where
    I: Iterator<Item = io::Result<String>> + Send + 'static,
{
    std::thread::Builder::new()
        .name("host-reader".into())
        .spawn(move || forward_host_input(lines, &mut bridge, &queue))
}

// ───────────────────────────────────────────────────────────────
// Outbound
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AlertPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timer: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Payload<'a> {
    Flag(bool),
    Alert(AlertPayload<'a>),
    Empty,
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    notification: &'static str,
    payload: Payload<'a>,
}

fn outbound(event: &AppEvent) -> OutboundMessage<'_> {
    let (notification, payload) = match event {
        AppEvent::Presence(present) => ("USER_PRESENCE", Payload::Flag(*present)),
        AppEvent::AlwaysOn(active) => ("ALWAYS_ON", Payload::Flag(*active)),
        AppEvent::AlwaysOff(active) => ("ALWAYS_OFF", Payload::Flag(*active)),
        AppEvent::Alert(alert) => ("SHOW_ALERT", Payload::Alert(alert_payload(alert))),
        AppEvent::WakeRelayed => ("SCREEN_WAKEUP", Payload::Empty),
    };
    OutboundMessage {
        notification,
        payload,
    }
}

fn alert_payload(alert: &Alert) -> AlertPayload<'_> {
    AlertPayload {
        title: alert.title.as_deref(),
        message: &alert.message,
        timer: alert.timeout_ms,
    }
}

/// Encode one event as a host line (no trailing newline).
pub fn encode_event(event: &AppEvent) -> String {
    serde_json::to_string(&outbound(event)).unwrap_or_default()
}

/// [`EventSink`] writing one JSON line per event.
pub struct JsonLineSink<W> {
    out: W,
}

impl JsonLineSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write> EventSink for JsonLineSink<W> {
    fn emit(&mut self, event: &AppEvent) {
        let line = encode_event(event);
        if let Err(e) = self.write_line(&line) {
            warn!("Host: write failed, {:?} not delivered: {}", event, e);
        }
    }
}
