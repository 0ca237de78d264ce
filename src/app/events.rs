//! Outbound application events.
//!
//! The [`PresenceController`](super::service::PresenceController) emits
//! these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them: log them,
//! forward them to the mirror host, etc.

/// Timeout attached to override-switch alerts.
pub const OVERRIDE_ALERT_TIMEOUT_MS: u32 = 4_000;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Mirrors every PIR transition (`true` = motion present).
    Presence(bool),

    /// The always-on switch changed.
    AlwaysOn(bool),

    /// The always-off switch changed.
    AlwaysOff(bool),

    /// Human-facing notice shown by the host.
    Alert(Alert),

    /// An external wake request was handled; relayed back to the host.
    WakeRelayed,
}

/// A notice for the host to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: Option<String>,
    pub message: String,
    /// How long the host should show it; `None` leaves it to the host.
    pub timeout_ms: Option<u32>,
}

impl Alert {
    pub fn new(title: &str, message: &str, timeout_ms: u32) -> Self {
        Self {
            title: Some(title.to_owned()),
            message: message.to_owned(),
            timeout_ms: Some(timeout_ms),
        }
    }

    /// An untitled notice with the host's default timeout.
    pub fn notification(message: &str) -> Self {
        Self {
            title: None,
            message: message.to_owned(),
            timeout_ms: None,
        }
    }
}
