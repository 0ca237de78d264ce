//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every application event through the
//! `log` facade (stderr under `env_logger`).  The binary pairs it with the
//! host bridge sink so each event is both logged and forwarded.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Presence(present) => {
                info!("PRESENCE | {}", if *present { "motion" } else { "idle" });
            }
            AppEvent::AlwaysOn(active) => {
                info!("OVERRIDE | always_on={}", active);
            }
            AppEvent::AlwaysOff(active) => {
                info!("OVERRIDE | always_off={}", active);
            }
            AppEvent::Alert(alert) => {
                info!(
                    "ALERT | {}: {} (timeout={:?}ms)",
                    alert.title.as_deref().unwrap_or("-"),
                    alert.message,
                    alert.timeout_ms,
                );
            }
            AppEvent::WakeRelayed => {
                info!("WAKE | relayed to host");
            }
        }
    }
}
