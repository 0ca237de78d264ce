//! Presence controller — the hexagonal core.
//!
//! [`PresenceController`] owns the debounce timer, the override tracker,
//! the voice lock and the last commanded display state.  It exposes a
//! clean, hardware-agnostic API.  All I/O flows through port traits
//! injected at call sites, making the entire controller testable with
//! mock adapters.
//!
//! ```text
//!  Event ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!            │     PresenceController        │
//!  Instant ─▶│  Overrides · Debounce · Lock  │ ──▶ DisplayPort
//!            └──────────────────────────────┘
//! ```
//!
//! The controller is driven by exactly one caller (the controller loop),
//! so no locking happens here: serialisation is the loop's job.

use std::time::Instant;

use log::{debug, info};

use crate::config::SystemConfig;
use crate::events::Event;
use crate::gpio::Level;

use super::commands::AppCommand;
use super::debounce::DebounceTimer;
use super::events::{Alert, AppEvent, OVERRIDE_ALERT_TIMEOUT_MS};
use super::overrides::OverrideTracker;
use super::ports::{DisplayPort, EventSink};

/// Conceptual power state, derived from the runtime flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Display on, no deactivation pending.
    Active,
    /// Motion stopped; the debounce timer is running.
    PendingDeactivation,
    /// Display off.
    Inactive,
}

// ───────────────────────────────────────────────────────────────
// PresenceController
// ───────────────────────────────────────────────────────────────

/// The presence controller reconciles every input into one display state.
pub struct PresenceController {
    config: SystemConfig,
    overrides: OverrideTracker,
    debounce: DebounceTimer,
    /// Last commanded display state.  Starts `true`: the display is
    /// assumed on at startup.
    display_on: bool,
    /// Set by a voice "off"; only a voice "on" clears it.
    voice_lock: bool,
}

impl PresenceController {
    /// Construct the controller from configuration.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            config,
            overrides: OverrideTracker::new(),
            debounce: DebounceTimer::new(),
            display_on: true,
            voice_lock: false,
        }
    }

    /// Override the assumed initial display state.
    pub fn with_display_on(mut self, on: bool) -> Self {
        self.display_on = on;
        self
    }

    /// Record the override switch positions read at startup.
    /// No notifications are emitted.
    pub fn seed_overrides(&mut self, always_on: bool, always_off: bool) {
        self.overrides.seed(always_on, always_off);
        if always_on || always_off {
            info!(
                "Overrides at startup: always_on={} always_off={}",
                always_on, always_off
            );
        }
    }

    // ── Event dispatch ────────────────────────────────────────

    /// Process one event from the queue.
    ///
    /// `now` is the time the event is handled; it anchors the debounce
    /// deadline.  [`Event::Shutdown`] is the loop's concern and is ignored.
    pub fn handle_event(
        &mut self,
        event: Event,
        now: Instant,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        match event {
            Event::PirEdge(level) => self.on_pir_edge(level, now, display, sink),
            Event::AlwaysOnEdge(level) => self.on_always_on_edge(level, sink),
            Event::AlwaysOffEdge(level) => self.on_always_off_edge(level, display, sink),
            Event::Command(cmd) => self.handle_command(cmd, display, sink),
            Event::Shutdown => {}
        }
    }

    /// PIR line changed.
    pub fn on_pir_edge(
        &mut self,
        level: Level,
        now: Instant,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        if level == self.config.sensor_state {
            sink.emit(&AppEvent::Presence(true));
            self.debounce.cancel();
            if self.config.power_saving {
                self.try_activate(display);
            }
            return;
        }

        sink.emit(&AppEvent::Presence(false));
        if self.config.power_saving_notification {
            sink.emit(&AppEvent::Alert(Alert::notification(
                &self.config.power_saving_message,
            )));
        }
        if !self.config.power_saving {
            return;
        }

        let delay = self.config.power_saving_delay();
        if self.debounce.arm(now, delay) {
            debug!("Debounce re-armed, previous deadline dropped");
        }
        debug!("No motion, display off in {:?}", delay);
    }

    /// Always-on switch changed.
    pub fn on_always_on_edge(&mut self, level: Level, sink: &mut impl EventSink) {
        let active = level == self.config.always_on_state;
        self.overrides.set_always_on(active);
        sink.emit(&AppEvent::AlwaysOn(active));

        if active {
            info!("Always-on override engaged");
            sink.emit(&AppEvent::Alert(Alert::new(
                "Always-On Activated",
                "Mirror will not activate power-saving mode",
                OVERRIDE_ALERT_TIMEOUT_MS,
            )));
            if self.config.power_saving {
                self.debounce.cancel();
            }
        } else {
            info!("Always-on override released");
            sink.emit(&AppEvent::Alert(Alert::new(
                "Always-On Deactivated",
                "Mirror will now use motion sensor to activate",
                OVERRIDE_ALERT_TIMEOUT_MS,
            )));
        }
    }

    /// Always-off switch changed.
    pub fn on_always_off_edge(
        &mut self,
        level: Level,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        let active = level == self.config.always_off_state;
        self.overrides.set_always_off(active);
        sink.emit(&AppEvent::AlwaysOff(active));

        if active {
            info!("Always-off override engaged");
            self.try_deactivate(display);
        } else {
            info!("Always-off override released");
            self.try_activate(display);
            if self.config.power_saving {
                self.debounce.cancel();
            }
        }
    }

    /// Process a host command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::ExternalWake => {
                self.debounce.cancel();
                self.try_activate(display);
                sink.emit(&AppEvent::WakeRelayed);
            }
            AppCommand::VoiceOn => {
                if !self.voice_lock {
                    debug!("Voice on ignored: not voice locked");
                    return;
                }
                info!("Voice on: releasing voice lock");
                self.voice_lock = false;
                self.debounce.cancel();
                self.try_activate(display);
            }
            AppCommand::VoiceOff => {
                if self.voice_lock {
                    debug!("Voice off ignored: already voice locked");
                    return;
                }
                info!("Voice off: display off until voice on");
                // Deactivate first: the lock would veto a relay pulse.
                self.try_deactivate(display);
                self.voice_lock = true;
            }
        }
    }

    /// Fire the debounce timer if its deadline has passed.
    /// Returns `true` if a deactivation was attempted.
    pub fn poll_debounce(&mut self, now: Instant, display: &mut impl DisplayPort) -> bool {
        if !self.debounce.take_expired(now) {
            return false;
        }
        info!("No motion for {:?}, power saving", self.config.power_saving_delay());
        self.try_deactivate(display);
        true
    }

    // ── Gated driver calls ────────────────────────────────────

    /// Turn the display on unless an override or the voice lock forbids it.
    ///
    /// The voice lock is honoured in shell mode as well as relay mode, so
    /// a voice-off display stays off until voice-on even without a relay.
    pub fn try_activate(&mut self, display: &mut impl DisplayPort) {
        if self.overrides.blocks_activation() {
            debug!("Activation suppressed: always-off override");
            return;
        }
        if self.voice_lock {
            debug!("Activation suppressed: voice locked");
            return;
        }
        if self.config.relay_mode() {
            if self.display_on {
                return;
            }
            info!("Activating display");
            display.activate();
            self.display_on = true;
        } else {
            display.activate();
        }
    }

    /// Turn the display off unless always-on (without always-off) forbids it.
    pub fn try_deactivate(&mut self, display: &mut impl DisplayPort) {
        if self.overrides.blocks_deactivation() {
            debug!("Deactivation suppressed: always-on override");
            return;
        }
        if self.config.relay_mode() {
            if self.voice_lock || !self.display_on {
                return;
            }
            info!("Deactivating display");
            display.deactivate();
            self.display_on = false;
        } else {
            display.deactivate();
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn power_state(&self) -> PowerState {
        if self.debounce.is_armed() {
            PowerState::PendingDeactivation
        } else if self.display_on {
            PowerState::Active
        } else {
            PowerState::Inactive
        }
    }

    /// Last commanded display state (exact in relay mode only).
    pub fn is_display_on(&self) -> bool {
        self.display_on
    }

    pub fn is_voice_locked(&self) -> bool {
        self.voice_lock
    }

    pub fn overrides(&self) -> &OverrideTracker {
        &self.overrides
    }

    pub fn debounce(&self) -> &DebounceTimer {
        &self.debounce
    }

    /// Deadline the controller loop must wake for, if any.
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }
}
