//! Integration tests for the PresenceController → display pipeline.
//!
//! Time is passed in explicitly, so debounce expiry is checked by handing
//! the controller a later `Instant` rather than by sleeping.

use std::time::{Duration, Instant};

use crate::mock_hw::{DisplayCall, InlineRelay, MockDisplay, MockRelayPin, RecordingSink};

use mirror_pir::app::commands::AppCommand;
use mirror_pir::app::events::{Alert, AppEvent};
use mirror_pir::app::service::{PowerState, PresenceController};
use mirror_pir::config::SystemConfig;
use mirror_pir::events::Event;
use mirror_pir::gpio::Level;

fn relay_config() -> SystemConfig {
    SystemConfig {
        relay_pin: Some(5),
        relay_state: Level::High,
        sensor_pin: 22,
        sensor_state: Level::High,
        power_saving: true,
        power_saving_delay: 10.0,
        ..SystemConfig::default()
    }
}

fn shell_config() -> SystemConfig {
    SystemConfig {
        power_saving_delay: 10.0,
        always_on_pin: Some(23),
        always_off_pin: Some(24),
        ..SystemConfig::default()
    }
}

// ── Relay mode ────────────────────────────────────────────────

#[test]
fn motion_wakes_display_and_idle_turns_it_off_after_delay() {
    let pin = MockRelayPin::default();
    let mut display = InlineRelay::new(pin.clone(), Level::High);
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(relay_config()).with_display_on(false);
    let t0 = Instant::now();

    c.handle_event(Event::PirEdge(Level::High), t0, &mut display, &mut sink);
    assert_eq!(pin.history(), vec![Level::High, Level::Low]);
    assert_eq!(sink.events, vec![AppEvent::Presence(true)]);
    assert!(c.is_display_on());

    c.handle_event(Event::PirEdge(Level::Low), t0, &mut display, &mut sink);
    assert_eq!(sink.presence(), vec![true, false]);
    assert_eq!(c.debounce_deadline(), Some(t0 + Duration::from_secs(10)));
    assert_eq!(c.power_state(), PowerState::PendingDeactivation);

    assert!(!c.poll_debounce(t0 + Duration::from_secs(9), &mut display));
    assert_eq!(display.pulses(), 1);

    assert!(c.poll_debounce(t0 + Duration::from_secs(10), &mut display));
    assert_eq!(display.pulses(), 2);
    assert_eq!(
        pin.history(),
        vec![Level::High, Level::Low, Level::High, Level::Low]
    );
    assert_eq!(c.power_state(), PowerState::Inactive);
}

#[test]
fn motion_within_delay_cancels_deactivation() {
    let pin = MockRelayPin::default();
    let mut display = InlineRelay::new(pin.clone(), Level::High);
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(relay_config());
    let t0 = Instant::now();

    c.handle_event(Event::PirEdge(Level::Low), t0, &mut display, &mut sink);
    c.handle_event(
        Event::PirEdge(Level::High),
        t0 + Duration::from_secs(5),
        &mut display,
        &mut sink,
    );

    assert!(c.debounce_deadline().is_none());
    assert!(!c.poll_debounce(t0 + Duration::from_secs(30), &mut display));
    // Display was already on: no toggle at all.
    assert_eq!(display.pulses(), 0);
    assert!(pin.history().is_empty());
    assert_eq!(sink.presence(), vec![false, true]);
}

#[test]
fn relay_never_toggles_twice_in_the_same_direction() {
    let pin = MockRelayPin::default();
    let mut display = InlineRelay::new(pin, Level::High);
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(relay_config());
    let t0 = Instant::now();

    c.handle_event(Event::PirEdge(Level::Low), t0, &mut display, &mut sink);
    assert!(c.poll_debounce(t0 + Duration::from_secs(10), &mut display));
    c.try_deactivate(&mut display);
    assert_eq!(display.pulses(), 1);

    c.handle_command(AppCommand::ExternalWake, &mut display, &mut sink);
    c.handle_event(Event::PirEdge(Level::High), t0, &mut display, &mut sink);
    assert_eq!(display.pulses(), 2);
}

#[test]
fn voice_lock_holds_display_off_until_voice_on() {
    let pin = MockRelayPin::default();
    let mut display = InlineRelay::new(pin, Level::High);
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(relay_config());
    let t0 = Instant::now();

    c.handle_command(AppCommand::VoiceOff, &mut display, &mut sink);
    assert!(c.is_voice_locked());
    assert_eq!(display.pulses(), 1);

    c.handle_event(Event::PirEdge(Level::High), t0, &mut display, &mut sink);
    c.handle_command(AppCommand::ExternalWake, &mut display, &mut sink);
    assert_eq!(display.pulses(), 1, "locked display must stay off");

    // A second voice off is a no-op.
    c.handle_command(AppCommand::VoiceOff, &mut display, &mut sink);
    assert_eq!(display.pulses(), 1);

    c.handle_command(AppCommand::VoiceOn, &mut display, &mut sink);
    assert!(!c.is_voice_locked());
    assert_eq!(display.pulses(), 2);
    assert!(c.is_display_on());
}

// ── Overrides ─────────────────────────────────────────────────

#[test]
fn always_off_suppresses_activation() {
    let mut display = MockDisplay::new();
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(shell_config());
    let t0 = Instant::now();

    c.handle_event(Event::AlwaysOffEdge(Level::High), t0, &mut display, &mut sink);
    assert_eq!(display.calls, vec![DisplayCall::Deactivate]);
    assert_eq!(sink.events, vec![AppEvent::AlwaysOff(true)]);

    c.handle_event(Event::PirEdge(Level::High), t0, &mut display, &mut sink);
    assert_eq!(sink.presence(), vec![true]);
    assert_eq!(display.activations(), 0);
}

#[test]
fn always_off_wins_over_always_on() {
    let mut display = MockDisplay::new();
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(shell_config());
    let t0 = Instant::now();

    c.handle_event(Event::AlwaysOnEdge(Level::High), t0, &mut display, &mut sink);
    c.handle_event(Event::AlwaysOffEdge(Level::High), t0, &mut display, &mut sink);
    assert_eq!(display.calls, vec![DisplayCall::Deactivate]);

    c.handle_event(Event::PirEdge(Level::High), t0, &mut display, &mut sink);
    c.handle_command(AppCommand::ExternalWake, &mut display, &mut sink);
    assert_eq!(display.activations(), 0);

    // Releasing always-off brings the display back.
    c.handle_event(Event::AlwaysOffEdge(Level::Low), t0, &mut display, &mut sink);
    assert_eq!(display.activations(), 1);
}

#[test]
fn always_on_blocks_idle_deactivation() {
    let mut display = MockDisplay::new();
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(shell_config());
    let t0 = Instant::now();

    c.handle_event(Event::AlwaysOnEdge(Level::High), t0, &mut display, &mut sink);
    c.handle_event(Event::PirEdge(Level::Low), t0, &mut display, &mut sink);
    assert!(c.poll_debounce(t0 + Duration::from_secs(10), &mut display));
    assert_eq!(display.deactivations(), 0);
}

#[test]
fn always_on_edge_cancels_pending_deactivation() {
    let mut display = MockDisplay::new();
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(shell_config());
    let t0 = Instant::now();

    c.handle_event(Event::PirEdge(Level::Low), t0, &mut display, &mut sink);
    assert!(c.debounce_deadline().is_some());
    c.handle_event(Event::AlwaysOnEdge(Level::High), t0, &mut display, &mut sink);
    assert!(c.debounce_deadline().is_none());
}

#[test]
fn always_on_edges_raise_titled_alerts() {
    let mut display = MockDisplay::new();
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(shell_config());
    let t0 = Instant::now();

    c.handle_event(Event::AlwaysOnEdge(Level::High), t0, &mut display, &mut sink);
    c.handle_event(Event::AlwaysOnEdge(Level::Low), t0, &mut display, &mut sink);

    let titles: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Alert(Alert { title, timeout_ms, .. }) => {
                assert_eq!(*timeout_ms, Some(4_000));
                title.clone()
            }
            _ => None,
        })
        .collect();
    assert_eq!(titles, vec!["Always-On Activated", "Always-On Deactivated"]);
    assert!(!c.overrides().is_always_on_active());
}

#[test]
fn seeded_always_off_blocks_motion_silently() {
    let mut display = MockDisplay::new();
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(shell_config());
    c.seed_overrides(false, true);
    assert!(sink.events.is_empty());

    c.handle_event(Event::PirEdge(Level::High), Instant::now(), &mut display, &mut sink);
    assert_eq!(display.activations(), 0);
}

// ── Power saving ──────────────────────────────────────────────

#[test]
fn power_saving_disabled_only_reports_presence() {
    let config = SystemConfig {
        power_saving: false,
        ..SystemConfig::default()
    };
    let mut display = MockDisplay::new();
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(config);
    let t0 = Instant::now();

    for level in [Level::High, Level::Low, Level::High, Level::Low] {
        c.handle_event(Event::PirEdge(level), t0, &mut display, &mut sink);
        assert!(c.debounce_deadline().is_none());
    }
    assert_eq!(sink.presence(), vec![true, false, true, false]);
    assert!(display.calls.is_empty());
    assert_eq!(c.debounce().armed_count(), 0);
}

#[test]
fn idle_notification_follows_presence_false() {
    let config = SystemConfig {
        power_saving_notification: true,
        ..SystemConfig::default()
    };
    let mut display = MockDisplay::new();
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(config);

    c.handle_event(Event::PirEdge(Level::Low), Instant::now(), &mut display, &mut sink);
    assert_eq!(
        sink.events,
        vec![
            AppEvent::Presence(false),
            AppEvent::Alert(Alert::notification(
                "Monitor will be turn Off by PIR module"
            )),
        ]
    );
}

#[test]
fn idle_notification_is_sent_without_power_saving() {
    let config = SystemConfig {
        power_saving: false,
        power_saving_notification: true,
        power_saving_message: "Bye".into(),
        ..SystemConfig::default()
    };
    let mut display = MockDisplay::new();
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(config);

    c.handle_event(Event::PirEdge(Level::Low), Instant::now(), &mut display, &mut sink);
    assert_eq!(
        sink.events,
        vec![
            AppEvent::Presence(false),
            AppEvent::Alert(Alert::notification("Bye")),
        ]
    );
    assert!(c.debounce_deadline().is_none());
    assert!(display.calls.is_empty());
}

#[test]
fn out_of_range_delay_keeps_display_on() {
    // Bypasses validate(): the controller must neither panic nor switch
    // the display off straight away.
    for delay in [1e19, 1e30] {
        let config = SystemConfig {
            power_saving_delay: delay,
            ..SystemConfig::default()
        };
        let mut display = MockDisplay::new();
        let mut sink = RecordingSink::new();
        let mut c = PresenceController::new(config);
        let t0 = Instant::now();

        c.handle_event(Event::PirEdge(Level::Low), t0, &mut display, &mut sink);
        assert!(!c.poll_debounce(t0, &mut display));
        assert!(!c.poll_debounce(t0 + Duration::from_secs(86_400), &mut display));
        assert!(display.calls.is_empty(), "delay {}", delay);
        assert!(c.is_display_on());
    }
}

#[test]
fn active_low_sensor_is_respected() {
    let config = SystemConfig {
        sensor_state: Level::Low,
        ..SystemConfig::default()
    };
    let mut display = MockDisplay::new();
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(config);

    c.handle_event(Event::PirEdge(Level::Low), Instant::now(), &mut display, &mut sink);
    assert_eq!(sink.presence(), vec![true]);
    assert_eq!(display.activations(), 1);
}

#[test]
fn external_wake_cancels_timer_and_is_relayed() {
    let mut display = MockDisplay::new();
    let mut sink = RecordingSink::new();
    let mut c = PresenceController::new(shell_config());
    let t0 = Instant::now();

    c.handle_event(Event::PirEdge(Level::Low), t0, &mut display, &mut sink);
    c.handle_event(
        Event::Command(AppCommand::ExternalWake),
        t0,
        &mut display,
        &mut sink,
    );
    assert!(c.debounce_deadline().is_none());
    assert_eq!(display.calls, vec![DisplayCall::Activate]);
    assert_eq!(sink.events.last(), Some(&AppEvent::WakeRelayed));
}
