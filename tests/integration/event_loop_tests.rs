//! End-to-end tests of the controller loop with the real queue, timer and
//! display worker.  Delays are kept short so the tests stay fast.

use std::thread;
use std::time::Duration;

use crate::mock_hw::{DisplayCall, MockRelayPin, SharedSwitch};

use mirror_pir::adapters::log_sink::LogEventSink;
use mirror_pir::app::commands::AppCommand;
use mirror_pir::app::ports::DisplayPort;
use mirror_pir::app::service::PresenceController;
use mirror_pir::config::SystemConfig;
use mirror_pir::drivers::display_worker::spawn_display_worker;
use mirror_pir::drivers::relay::{RelaySwitch, RelayTiming};
use mirror_pir::events::{Event, EventQueue};
use mirror_pir::gpio::Level;
use mirror_pir::runner;

fn short_delay() -> SystemConfig {
    SystemConfig {
        power_saving_delay: 0.05,
        ..SystemConfig::default()
    }
}

/// Push `script` from another thread with `gap` between events, then
/// shut the loop down.
fn feed(queue: &EventQueue, script: Vec<Event>, gap: Duration) -> thread::JoinHandle<()> {
    let producer = queue.clone();
    thread::spawn(move || {
        for event in script {
            producer.push(event);
            thread::sleep(gap);
        }
        producer.push(Event::Shutdown);
    })
}

#[test]
fn idle_display_is_switched_off_by_the_worker() {
    let switch = SharedSwitch::default();
    let (display, worker) = spawn_display_worker(switch.clone()).unwrap();
    let queue = EventQueue::new();
    let mut controller = PresenceController::new(short_delay());

    let producer = feed(&queue, vec![Event::PirEdge(Level::Low)], Duration::from_millis(300));
    let mut port = display.clone();
    futures_lite::future::block_on(runner::run(
        &mut controller,
        &queue,
        &mut port,
        &mut LogEventSink::new(),
    ));
    producer.join().unwrap();
    display.shutdown();
    worker.join().unwrap();

    assert_eq!(switch.history(), vec![DisplayCall::Deactivate]);
}

#[test]
fn returning_motion_keeps_display_on() {
    let switch = SharedSwitch::default();
    let (display, worker) = spawn_display_worker(switch.clone()).unwrap();
    let queue = EventQueue::new();
    let config = SystemConfig {
        power_saving_delay: 0.5,
        ..SystemConfig::default()
    };
    let mut controller = PresenceController::new(config);

    let producer = feed(
        &queue,
        vec![Event::PirEdge(Level::Low), Event::PirEdge(Level::High)],
        Duration::from_millis(50),
    );
    let mut port = display.clone();
    futures_lite::future::block_on(runner::run(
        &mut controller,
        &queue,
        &mut port,
        &mut LogEventSink::new(),
    ));
    producer.join().unwrap();
    display.shutdown();
    worker.join().unwrap();

    assert_eq!(switch.history(), vec![DisplayCall::Activate]);
    assert!(controller.debounce_deadline().is_none());
}

#[test]
fn relay_pulses_run_on_the_worker() {
    let pin = MockRelayPin::default();
    let timing = RelayTiming {
        pulse: Duration::from_millis(5),
        settle: Duration::from_millis(5),
    };
    let relay = RelaySwitch::new(pin.clone(), 5, Level::High, timing).with_display_on(false);
    let (display, worker) = spawn_display_worker(relay).unwrap();
    let queue = EventQueue::new();
    let config = SystemConfig {
        relay_pin: Some(5),
        ..short_delay()
    };
    let mut controller = PresenceController::new(config).with_display_on(false);

    let producer = feed(
        &queue,
        vec![
            Event::PirEdge(Level::High),
            Event::Command(AppCommand::VoiceOff),
        ],
        Duration::from_millis(50),
    );
    let mut port = display.clone();
    futures_lite::future::block_on(runner::run(
        &mut controller,
        &queue,
        &mut port,
        &mut LogEventSink::new(),
    ));
    producer.join().unwrap();
    display.shutdown();
    worker.join().unwrap();

    assert_eq!(
        pin.history(),
        vec![Level::High, Level::Low, Level::High, Level::Low]
    );
    assert!(controller.is_voice_locked());
    assert!(!controller.is_display_on());
}

#[test]
fn request_burst_against_slow_relay_settles_on_last_request() {
    let pin = MockRelayPin::default();
    let timing = RelayTiming {
        pulse: Duration::from_millis(10),
        settle: Duration::from_millis(10),
    };
    let relay = RelaySwitch::new(pin.clone(), 5, Level::High, timing);
    let (mut display, worker) = spawn_display_worker(relay).unwrap();

    // 11 alternating requests, starting with off, while pulses take 20 ms.
    for i in 0..11 {
        if i % 2 == 0 {
            display.deactivate();
        } else {
            display.activate();
        }
    }
    display.shutdown();
    worker.join().unwrap();

    let writes = pin.history();
    assert_eq!(writes.len() % 2, 0, "every assert was released");
    let pulses = writes.len() / 2;
    // Relay started on and the last request was off.
    assert_eq!(pulses % 2, 1, "relay left on after {} pulses", pulses);
    assert!(pulses <= 11);
}
