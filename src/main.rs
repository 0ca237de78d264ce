//! Mirror PIR — main entry point.
//!
//! Hexagonal architecture with one serialised controller loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  CdevEdges (PIR, overrides)   HostBridge (stdin/stdout JSON)   │
//! │  CdevOutput (relay)           LogEventSink                     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          PresenceController (pure logic)               │    │
//! │  │  Overrides · Debounce · Voice lock                     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  EventQueue → runner::run · Display worker (relay / vcgencmd)  │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use embedded_hal::digital::InputPin;
use gpio_cdev::Chip;
use log::{error, info, warn};

use mirror_pir::adapters::cdev::{request_edges, request_output};
use mirror_pir::adapters::host_bridge::{HostBridge, JsonLineSink, await_config, spawn_host_reader};
use mirror_pir::adapters::log_sink::LogEventSink;
use mirror_pir::app::service::PresenceController;
use mirror_pir::config::SystemConfig;
use mirror_pir::drivers::display_command::{ShellSwitch, SystemCommandRunner};
use mirror_pir::drivers::display_worker::spawn_display_worker;
use mirror_pir::drivers::relay::{RelaySwitch, RelayTiming};
use mirror_pir::events::{Event, EventQueue};
use mirror_pir::gpio::{Level, spawn_edge_watcher};
use mirror_pir::runner;

/// PIR motion-triggered display power controller.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// GPIO character device.
    #[arg(long, default_value = "/dev/gpiochip0")]
    chip: PathBuf,

    /// JSON configuration file.  Without it the first `CONFIG` line from
    /// the host is used.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Consumer label shown for claimed GPIO lines.
    #[arg(long, default_value = "mirror-pir")]
    consumer: String,
}

// ── Line setup ────────────────────────────────────────────────

/// Claim `pin`, report whether it currently reads `active`, and start
/// forwarding its edges.  A line that cannot be claimed is left unwatched.
fn watch_line(
    chip: &mut Chip,
    consumer: &str,
    name: &str,
    pin: u32,
    active: Level,
    queue: &EventQueue,
    to_event: fn(Level) -> Event,
) -> bool {
    let mut edges = match request_edges(chip, pin, consumer) {
        Ok(edges) => edges,
        Err(e) => {
            error!("GPIO: {} unavailable, not watched: {}", name, e);
            return false;
        }
    };
    let engaged = match edges.is_high() {
        Ok(high) => Level::from_high(high) == active,
        Err(e) => {
            warn!("GPIO: {} initial level unknown: {}", name, e);
            false
        }
    };
    if let Err(e) = spawn_edge_watcher(name, edges, queue.clone(), to_event) {
        error!("GPIO: cannot start {} watcher: {}", name, e);
    }
    engaged
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("mirror-pir v{}", env!("CARGO_PKG_VERSION"));

    // ── Configuration ─────────────────────────────────────────
    let mut host_lines = BufReader::new(io::stdin()).lines();
    let (config, bridge) = match &args.config {
        Some(path) => {
            let config = SystemConfig::load_from_path(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            info!("Config loaded from {}", path.display());
            (config, HostBridge::already_started())
        }
        None => {
            info!("Waiting for CONFIG from host");
            let mut bridge = HostBridge::new();
            match await_config(&mut host_lines, &mut bridge) {
                Some(config) => (config, bridge),
                None => {
                    info!("Host closed input before CONFIG, exiting");
                    return Ok(());
                }
            }
        }
    };
    info!(
        "PIR on pin {} (active {:?}), {} mode, power saving {} ({}s)",
        config.sensor_pin,
        config.sensor_state,
        if config.relay_mode() { "relay" } else { "shell" },
        config.power_saving,
        config.power_saving_delay,
    );

    // ── Hardware ──────────────────────────────────────────────
    let mut chip = Chip::new(&args.chip)
        .with_context(|| format!("opening GPIO chip {}", args.chip.display()))?;

    let (display, worker) = match config.relay_pin {
        Some(pin) => {
            let output = request_output(&mut chip, pin, config.relay_state.opposite(), &args.consumer)
                .context("claiming relay pin")?;
            // The monitor is assumed on; make sure HDMI is too.
            let mut hdmi = ShellSwitch::new(config.display_command.as_str(), SystemCommandRunner);
            if let Err(e) = hdmi.force_on() {
                warn!("Display: HDMI enable failed: {}", e);
            }
            let timing = RelayTiming {
                pulse: config.relay_pulse(),
                settle: config.relay_settle(),
            };
            spawn_display_worker(RelaySwitch::new(output, pin, config.relay_state, timing))
        }
        None => spawn_display_worker(ShellSwitch::new(
            config.display_command.as_str(),
            SystemCommandRunner,
        )),
    }
    .context("starting display worker")?;

    let queue = EventQueue::new();

    let always_on = config.always_on_pin.is_some_and(|pin| {
        watch_line(
            &mut chip,
            &args.consumer,
            "always-on",
            pin,
            config.always_on_state,
            &queue,
            Event::AlwaysOnEdge,
        )
    });
    let always_off = config.always_off_pin.is_some_and(|pin| {
        watch_line(
            &mut chip,
            &args.consumer,
            "always-off",
            pin,
            config.always_off_state,
            &queue,
            Event::AlwaysOffEdge,
        )
    });
    watch_line(
        &mut chip,
        &args.consumer,
        "pir",
        config.sensor_pin,
        config.sensor_state,
        &queue,
        Event::PirEdge,
    );

    let mut controller = PresenceController::new(config);
    controller.seed_overrides(always_on, always_off);

    spawn_host_reader(host_lines, bridge, queue.clone()).context("starting host reader")?;

    // ── Event loop ────────────────────────────────────────────
    info!("System ready. Entering event loop.");
    let mut sink = (LogEventSink::new(), JsonLineSink::stdout());
    let mut port = display.clone();
    futures_lite::future::block_on(runner::run(&mut controller, &queue, &mut port, &mut sink));

    display.shutdown();
    if worker.join().is_err() {
        warn!("Display worker panicked");
    }
    info!("Shut down");
    Ok(())
}
