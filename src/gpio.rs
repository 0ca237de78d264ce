//! GPIO port — digital levels and edge watching.
//!
//! Reading and driving a line go through the `embedded-hal` 1.0
//! [`InputPin`](embedded_hal::digital::InputPin) and
//! [`OutputPin`](embedded_hal::digital::OutputPin) traits.  Edge
//! notification has no `embedded-hal` blocking equivalent, so it gets its
//! own [`EdgeWatch`] trait here.
//!
//! Each watched line runs on its own thread and feeds typed events into the
//! shared [`EventQueue`]; it never touches controller state.
//!
//! ```text
//!  PIR line ───────▶ watcher thread ──┐
//!  always-on line ─▶ watcher thread ──┼──▶ EventQueue ──▶ controller loop
//!  always-off line ▶ watcher thread ──┘
//! ```

use core::fmt;
use std::thread::JoinHandle;
use std::time::Duration;

use embedded_hal::digital::PinState;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::GpioError;
use crate::events::{Event, EventQueue};

/// Consecutive watch failures after which a watcher gives up on its line.
pub const MAX_CONSECUTIVE_WATCH_ERRORS: u32 = 10;

/// Pause between a failed edge wait and the next attempt.
const WATCH_RETRY_DELAY: Duration = Duration::from_millis(100);

// ───────────────────────────────────────────────────────────────
// Level
// ───────────────────────────────────────────────────────────────

/// A digital level.  Serialised as `0` / `1`, the host's spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub const fn from_high(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }

    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }

    /// The other level (the relay "release" level for a given assert level).
    pub const fn opposite(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = InvalidLevel;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Low),
            1 => Ok(Self::High),
            other => Err(InvalidLevel(other)),
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

impl From<Level> for PinState {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => PinState::Low,
            Level::High => PinState::High,
        }
    }
}

impl From<PinState> for Level {
    fn from(state: PinState) -> Self {
        match state {
            PinState::Low => Level::Low,
            PinState::High => Level::High,
        }
    }
}

/// A raw level value other than 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidLevel(pub u8);

impl fmt::Display for InvalidLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level must be 0 or 1, got {}", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Edge watching
// ───────────────────────────────────────────────────────────────

/// Blocking source of edge events on one input line (both edges).
pub trait EdgeWatch: Send + 'static {
    /// GPIO line this watcher is attached to.
    fn pin(&self) -> u32;

    /// Block until the next edge and return the level it settled to.
    fn wait_for_edge(&mut self) -> Result<Level, GpioError>;
}

/// Spawn a thread that forwards every edge on `watch` into `queue`.
///
/// `to_event` maps the new level to the event for this line
/// (e.g. [`Event::PirEdge`]).  A failed wait is logged and produces no
/// event.  After [`MAX_CONSECUTIVE_WATCH_ERRORS`] failures in a row the
/// thread exits and the line is no longer watched.
pub fn spawn_edge_watcher<W: EdgeWatch>(
    name: &str,
    mut watch: W,
    queue: EventQueue,
    to_event: fn(Level) -> Event,
) -> std::io::Result<JoinHandle<()>> {
    let label = name.to_owned();
    std::thread::Builder::new()
        .name(format!("gpio-{label}"))
        .spawn(move || {
            info!("GPIO: watching {} on pin {}", label, watch.pin());
            let mut failures = 0u32;
            loop {
                match watch.wait_for_edge() {
                    Ok(level) => {
                        failures = 0;
                        queue.push(to_event(level));
                    }
                    Err(e) => {
                        failures += 1;
                        warn!("GPIO: {} edge ignored: {}", label, e);
                        if failures >= MAX_CONSECUTIVE_WATCH_ERRORS {
                            error!(
                                "GPIO: {} failed {} times in a row, no longer watching pin {}",
                                label,
                                failures,
                                watch.pin()
                            );
                            return;
                        }
                        std::thread::sleep(WATCH_RETRY_DELAY);
                    }
                }
            }
        })
}
