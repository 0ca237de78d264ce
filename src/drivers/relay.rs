//! Momentary-contact relay driver for monitor power.
//!
//! The relay sits on the monitor's power button, not in series with a
//! sustained supply: every pulse toggles the monitor.  A pulse is
//!
//! | Step | Level          | Hold                        |
//! |------|----------------|-----------------------------|
//! | 1    | assert level   | `pulse` (3.5 s by default)  |
//! | 2    | release level  | `settle` (6.5 s by default) |
//!
//! The settle hold keeps a following pulse from landing while the monitor
//! is still powering up or down.  Both holds block the calling thread, so
//! this driver is only ever run on the display worker.
//!
//! Since a pulse toggles, the driver keeps its own idea of the monitor
//! state and only pulses when asked for the other one.  Once the assert
//! level has been written the release is always attempted, and the pulse
//! counts as a toggle whether or not the release went through.

use std::time::Duration;

use embedded_hal::digital::{OutputPin, PinState};
use log::{debug, error, warn};

use crate::error::{DisplayError, GpioError};
use crate::gpio::Level;

use super::display_worker::PowerSwitch;

/// Hold times of one relay pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayTiming {
    pub pulse: Duration,
    pub settle: Duration,
}

impl Default for RelayTiming {
    fn default() -> Self {
        Self {
            pulse: Duration::from_millis(3_500),
            settle: Duration::from_millis(6_500),
        }
    }
}

pub struct RelaySwitch<P> {
    pin: P,
    pin_number: u32,
    active: Level,
    timing: RelayTiming,
    pulses: u64,
    /// Monitor state as far as this driver knows.  Starts `true`.
    display_on: bool,
}

impl<P: OutputPin> RelaySwitch<P> {
    pub fn new(pin: P, pin_number: u32, active: Level, timing: RelayTiming) -> Self {
        Self {
            pin,
            pin_number,
            active,
            timing,
            pulses: 0,
            display_on: true,
        }
    }

    /// Override the assumed initial monitor state.
    pub fn with_display_on(mut self, on: bool) -> Self {
        self.display_on = on;
        self
    }

    /// Assert, hold, release, settle.
    ///
    /// A failed assert leaves everything as it was.  After a successful
    /// assert the release is retried once if it fails; the toggle is
    /// recorded either way and the release error is returned.
    pub fn pulse(&mut self) -> Result<(), DisplayError> {
        self.drive(self.active)?;
        std::thread::sleep(self.timing.pulse);

        let released = self.drive(self.active.opposite()).or_else(|_| {
            warn!("Relay: retrying release on pin {}", self.pin_number);
            self.drive(self.active.opposite())
        });
        if let Err(e) = &released {
            error!("Relay: pin {} may be stuck asserted: {}", self.pin_number, e);
        }
        std::thread::sleep(self.timing.settle);

        self.pulses += 1;
        self.display_on = !self.display_on;
        debug!(
            "Relay: pulse #{} complete, monitor now {}",
            self.pulses,
            if self.display_on { "on" } else { "off" }
        );
        released
    }

    /// Pulse only if the monitor is not already in the wanted state.
    pub fn reconcile(&mut self, want_on: bool) -> Result<(), DisplayError> {
        if self.display_on == want_on {
            debug!("Relay: monitor already {}", if want_on { "on" } else { "off" });
            return Ok(());
        }
        self.pulse()
    }

    /// Pulses carried out since construction.
    pub fn pulse_count(&self) -> u64 {
        self.pulses
    }

    pub fn is_display_on(&self) -> bool {
        self.display_on
    }

    fn drive(&mut self, level: Level) -> Result<(), DisplayError> {
        self.pin.set_state(PinState::from(level)).map_err(|e| {
            warn!("Relay: pin {} write failed: {:?}", self.pin_number, e);
            DisplayError::Relay(GpioError::WriteFailed {
                pin: self.pin_number,
            })
        })
    }
}

impl<P: OutputPin + Send + 'static> PowerSwitch for RelaySwitch<P> {
    fn switch_on(&mut self) -> Result<(), DisplayError> {
        self.reconcile(true)
    }

    fn switch_off(&mut self) -> Result<(), DisplayError> {
        self.reconcile(false)
    }
}
