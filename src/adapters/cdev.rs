//! Linux GPIO character-device adapter (`/dev/gpiochipN`).
//!
//! Binds the GPIO port to `gpio-cdev`:
//!
//! | Type          | Implements                          | Kernel object      |
//! |---------------|-------------------------------------|--------------------|
//! | `CdevOutput`  | `OutputPin`                         | line handle (out)  |
//! | `CdevEdges`   | `EdgeWatch`, `InputPin`             | line event handle  |
//!
//! An edge-watched line is also read through its event handle, since the
//! kernel grants each line to one request only.  Lines are held for the
//! life of the process.

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use gpio_cdev::{Chip, EventRequestFlags, EventType, LineEventHandle, LineHandle, LineRequestFlags};
use log::{debug, warn};

use crate::error::GpioError;
use crate::gpio::{EdgeWatch, Level};

// ───────────────────────────────────────────────────────────────
// Output
// ───────────────────────────────────────────────────────────────

pub struct CdevOutput {
    handle: LineHandle,
    pin: u32,
}

/// Claim `pin` as an output driven to `initial`.
pub fn request_output(
    chip: &mut Chip,
    pin: u32,
    initial: Level,
    consumer: &str,
) -> Result<CdevOutput, GpioError> {
    let handle = chip
        .get_line(pin)
        .and_then(|line| line.request(LineRequestFlags::OUTPUT, u8::from(initial), consumer))
        .map_err(|e| {
            warn!("GPIO: cannot claim output pin {}: {}", pin, e);
            GpioError::RequestFailed { pin }
        })?;
    debug!("GPIO: pin {} claimed as output ({:?})", pin, initial);
    Ok(CdevOutput { handle, pin })
}

impl ErrorType for CdevOutput {
    type Error = GpioError;
}

impl OutputPin for CdevOutput {
    fn set_low(&mut self) -> Result<(), GpioError> {
        self.handle
            .set_value(0)
            .map_err(|_| GpioError::WriteFailed { pin: self.pin })
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        self.handle
            .set_value(1)
            .map_err(|_| GpioError::WriteFailed { pin: self.pin })
    }
}

// ───────────────────────────────────────────────────────────────
// Edge-watched input
// ───────────────────────────────────────────────────────────────

pub struct CdevEdges {
    events: LineEventHandle,
    pin: u32,
}

/// Claim `pin` as an input reporting both edges.
pub fn request_edges(chip: &mut Chip, pin: u32, consumer: &str) -> Result<CdevEdges, GpioError> {
    let events = chip
        .get_line(pin)
        .and_then(|line| {
            line.events(
                LineRequestFlags::INPUT,
                EventRequestFlags::BOTH_EDGES,
                consumer,
            )
        })
        .map_err(|e| {
            warn!("GPIO: cannot watch pin {}: {}", pin, e);
            GpioError::RequestFailed { pin }
        })?;
    debug!("GPIO: pin {} claimed for edge events", pin);
    Ok(CdevEdges { events, pin })
}

impl CdevEdges {
    pub fn level(&self) -> Result<Level, GpioError> {
        self.events
            .get_value()
            .map(|v| Level::from_high(v != 0))
            .map_err(|_| GpioError::ReadFailed { pin: self.pin })
    }
}

impl EdgeWatch for CdevEdges {
    fn pin(&self) -> u32 {
        self.pin
    }

    fn wait_for_edge(&mut self) -> Result<Level, GpioError> {
        let event = self
            .events
            .get_event()
            .map_err(|_| GpioError::WatchFailed { pin: self.pin })?;
        Ok(match event.event_type() {
            EventType::RisingEdge => Level::High,
            EventType::FallingEdge => Level::Low,
        })
    }
}

impl ErrorType for CdevEdges {
    type Error = GpioError;
}

impl InputPin for CdevEdges {
    fn is_high(&mut self) -> Result<bool, GpioError> {
        self.level().map(Level::is_high)
    }

    fn is_low(&mut self) -> Result<bool, GpioError> {
        self.level().map(|l| !l.is_high())
    }
}
