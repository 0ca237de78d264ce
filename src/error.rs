//! Unified error types for the PIR display controller.
//!
//! Every failure in this system is caught and logged at the boundary where
//! it occurs (GPIO adapter, display worker, configuration loader).  None of
//! them reach the presence state machine: a failed edge read simply produces
//! no event.  The types below exist so those boundaries can report *what*
//! failed in a uniform way.

use core::fmt;

use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A GPIO line could not be requested, read, watched or written.
    Gpio(GpioError),
    /// A display power request failed.
    Display(DisplayError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(e) => write!(f, "gpio: {e}"),
            Self::Display(e) => write!(f, "display: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// GPIO errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// The line could not be claimed from the GPIO chip.
    RequestFailed { pin: u32 },
    /// Reading the current level failed.
    ReadFailed { pin: u32 },
    /// Waiting for an edge event failed.
    WatchFailed { pin: u32 },
    /// Driving the output level failed.
    WriteFailed { pin: u32 },
}

impl GpioError {
    /// The pin the failure refers to.
    pub const fn pin(self) -> u32 {
        match self {
            Self::RequestFailed { pin }
            | Self::ReadFailed { pin }
            | Self::WatchFailed { pin }
            | Self::WriteFailed { pin } => pin,
        }
    }
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { pin } => write!(f, "line request failed (pin {pin})"),
            Self::ReadFailed { pin } => write!(f, "read failed (pin {pin})"),
            Self::WatchFailed { pin } => write!(f, "edge watch failed (pin {pin})"),
            Self::WriteFailed { pin } => write!(f, "write failed (pin {pin})"),
        }
    }
}

impl std::error::Error for GpioError {}

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl From<GpioError> for Error {
    fn from(e: GpioError) -> Self {
        Self::Gpio(e)
    }
}

// ---------------------------------------------------------------------------
// Display errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    /// The display power command could not be spawned.
    CommandUnavailable,
    /// The display power command ran but exited unsuccessfully.
    /// `status` is `None` when the process was killed by a signal.
    CommandFailed { status: Option<i32> },
    /// The relay output could not be driven.
    Relay(GpioError),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandUnavailable => write!(f, "display command unavailable"),
            Self::CommandFailed { status: Some(code) } => {
                write!(f, "display command exited with status {code}")
            }
            Self::CommandFailed { status: None } => {
                write!(f, "display command terminated by signal")
            }
            Self::Relay(e) => write!(f, "relay: {e}"),
        }
    }
}

impl std::error::Error for DisplayError {}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Self::Display(e)
    }
}

impl From<GpioError> for DisplayError {
    fn from(e: GpioError) -> Self {
        Self::Relay(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
