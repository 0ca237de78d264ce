//! System configuration parameters
//!
//! Wiring and power-saving settings for the PIR controller.  The wire
//! names follow the host module's camelCase keys so a `CONFIG` payload
//! from the host deserialises directly.  Values are immutable once the
//! controller has started.

use core::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::gpio::Level;

/// Default path of the Raspberry Pi firmware display tool.
pub const DEFAULT_DISPLAY_COMMAND: &str = "/usr/bin/vcgencmd";

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SystemConfig {
    // --- PIR sensor ---
    /// GPIO line of the PIR output.
    pub sensor_pin: u32,
    /// Level the PIR drives while motion is present.
    pub sensor_state: Level,

    // --- Relay ---
    /// Relay in series with the monitor supply.  `None` selects the
    /// shell display-power command instead.
    #[serde(deserialize_with = "optional_pin")]
    pub relay_pin: Option<u32>,
    /// Level that energises the relay coil.
    pub relay_state: Level,
    /// How long the relay is held asserted (milliseconds).
    pub relay_pulse_ms: u64,
    /// Guard period after release before another pulse (milliseconds).
    pub relay_settle_ms: u64,

    // --- Override switches ---
    #[serde(deserialize_with = "optional_pin")]
    pub always_on_pin: Option<u32>,
    pub always_on_state: Level,
    #[serde(deserialize_with = "optional_pin")]
    pub always_off_pin: Option<u32>,
    pub always_off_state: Level,

    // --- Power saving ---
    /// Turn the display off when motion stops.
    pub power_saving: bool,
    /// Seconds without motion before the display is turned off.
    pub power_saving_delay: f64,
    /// Show an alert on the mirror when motion stops.
    pub power_saving_notification: bool,
    pub power_saving_message: String,

    // --- Shell fallback ---
    /// Program queried/invoked when no relay is wired.
    pub display_command: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // PIR
            sensor_pin: 22,
            sensor_state: Level::High,

            // Relay
            relay_pin: None,
            relay_state: Level::High,
            relay_pulse_ms: 3_500,
            relay_settle_ms: 6_500,

            // Overrides
            always_on_pin: None,
            always_on_state: Level::High,
            always_off_pin: None,
            always_off_state: Level::High,

            // Power saving
            power_saving: true,
            power_saving_delay: 0.0,
            power_saving_notification: false,
            power_saving_message: "Monitor will be turn Off by PIR module".into(),

            display_command: DEFAULT_DISPLAY_COMMAND.into(),
        }
    }
}

impl SystemConfig {
    /// Parse a JSON document (file contents or a `CONFIG` payload).
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Convert an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config = Self::from_json_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Range and wiring checks.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.power_saving_delay.is_finite() || self.power_saving_delay < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "powerSavingDelay must be a non-negative number of seconds",
            ));
        }
        let reachable = Duration::try_from_secs_f64(self.power_saving_delay)
            .ok()
            .and_then(|delay| Instant::now().checked_add(delay));
        if reachable.is_none() {
            return Err(ConfigError::ValidationFailed("powerSavingDelay is out of range"));
        }

        let pins = [
            Some(self.sensor_pin),
            self.relay_pin,
            self.always_on_pin,
            self.always_off_pin,
        ];
        for (i, a) in pins.iter().enumerate() {
            let Some(a) = a else { continue };
            if pins[i + 1..].iter().flatten().any(|b| b == a) {
                return Err(ConfigError::ValidationFailed("a GPIO pin is assigned twice"));
            }
        }

        if self.relay_pin.is_none() && self.display_command.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "displayCommand is required when no relay is configured",
            ));
        }
        Ok(())
    }

    /// `true` when display power is switched by the relay.
    pub fn relay_mode(&self) -> bool {
        self.relay_pin.is_some()
    }

    /// Debounce delay between "motion stopped" and deactivation.
    ///
    /// An unvalidated value that does not fit a `Duration` maps to
    /// `Duration::MAX`, which never expires.
    pub fn power_saving_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.power_saving_delay).unwrap_or(Duration::MAX)
    }

    pub fn relay_pulse(&self) -> Duration {
        Duration::from_millis(self.relay_pulse_ms)
    }

    pub fn relay_settle(&self) -> Duration {
        Duration::from_millis(self.relay_settle_ms)
    }
}

/// Accepts a pin number, or `false` / `null` for "not installed".
fn optional_pin<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PinOrFlag {
        Pin(u32),
        Flag(bool),
    }

    match Option::<PinOrFlag>::deserialize(deserializer)? {
        None | Some(PinOrFlag::Flag(false)) => Ok(None),
        Some(PinOrFlag::Pin(pin)) => Ok(Some(pin)),
        Some(PinOrFlag::Flag(true)) => Err(D::Error::custom(
            "pin must be a GPIO number or false",
        )),
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from loading or validating a [`SystemConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(String),
    /// The document is not valid JSON or has a field of the wrong type.
    Parse(String),
    /// A field failed range or wiring validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
            Self::Parse(msg) => write!(f, "parse error: {}", msg),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
