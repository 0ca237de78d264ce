//! Override switch state.
//!
//! Holds the last observed position of the always-on and always-off
//! switches.  Pure state: no timers, no I/O.  A switch that is not
//! installed never receives an edge, so its predicate stays `false`.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideTracker {
    always_on: bool,
    always_off: bool,
}

impl OverrideTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both switches at once from their levels read at startup.
    pub fn seed(&mut self, always_on: bool, always_off: bool) {
        self.always_on = always_on;
        self.always_off = always_off;
    }

    pub fn set_always_on(&mut self, active: bool) {
        self.always_on = active;
    }

    pub fn set_always_off(&mut self, active: bool) {
        self.always_off = active;
    }

    pub fn is_always_on_active(&self) -> bool {
        self.always_on
    }

    pub fn is_always_off_active(&self) -> bool {
        self.always_off
    }

    /// Always-on vetoes deactivation unless always-off is also asserted.
    pub fn blocks_deactivation(&self) -> bool {
        self.always_on && !self.always_off
    }

    /// Always-off vetoes activation unconditionally.
    pub fn blocks_activation(&self) -> bool {
        self.always_off
    }
}
