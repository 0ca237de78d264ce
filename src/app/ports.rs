//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PresenceController (domain)
//! ```
//!
//! Driven adapters (display power, event sinks) implement these traits.
//! The [`PresenceController`](super::service::PresenceController) consumes
//! them via generics, so the domain core never touches hardware directly.

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to switch the display.
///
/// Each call performs its side effect unconditionally; *whether* to call
/// is decided by the controller.  Implementations must not block the
/// caller for the duration of a relay pulse.
pub trait DisplayPort {
    /// Turn the display on.
    fn activate(&mut self);

    /// Turn the display off.
    fn deactivate(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → host / logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
/// Adapters decide where they go (log output, the mirror host, …).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Fan an event out to two sinks, in order.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

/// Test sink: collects every event in order.
#[cfg(test)]
impl EventSink for Vec<AppEvent> {
    fn emit(&mut self, event: &AppEvent) {
        self.push(event.clone());
    }
}
