//! Inbound event queue.
//!
//! Events are produced by:
//! - GPIO edge watcher threads (PIR, always-on, always-off)
//! - The host bridge reader (wake, voice commands, end of input)
//!
//! Events are consumed by the single controller loop, which processes
//! them one at a time in FIFO order.  That loop is the only place
//! controller state is touched, which is what serialises every state
//! transition.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │ PIR watcher │────▶│              │     │                  │
//! │ Switches    │────▶│  Event Queue │────▶│  Controller loop │
//! │ Host bridge │────▶│  (bounded)   │     │  (consumer)      │
//! └─────────────┘     └──────────────┘     └──────────────────┘
//! ```

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::commands::AppCommand;
use crate::gpio::Level;

/// Maximum number of pending events.
pub const EVENT_QUEUE_DEPTH: usize = 32;

/// Typed inbound events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The PIR line changed level.
    PirEdge(Level),
    /// The always-on switch changed level.
    AlwaysOnEdge(Level),
    /// The always-off switch changed level.
    AlwaysOffEdge(Level),
    /// A command from the host (wake, voice on/off).
    Command(AppCommand),
    /// Stop the controller loop.
    Shutdown,
}

type EventChannel = Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_DEPTH>;

/// Multi-producer, single-consumer handle on the event channel.
///
/// Cloning shares the same underlying queue.
#[derive(Clone)]
pub struct EventQueue {
    channel: Arc<EventChannel>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            channel: Arc::new(Channel::new()),
        }
    }

    /// Push an event without blocking.
    /// Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: Event) -> bool {
        if self.channel.try_send(event).is_err() {
            warn!("Event queue full, dropping {:?}", event);
            return false;
        }
        true
    }

    /// Wait for the next event.
    pub async fn next(&self) -> Event {
        self.channel.receive().await
    }

    /// Pop the next event if one is pending.
    pub fn try_next(&self) -> Option<Event> {
        self.channel.try_receive().ok()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}
