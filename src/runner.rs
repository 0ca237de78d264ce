//! Controller loop.
//!
//! The one place controller state is touched.  Each iteration races the
//! next queued event against the debounce deadline, so the timer firing
//! is just another step in the same total order as edges and commands.
//!
//! ```text
//!            ┌──────────── queue.next() ─────────────┐
//!  loop ──▶  │                                       ├──▶ PresenceController
//!            └──── Timer::at(debounce deadline) ─────┘
//! ```

use std::time::Instant;

use async_io_mini::Timer;
use futures_lite::future;
use log::info;

use crate::app::ports::{DisplayPort, EventSink};
use crate::app::service::PresenceController;
use crate::events::{Event, EventQueue};

enum Wake {
    Event(Event),
    Deadline,
}

async fn next_wake(queue: &EventQueue, deadline: Option<Instant>) -> Wake {
    let event = async { Wake::Event(queue.next().await) };
    match deadline {
        Some(at) => {
            future::or(event, async {
                Timer::at(at).await;
                Wake::Deadline
            })
            .await
        }
        None => event.await,
    }
}

/// Drive `controller` from `queue` until [`Event::Shutdown`].
pub async fn run<D: DisplayPort, S: EventSink>(
    controller: &mut PresenceController,
    queue: &EventQueue,
    display: &mut D,
    sink: &mut S,
) {
    info!("Controller loop started");
    loop {
        match next_wake(queue, controller.debounce_deadline()).await {
            Wake::Deadline => {
                controller.poll_debounce(Instant::now(), display);
            }
            Wake::Event(Event::Shutdown) => {
                info!("Controller loop stopped");
                return;
            }
            Wake::Event(event) => {
                controller.handle_event(event, Instant::now(), display, sink);
            }
        }
    }
}
