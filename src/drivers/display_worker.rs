//! Display worker — runs power requests off the controller loop.
//!
//! A relay pulse holds for ~10 s and a shell command spawns a process;
//! neither may stall event processing.  The worker owns the concrete
//! [`PowerSwitch`] on a dedicated thread and executes requests strictly
//! one at a time, so two pulses never overlap and each pulse's
//! assert/release pair is atomic to every observer.
//!
//! The inbox holds one slot, not a queue: a request that arrives while an
//! earlier one is still unserved replaces it.  Nothing is ever refused.
//! The switch reconciles toward the latest requested state, so requests
//! that were overtaken while a pulse ran are not needed.
//!
//! ```text
//!  ┌──────────────────┐  desired state ┌─────────────────────────┐
//!  │ Controller loop  │───────────────▶│ Display worker (thread) │
//!  │ (DisplayHandle)  │  latest wins   │ RelaySwitch/ShellSwitch │
//!  └──────────────────┘                └─────────────────────────┘
//! ```

use core::cell::Cell;
use std::sync::Arc;
use std::thread::JoinHandle;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{debug, info, warn};

use crate::app::ports::DisplayPort;
use crate::error::DisplayError;

/// Backend that actually switches the display.  Calls may block.
///
/// Implementations reconcile: asking for the state the display is already
/// known to be in must not toggle it.
pub trait PowerSwitch: Send + 'static {
    fn switch_on(&mut self) -> Result<(), DisplayError>;
    fn switch_off(&mut self) -> Result<(), DisplayError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerRequest {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, Default)]
struct Inbox {
    /// Latest request not yet picked up by the worker.
    pending: Option<PowerRequest>,
    /// Exit once `pending` is empty.
    stop: bool,
}

struct Shared {
    inbox: Mutex<CriticalSectionRawMutex, Cell<Inbox>>,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl Shared {
    fn update(&self, f: impl FnOnce(&mut Inbox)) {
        self.inbox.lock(|cell| {
            let mut inbox = cell.get();
            f(&mut inbox);
            cell.set(inbox);
        });
        self.wake.signal(());
    }

    fn take(&self) -> (Option<PowerRequest>, bool) {
        self.inbox.lock(|cell| {
            let mut inbox = cell.get();
            let pending = inbox.pending.take();
            cell.set(inbox);
            (pending, inbox.stop)
        })
    }
}

/// Controller-side handle; implements [`DisplayPort`] by posting requests.
#[derive(Clone)]
pub struct DisplayHandle {
    shared: Arc<Shared>,
}

impl DisplayHandle {
    /// Post a request without blocking.  Replaces any unserved request.
    pub fn request(&self, req: PowerRequest) {
        self.shared.update(|inbox| {
            if let Some(prev) = inbox.pending.replace(req) {
                debug!("Display: {:?} overtaken by {:?}", prev, req);
            }
        });
    }

    /// Ask the worker to exit once the pending request has been served.
    pub fn shutdown(&self) {
        self.shared.update(|inbox| inbox.stop = true);
    }

    /// Request the worker has not picked up yet.
    pub fn pending(&self) -> Option<PowerRequest> {
        self.shared.inbox.lock(|cell| cell.get().pending)
    }
}

impl DisplayPort for DisplayHandle {
    fn activate(&mut self) {
        self.request(PowerRequest::On);
    }

    fn deactivate(&mut self) {
        self.request(PowerRequest::Off);
    }
}

/// Spawn the worker thread that owns `switch`.
pub fn spawn_display_worker<S: PowerSwitch>(
    switch: S,
) -> std::io::Result<(DisplayHandle, JoinHandle<()>)> {
    let shared = Arc::new(Shared {
        inbox: Mutex::new(Cell::new(Inbox::default())),
        wake: Signal::new(),
    });
    let inbox = shared.clone();
    let join = std::thread::Builder::new()
        .name("display".into())
        .spawn(move || futures_lite::future::block_on(run_worker(&inbox, switch)))?;
    Ok((DisplayHandle { shared }, join))
}

async fn run_worker<S: PowerSwitch>(shared: &Shared, mut switch: S) {
    info!("Display worker started");
    loop {
        let result = match shared.take() {
            (Some(PowerRequest::On), _) => switch.switch_on(),
            (Some(PowerRequest::Off), _) => switch.switch_off(),
            (None, true) => {
                info!("Display worker stopped");
                return;
            }
            (None, false) => {
                shared.wake.wait().await;
                continue;
            }
        };
        if let Err(e) = result {
            warn!("Display: request failed: {}", e);
        }
    }
}
