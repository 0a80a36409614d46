//! [`ShutdownCoordinator`] – one-shot, idempotent teardown on interrupt.
//!
//! The interrupt hook only ever calls [`ShutdownHandle::request`], which
//! flips the coordinator from [`ShutdownState::Running`] to
//! [`ShutdownState::ShuttingDown`] and wakes every [`ShutdownSignal`].  It
//! does not log, allocate or touch the slave pool, so it is safe to call
//! from any thread at any moment.
//!
//! The actual teardown runs on the main thread once the scheduler has
//! observed the signal: [`ShutdownCoordinator::teardown`] frees the pool,
//! closes the bus and moves to [`ShutdownState::Terminated`].  A close
//! failure is reported but never stops the sequence.
//!
//! # Example
//!
//! ```rust
//! use pi2c_hal::{BusDriver, SimBus};
//! use pi2c_kernel::shutdown::{ShutdownCoordinator, ShutdownState};
//! use pi2c_kernel::slave_pool::SlavePool;
//!
//! let mut coordinator = ShutdownCoordinator::new();
//! let handle = coordinator.handle();
//! let mut bus = SimBus::new("sim");
//! bus.open().unwrap();
//! let mut pool = SlavePool::allocate(2).unwrap();
//!
//! assert!(handle.request());
//! assert!(!handle.request()); // second interrupt is ignored
//!
//! let report = coordinator.teardown(&mut pool, &mut bus).expect("first teardown runs");
//! assert_eq!(report.slaves_released, 2);
//! assert_eq!(coordinator.state(), ShutdownState::Terminated);
//! assert!(coordinator.teardown(&mut pool, &mut bus).is_none());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use pi2c_hal::BusDriver;
use pi2c_types::BusError;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::slave_pool::SlavePool;

// ────────────────────────────────────────────────────────────────────────────
// Public types
// ────────────────────────────────────────────────────────────────────────────

/// Lifecycle of the shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ShutdownState {
    /// Normal operation.
    Running = 0,
    /// An interrupt was received; teardown is pending or in progress.
    ShuttingDown = 1,
    /// Pool and bus have been released.
    Terminated = 2,
}

impl ShutdownState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ShutdownState::Running,
            1 => ShutdownState::ShuttingDown,
            _ => ShutdownState::Terminated,
        }
    }
}

/// What the teardown sequence did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    /// Slave handles released from the pool.
    pub slaves_released: usize,
    /// Result of closing the bus.
    pub bus_close: Result<(), BusError>,
}

// ────────────────────────────────────────────────────────────────────────────
// Shared state
// ────────────────────────────────────────────────────────────────────────────

struct Shared {
    state: AtomicU8,
    notify: watch::Sender<bool>,
}

impl Shared {
    fn state(&self) -> ShutdownState {
        ShutdownState::from_u8(self.state.load(Ordering::SeqCst))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ShutdownHandle
// ────────────────────────────────────────────────────────────────────────────

/// Cloneable, thread-safe trigger for the shutdown sequence.  This is the
/// only piece handed to the interrupt hook.
#[derive(Clone)]
pub struct ShutdownHandle {
    shared: Arc<Shared>,
}

impl ShutdownHandle {
    /// Request shutdown.
    ///
    /// Returns `true` for the request that moved the coordinator out of
    /// [`ShutdownState::Running`].  Every later call returns `false` and has
    /// no effect.
    pub fn request(&self) -> bool {
        let won = self
            .shared
            .state
            .compare_exchange(
                ShutdownState::Running as u8,
                ShutdownState::ShuttingDown as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if won {
            self.shared.notify.send_replace(true);
        }
        won
    }

    pub fn state(&self) -> ShutdownState {
        self.shared.state()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ShutdownSignal
// ────────────────────────────────────────────────────────────────────────────

/// Awaitable view of the shutdown request, used by the scheduler to cut its
/// sleep short.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// `true` once shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested.  Resolves immediately if it
    /// already was.
    pub async fn requested(&mut self) {
        let coordinator_gone = self.rx.wait_for(|requested| *requested).await.is_err();
        if coordinator_gone {
            // Dropped without a request: nothing can ever fire.
            std::future::pending::<()>().await;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ShutdownCoordinator
// ────────────────────────────────────────────────────────────────────────────

/// Owner of the shutdown state machine.
pub struct ShutdownCoordinator {
    shared: Arc<Shared>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    /// Create a coordinator in [`ShutdownState::Running`].
    pub fn new() -> Self {
        let (notify, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                state: AtomicU8::new(ShutdownState::Running as u8),
                notify,
            }),
        }
    }

    /// Trigger for the interrupt hook.
    pub fn handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shared: self.shared.clone(),
        }
    }

    /// Awaitable signal for the scheduler.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.shared.notify.subscribe(),
        }
    }

    pub fn state(&self) -> ShutdownState {
        self.shared.state()
    }

    /// Shorthand for `self.handle().request()`.
    pub fn request(&self) -> bool {
        self.handle().request()
    }

    /// Release the slave pool, then the bus, and move to
    /// [`ShutdownState::Terminated`].
    ///
    /// Runs only while [`ShutdownState::ShuttingDown`]; returns `None`
    /// without touching anything in any other state, so a repeated call
    /// never re-enters the sequence.  A bus close failure is logged and
    /// carried in the report, and the coordinator still terminates.
    #[instrument(skip_all, fields(bus = %bus.id()))]
    pub fn teardown(&mut self, pool: &mut SlavePool, bus: &mut dyn BusDriver) -> Option<TeardownReport> {
        match self.state() {
            ShutdownState::ShuttingDown => {}
            state => {
                debug!(?state, "teardown skipped");
                return None;
            }
        }

        let slaves_released = pool.free();
        info!(slaves_released, "slave pool released");

        let bus_close = bus.close();
        match &bus_close {
            Ok(()) => info!("bus closed"),
            Err(e) => warn!(error = %e, "bus close failed; continuing shutdown"),
        }

        self.shared
            .state
            .store(ShutdownState::Terminated as u8, Ordering::SeqCst);

        Some(TeardownReport {
            slaves_released,
            bus_close,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
