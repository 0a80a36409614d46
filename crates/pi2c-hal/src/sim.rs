//! In-process bus simulation for CI/CD testing without physical hardware.
//!
//! [`SimBus`] always succeeds unless told otherwise, and counts every
//! `open`/`close` call so tests can assert on the bring-up and teardown
//! sequence after the bus has been handed off to its owner.
//!
//! # Example
//!
//! ```rust
//! use pi2c_hal::{BusDriver, SimBus};
//!
//! let mut bus = SimBus::new("sim-i2c");
//! let probe = bus.probe();
//!
//! bus.open().expect("sim open must succeed");
//! bus.close().expect("sim close must succeed");
//!
//! assert_eq!(probe.opens(), 1);
//! assert_eq!(probe.closes(), 1);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use pi2c_types::BusError;

use crate::bus::BusDriver;

#[derive(Default)]
struct Counters {
    opens: AtomicUsize,
    closes: AtomicUsize,
    open: AtomicBool,
}

/// Read-only view of a [`SimBus`]'s call counters.
#[derive(Clone)]
pub struct SimProbe(Arc<Counters>);

impl SimProbe {
    /// Number of `open` calls made so far, failed ones included.
    pub fn opens(&self) -> usize {
        self.0.opens.load(Ordering::SeqCst)
    }

    /// Number of `close` calls made so far, failed ones included.
    pub fn closes(&self) -> usize {
        self.0.closes.load(Ordering::SeqCst)
    }

    /// Whether the bus is currently open.
    pub fn is_open(&self) -> bool {
        self.0.open.load(Ordering::SeqCst)
    }
}

/// A simulated bus.
pub struct SimBus {
    id: String,
    fail_open: bool,
    fail_close: bool,
    counters: Arc<Counters>,
}

impl SimBus {
    /// Create a simulated bus with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fail_open: false,
            fail_close: false,
            counters: Arc::default(),
        }
    }

    /// Make every `open` call fail with [`BusError::InitFailed`].
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Make every `close` call report [`BusError::CloseFailed`].  The bus
    /// still ends up closed.
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Return a probe that stays valid after the bus is moved.
    pub fn probe(&self) -> SimProbe {
        SimProbe(self.counters.clone())
    }
}

impl BusDriver for SimBus {
    fn id(&self) -> &str {
        &self.id
    }

    fn open(&mut self) -> Result<(), BusError> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(BusError::InitFailed {
                bus: self.id.clone(),
                details: "simulated init failure".to_string(),
            });
        }
        self.counters.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) -> Result<(), BusError> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        let was_open = self.counters.open.swap(false, Ordering::SeqCst);
        if self.fail_close && was_open {
            return Err(BusError::CloseFailed {
                bus: self.id.clone(),
                details: "simulated close failure".to_string(),
            });
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.counters.open.load(Ordering::SeqCst)
    }
}
