//! [`Supervisor`] – daemon lifecycle from bus bring-up to teardown.
//!
//! Each run goes through:
//!
//! 1. **Validate** – the configured slave count is checked before any bus
//!    or pool state is touched.
//! 2. **Open** – the [`BusDriver`] is brought up; failure is fatal.
//! 3. **Allocate** – the [`SlavePool`] is allocated in one batch; failure
//!    closes the bus and is fatal.
//! 4. **Poll** – the [`PollScheduler`] runs, handing every pass to the
//!    [`SlaveProcessor`] through [`SlavePool::for_each`].
//! 5. **Teardown** – once the shutdown signal ends the loop, the
//!    [`ShutdownCoordinator`] releases the pool and then the bus.
//!
//! The returned [`ExitStatus`] is what the process should exit with.  The
//! supervisor never exits the process itself.
//!
//! [`Supervisor::run`] consumes the supervisor, so a terminated daemon cannot
//! reopen its bus:
//!
//! ```rust,compile_fail
//! use pi2c_hal::SimBus;
//! use pi2c_kernel::{NoopProcessor, ShutdownCoordinator};
//! use pi2c_runtime::{Supervisor, SupervisorConfig};
//!
//! async fn run_twice() {
//!     let sup = Supervisor::new(
//!         SupervisorConfig::default(),
//!         Box::new(SimBus::new("sim")),
//!         Box::new(NoopProcessor),
//!         ShutdownCoordinator::new(),
//!     );
//!     sup.run().await;
//!     sup.run().await;
//! }
//! ```

use pi2c_hal::BusDriver;
use pi2c_kernel::{ShutdownCoordinator, ShutdownHandle, SlavePool, SlaveProcessor};
use pi2c_types::{AllocError, ExitStatus, ProcessError};
use tracing::{error, info, warn};

use crate::scheduler::{PollScheduler, SchedulerConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Startup-time settings for [`Supervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Number of slave handles to allocate.
    pub max_slaves: usize,
    /// Polling cadence.
    pub scheduler: SchedulerConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_slaves: 1,
            scheduler: SchedulerConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Supervisor
// ─────────────────────────────────────────────────────────────────────────────

/// Builds the slave pool once the bus is open.  [`SlavePool::allocate`] by
/// default.
pub type PoolAllocator = fn(usize) -> Result<SlavePool, AllocError>;

/// Owns the bus, the processor and the shutdown coordinator for one daemon
/// run.  The slave pool only exists inside [`Supervisor::run`].
pub struct Supervisor {
    config: SupervisorConfig,
    bus: Box<dyn BusDriver>,
    processor: Box<dyn SlaveProcessor>,
    coordinator: ShutdownCoordinator,
    allocator: PoolAllocator,
}

impl Supervisor {
    pub fn new(
        config: SupervisorConfig,
        bus: Box<dyn BusDriver>,
        processor: Box<dyn SlaveProcessor>,
        coordinator: ShutdownCoordinator,
    ) -> Self {
        Self {
            config,
            bus,
            processor,
            coordinator,
            allocator: SlavePool::allocate,
        }
    }

    /// Replace the pool allocator.  Useful when a test needs to drive the
    /// allocation-failure path.
    pub fn with_allocator(mut self, allocator: PoolAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    /// Trigger to hand to the interrupt hook.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.coordinator.handle()
    }

    /// Run the daemon until interrupted or until a fatal startup error.
    pub async fn run(mut self) -> ExitStatus {
        if let Err(e) = SlavePool::validate(self.config.max_slaves) {
            error!(error = %e, "refusing to start");
            return ExitStatus::from(&e);
        }

        if let Err(e) = self.bus.open() {
            error!(error = %e, "bus bring-up failed");
            return ExitStatus::BusInitFailed;
        }

        let mut pool = match (self.allocator)(self.config.max_slaves) {
            Ok(pool) => pool,
            Err(e) => {
                error!(error = %e, "slave pool allocation failed");
                if let Err(close_err) = self.bus.close() {
                    warn!(error = %close_err, "bus close failed after allocation failure");
                }
                return ExitStatus::from(&e);
            }
        };
        info!(bus = %self.bus.id(), slaves = pool.len(), "slave pool allocated");

        let signal = self.coordinator.signal();
        let bus = self.bus.as_mut();
        let processor = self.processor.as_mut();
        let mut scheduler = PollScheduler::new(self.config.scheduler);
        let _ = scheduler
            .run(signal, || {
                Ok::<_, ProcessError>(pool.for_each(|slave| processor.process(&mut *bus, slave)))
            })
            .await;

        info!("interrupt received; shutting down");
        if let Some(report) = self.coordinator.teardown(&mut pool, self.bus.as_mut()) {
            info!(
                slaves_released = report.slaves_released,
                bus_closed_cleanly = report.bus_close.is_ok(),
                "teardown complete"
            );
        }

        // Already released by teardown; kept as the normal-path safety net.
        pool.free();

        ExitStatus::Interrupted
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
