//! `pi2c-kernel` – Resource Ownership & Shutdown
//!
//! Owns the slave handles and enforces the rules around releasing them and
//! the bus.  It does not talk any device protocol; it only guarantees that
//! hardware and memory are never left half-released on any exit path.
//!
//! # Modules
//!
//! - [`slave_pool`] – [`SlavePool`][slave_pool::SlavePool]:
//!   the bounded, batch-allocated, singly-linked run of
//!   [`SlaveHandle`][slave_pool::SlaveHandle]s, with an idempotent
//!   [`free`][slave_pool::SlavePool::free] and a fault-isolating
//!   [`for_each`][slave_pool::SlavePool::for_each].
//! - [`processor`] – [`SlaveProcessor`][processor::SlaveProcessor]:
//!   the per-slave extension point a device protocol plugs into, and the
//!   default [`NoopProcessor`][processor::NoopProcessor].
//! - [`shutdown`] – [`ShutdownCoordinator`][shutdown::ShutdownCoordinator]:
//!   the Running → ShuttingDown → Terminated state machine.  The interrupt
//!   hook only flips a flag; teardown runs on the main thread exactly once.

pub mod processor;
pub mod shutdown;
pub mod slave_pool;

pub use processor::{NoopProcessor, SlaveProcessor};
pub use shutdown::{ShutdownCoordinator, ShutdownHandle, ShutdownSignal, ShutdownState, TeardownReport};
pub use slave_pool::{PassReport, SlaveHandle, SlavePool};
