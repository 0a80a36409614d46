//! `pi2c-runtime` – Polling Engine
//!
//! Drives the slaves on a fixed cadence and sequences the daemon's
//! lifecycle.
//!
//! # Modules
//!
//! - [`scheduler`] – [`PollScheduler`][scheduler::PollScheduler]:
//!   the fixed-interval tick loop.  Every `threshold` ticks it fires a
//!   processing pass; its sleep is raced against the shutdown signal so an
//!   interrupt is honoured immediately.
//! - [`supervisor`] – [`Supervisor`][supervisor::Supervisor]:
//!   validate → open bus → allocate pool → poll → teardown, returning the
//!   [`ExitStatus`][pi2c_types::ExitStatus] the process should exit with.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   installs the global `tracing` subscriber with an optional OTLP span
//!   exporter.

pub mod scheduler;
pub mod supervisor;
pub mod telemetry;

pub use scheduler::{Cancelled, PollScheduler, SchedulerConfig};
pub use supervisor::{PoolAllocator, Supervisor, SupervisorConfig};
pub use telemetry::{LogFormat, TracerProviderGuard, init_tracing};
