//! `pi2c-hal` – bus driver seam.
//!
//! # Modules
//!
//! - [`bus`] – the [`BusDriver`][bus::BusDriver] trait every bus backend
//!   implements.  The rest of the daemon only ever talks to the trait.
//! - [`dev`] – [`DevBus`][dev::DevBus]: a Linux I²C character device
//!   (`/dev/i2c-N`).
//! - [`sim`] – [`SimBus`][sim::SimBus]: an in-process bus for CI and tests
//!   without physical hardware.

pub mod bus;
pub mod dev;
pub mod sim;

pub use bus::BusDriver;
pub use dev::DevBus;
pub use sim::{SimBus, SimProbe};
