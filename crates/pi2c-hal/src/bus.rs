//! Generic `BusDriver` trait for the serial bus the slaves hang off.

use pi2c_types::BusError;

/// A serial hardware bus (clock + data lines) that can be brought up and
/// torn down.
///
/// Both operations are blocking.  `open` failure is fatal at startup;
/// `close` must be idempotent because the shutdown path and the normal
/// cleanup path may both reach it.
pub trait BusDriver: Send {
    /// Stable identifier for this bus, e.g. `"/dev/i2c-1"`.
    fn id(&self) -> &str;

    /// Bring the bus up.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::InitFailed`] when the hardware cannot be accessed.
    fn open(&mut self) -> Result<(), BusError>;

    /// Release the bus.  Closing a bus that is not open is `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::CloseFailed`] when the driver reports a failure.
    /// The bus is considered closed either way.
    fn close(&mut self) -> Result<(), BusError>;

    /// Return `true` while the bus is open.
    fn is_open(&self) -> bool;
}
