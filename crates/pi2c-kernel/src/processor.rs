//! Generic `SlaveProcessor` trait – the extension point where a device
//! protocol attaches to the polling pass.

use pi2c_hal::BusDriver;
use pi2c_types::ProcessError;

use crate::slave_pool::SlaveHandle;

/// Per-slave work performed on every processing pass.
///
/// Implementations talk to one slave over `bus` and report the outcome.  An
/// error is recorded on that slave only; the pass moves on to the next one.
pub trait SlaveProcessor: Send {
    /// Service `slave` over `bus`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessError`] describing why the slave could not be
    /// serviced on this pass.
    fn process(&mut self, bus: &mut dyn BusDriver, slave: &SlaveHandle) -> Result<(), ProcessError>;
}

/// Processor that does nothing and always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProcessor;

impl SlaveProcessor for NoopProcessor {
    fn process(&mut self, _bus: &mut dyn BusDriver, _slave: &SlaveHandle) -> Result<(), ProcessError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slave_pool::SlavePool;
    use pi2c_hal::SimBus;

    /// Fails every slave whose index is odd.
    struct OddFails {
        calls: usize,
    }

    impl SlaveProcessor for OddFails {
        fn process(&mut self, _bus: &mut dyn BusDriver, slave: &SlaveHandle) -> Result<(), ProcessError> {
            self.calls += 1;
            if slave.index() % 2 == 1 {
                Err(ProcessError::Timeout { slave: slave.index() })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn noop_processor_succeeds_for_every_slave() {
        let mut bus = SimBus::new("sim");
        let mut pool = SlavePool::allocate(3).unwrap();
        let mut processor = NoopProcessor;
        let report = pool.for_each(|slave| processor.process(&mut bus, slave));
        assert_eq!(report.visited, 3);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn processor_errors_land_on_the_failing_slave() {
        let mut bus = SimBus::new("sim");
        let mut pool = SlavePool::allocate(4).unwrap();
        let mut processor = OddFails { calls: 0 };
        let report = pool.for_each(|slave| processor.process(&mut bus, slave));

        assert_eq!(processor.calls, 4);
        assert_eq!(report.failed, 2);
        let failed: Vec<_> = pool
            .iter()
            .filter(|h| !h.status().is_ok())
            .map(SlaveHandle::index)
            .collect();
        assert_eq!(failed, vec![1, 3]);
    }
}
