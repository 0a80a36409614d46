//! [`PollScheduler`] – fixed-interval polling loop.
//!
//! One *tick* is one sleep of [`SchedulerConfig::tick`].  A counter is
//! incremented every tick; when it reaches [`SchedulerConfig::threshold`]
//! the processing callback fires once and the counter goes back to zero.
//! With the defaults (500 ms × 16) the slaves are serviced roughly every
//! eight seconds.
//!
//! The sleep is the only suspension point of the loop.  It is raced against
//! the [`ShutdownSignal`] so an interrupt ends it immediately instead of at
//! the next tick boundary.  The interval is not corrected for the time the
//! callback takes.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use pi2c_runtime::scheduler::{PollScheduler, SchedulerConfig};
//!
//! let mut scheduler = PollScheduler::new(SchedulerConfig {
//!     tick: Duration::from_millis(1),
//!     threshold: 2,
//! });
//!
//! assert!(!scheduler.advance());
//! assert_eq!(scheduler.counter(), 1);
//! assert!(scheduler.advance()); // second tick reaches the threshold
//! assert_eq!(scheduler.counter(), 0);
//! ```

use std::fmt::Debug;
use std::time::Duration;

use pi2c_kernel::ShutdownSignal;
use pi2c_types::ProcessError;
use tracing::{debug, info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Reference tick length.
pub const DEFAULT_TICK: Duration = Duration::from_millis(500);

/// Reference number of ticks between processing passes.
pub const DEFAULT_THRESHOLD: u32 = 16;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Timing of the polling loop.  Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Length of one tick.
    pub tick: Duration,
    /// Ticks between processing passes.  `0` and `1` both fire every tick.
    pub threshold: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Returned by [`PollScheduler::run`] when the loop was cancelled by a
/// shutdown request.  There is no other way out of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Cancelled;

// ─────────────────────────────────────────────────────────────────────────────
// PollScheduler
// ─────────────────────────────────────────────────────────────────────────────

/// Drives the tick counter and fires the processing callback.
pub struct PollScheduler {
    config: SchedulerConfig,
    counter: u32,
    passes: u64,
}

impl PollScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            counter: 0,
            passes: 0,
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Ticks counted since the last processing pass.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Processing passes fired so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Account for one elapsed tick.
    ///
    /// Returns `true` when the threshold is reached, in which case the
    /// counter has been reset to zero and the caller must run a pass.
    pub fn advance(&mut self) -> bool {
        self.counter += 1;
        if self.counter >= self.config.threshold {
            self.counter = 0;
            self.passes += 1;
            true
        } else {
            false
        }
    }

    /// Run the loop until `signal` fires.
    ///
    /// `on_threshold` is called once every `threshold` ticks.  An error from
    /// it is logged and the loop carries on; it never ends the loop.
    pub async fn run<F, T>(&mut self, mut signal: ShutdownSignal, mut on_threshold: F) -> Cancelled
    where
        F: FnMut() -> Result<T, ProcessError>,
        T: Debug,
    {
        info!(
            tick = ?self.config.tick,
            threshold = self.config.threshold,
            "poll scheduler started"
        );
        loop {
            tokio::select! {
                biased;
                _ = signal.requested() => {
                    info!(counter = self.counter, passes = self.passes, "poll scheduler cancelled");
                    return Cancelled;
                }
                _ = tokio::time::sleep(self.config.tick) => {}
            }

            debug!(counter = self.counter, "tick");
            if self.advance() {
                match on_threshold() {
                    Ok(outcome) => debug!(?outcome, pass = self.passes, "processing pass complete"),
                    Err(e) => warn!(error = %e, pass = self.passes, "processing pass failed"),
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pi2c_kernel::ShutdownCoordinator;
    use tokio::time::Instant;

    fn config(tick_ms: u64, threshold: u32) -> SchedulerConfig {
        SchedulerConfig {
            tick: Duration::from_millis(tick_ms),
            threshold,
        }
    }

    #[test]
    fn default_config_matches_reference_cadence() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.tick, Duration::from_millis(500));
        assert_eq!(cfg.threshold, 16);
        assert_eq!(cfg.tick * cfg.threshold, Duration::from_secs(8));
    }

    #[test]
    fn one_tick_below_threshold_only_counts() {
        let mut scheduler = PollScheduler::new(config(1, 2));
        assert!(!scheduler.advance());
        assert_eq!(scheduler.counter(), 1);
        assert_eq!(scheduler.passes(), 0);
    }

    #[test]
    fn reaching_threshold_fires_and_resets() {
        let mut scheduler = PollScheduler::new(config(1, 2));
        assert!(!scheduler.advance());
        assert!(scheduler.advance());
        assert_eq!(scheduler.counter(), 0);
        assert_eq!(scheduler.passes(), 1);
    }

    #[test]
    fn fires_every_threshold_ticks() {
        let mut scheduler = PollScheduler::new(config(1, 16));
        let fired: Vec<usize> = (1..=48).filter(|_| scheduler.advance()).collect();
        assert_eq!(fired, vec![16, 32, 48]);
    }

    #[test]
    fn zero_threshold_fires_every_tick() {
        let mut scheduler = PollScheduler::new(config(1, 0));
        assert!(scheduler.advance());
        assert!(scheduler.advance());
        assert_eq!(scheduler.counter(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_fires_callback_on_cadence_until_cancelled() {
        let coordinator = ShutdownCoordinator::new();
        let handle = coordinator.handle();
        let mut scheduler = PollScheduler::new(config(10, 2));
        let start = Instant::now();

        let mut calls = 0;
        let _ = scheduler
            .run(coordinator.signal(), || {
                calls += 1;
                if calls == 3 {
                    handle.request();
                }
                Ok::<_, ProcessError>(())
            })
            .await;

        assert_eq!(calls, 3);
        assert_eq!(scheduler.passes(), 3);
        assert_eq!(scheduler.counter(), 0);
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test(start_paused = true)]
    async fn run_returns_immediately_when_already_requested() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.request();
        let mut scheduler = PollScheduler::new(config(10, 1));

        let mut calls = 0;
        let cancelled = scheduler
            .run(coordinator.signal(), || {
                calls += 1;
                Ok::<_, ProcessError>(())
            })
            .await;

        assert_eq!(cancelled, Cancelled);
        assert_eq!(calls, 0);
        assert_eq!(scheduler.counter(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn callback_error_does_not_stop_the_loop() {
        let coordinator = ShutdownCoordinator::new();
        let handle = coordinator.handle();
        let mut scheduler = PollScheduler::new(config(10, 1));

        let mut calls = 0;
        let _ = scheduler
            .run(coordinator.signal(), || {
                calls += 1;
                if calls == 2 {
                    handle.request();
                }
                Err::<(), _>(ProcessError::Timeout { slave: 0 })
            })
            .await;

        assert_eq!(calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_cuts_the_sleep_short() {
        let coordinator = ShutdownCoordinator::new();
        let handle = coordinator.handle();
        let mut scheduler = PollScheduler::new(config(3_600_000, 16));

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.request();
        });

        let start = Instant::now();
        let _ = scheduler
            .run(coordinator.signal(), || Ok::<_, ProcessError>(()))
            .await;

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(scheduler.counter(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_beyond_u64_millis_is_logged_and_kept_intact() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let coordinator = ShutdownCoordinator::new();
        coordinator.request();
        let tick = Duration::MAX;
        let mut scheduler = PollScheduler::new(SchedulerConfig { tick, threshold: 1 });

        let cancelled = scheduler
            .run(coordinator.signal(), || Ok::<_, ProcessError>(()))
            .await;

        assert_eq!(cancelled, Cancelled);
        assert_eq!(scheduler.config().tick, tick);
        assert!(tick.as_millis() > u128::from(u64::MAX));
    }
}
