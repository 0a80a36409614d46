//! `pi2cd` – I²C bus master daemon.
//!
//! This binary:
//!
//! 1. Initialises structured logging (`RUST_LOG`, `PI2C_LOG_FORMAT`).
//! 2. Loads `/etc/pi2c/config.toml` (or `$PI2C_CONFIG`) plus `PI2C_*`
//!    overrides.
//! 3. Hooks **SIGINT** so Ctrl-C requests an orderly shutdown.  The hook
//!    only flips the shutdown flag; teardown runs on the main thread.
//! 4. Opens the bus, allocates the slave pool and polls it until
//!    interrupted, then exits with a fixed status code.

mod config;

use colored::Colorize;
use tracing::{error, info, warn};

use pi2c_hal::{BusDriver, DevBus, SimBus};
use pi2c_kernel::{NoopProcessor, ShutdownCoordinator};
use pi2c_runtime::{Supervisor, TracerProviderGuard, init_tracing};
use pi2c_types::ExitStatus;

fn main() {
    let guard = init_tracing("pi2cd");

    print_banner();

    let path = config::config_path();
    let cfg = match config::load() {
        Ok(cfg) => {
            info!(path = %path.display(), file_present = path.exists(), "config loaded");
            cfg
        }
        Err(e) => {
            error!(error = %e, "config error");
            finish(guard, ExitStatus::InvalidConfig);
        }
    };
    info!(
        bus = %cfg.bus_device,
        simulate = cfg.simulate,
        max_slaves = cfg.max_slaves,
        tick_ms = cfg.tick_ms,
        threshold_ticks = cfg.threshold_ticks,
        "starting"
    );

    let bus: Box<dyn BusDriver> = if cfg.simulate {
        Box::new(SimBus::new("sim-i2c"))
    } else {
        Box::new(DevBus::new(&cfg.bus_device))
    };
    let supervisor = Supervisor::new(
        cfg.supervisor_config(),
        bus,
        Box::new(NoopProcessor),
        ShutdownCoordinator::new(),
    );

    // ── SIGINT hook ───────────────────────────────────────────────────────
    let handle = supervisor.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        handle.request();
    }) {
        warn!(error = %e, "Failed to install SIGINT handler; Ctrl-C will terminate without teardown");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            finish(guard, ExitStatus::AllocationFailure);
        }
    };

    let status = runtime.block_on(supervisor.run());
    finish(guard, status);
}

/// Report `status`, flush telemetry and exit.
fn finish(guard: TracerProviderGuard, status: ExitStatus) -> ! {
    let message = match status {
        ExitStatus::Success => "clean exit",
        ExitStatus::Interrupted => "User requested program interrupt",
        ExitStatus::BusInitFailed => "Could not access the I2C bus",
        ExitStatus::InvalidConfig => "Invalid configuration",
        ExitStatus::AllocationFailure => "Out of resources",
    };
    match status.fault_code() {
        Some(code) => eprintln!("{} {:x} {}", "exiting:".yellow().bold(), code, message),
        None => eprintln!("{} {}", "exiting:".yellow().bold(), message),
    }
    info!(code = status.code(), ?status, "exiting");

    drop(guard);
    std::process::exit(status.code());
}

fn print_banner() {
    println!();
    println!("  {} {}", "pi2cd".bold().cyan(), format!("v{}", env!("CARGO_PKG_VERSION")).dimmed());
    println!("  I2C bus master daemon. Press {} to stop.", "Ctrl-C".bold());
    println!();
}
