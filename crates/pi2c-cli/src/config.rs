//! Daemon configuration – reads `/etc/pi2c/config.toml`.
//!
//! Every value is read once at startup.  Missing keys take their defaults;
//! a missing file means "all defaults".  `PI2C_*` overrides apply in both
//! cases.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pi2c_runtime::{SchedulerConfig, SupervisorConfig};

/// Default location of the config file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/pi2c/config.toml";

/// Startup configuration of `pi2cd`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// I²C adapter device node.
    #[serde(default = "default_bus_device")]
    pub bus_device: String,

    /// Run against the in-process simulated bus instead of `bus_device`.
    #[serde(default)]
    pub simulate: bool,

    /// Number of slave handles to allocate (1..=255).
    #[serde(default = "default_max_slaves")]
    pub max_slaves: usize,

    /// Tick length in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Ticks between processing passes.
    #[serde(default = "default_threshold_ticks")]
    pub threshold_ticks: u32,
}

fn default_bus_device() -> String {
    "/dev/i2c-1".to_string()
}
fn default_max_slaves() -> usize {
    1
}
fn default_tick_ms() -> u64 {
    500
}
fn default_threshold_ticks() -> u32 {
    16
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus_device: default_bus_device(),
            simulate: false,
            max_slaves: default_max_slaves(),
            tick_ms: default_tick_ms(),
            threshold_ticks: default_threshold_ticks(),
        }
    }
}

impl Config {
    /// Settings for the [`Supervisor`][pi2c_runtime::Supervisor].  The slave
    /// count is passed through unchecked; the supervisor rejects bad values.
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            max_slaves: self.max_slaves,
            scheduler: SchedulerConfig {
                tick: Duration::from_millis(self.tick_ms),
                threshold: self.threshold_ticks,
            },
        }
    }
}

/// Path of the config file: `PI2C_CONFIG` if set, else
/// [`DEFAULT_CONFIG_PATH`].
pub fn config_path() -> PathBuf {
    std::env::var("PI2C_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load the config file, falling back to defaults when it does not exist,
/// then apply `PI2C_*` overrides.
pub fn load() -> Result<Config, String> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load the config from a specific path, without env overrides.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| format!("Failed to parse config at {}: {}", path.display(), e))
}

/// Apply `PI2C_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `PI2C_BUS_DEVICE` | `bus_device` |
/// | `PI2C_SIMULATE` | `simulate` (`true`/`false`) |
/// | `PI2C_MAX_SLAVES` | `max_slaves` |
/// | `PI2C_TICK_MS` | `tick_ms` |
/// | `PI2C_THRESHOLD` | `threshold_ticks` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("PI2C_BUS_DEVICE") {
        cfg.bus_device = v;
    }
    if let Ok(v) = std::env::var("PI2C_SIMULATE")
        && let Ok(simulate) = v.parse::<bool>()
    {
        cfg.simulate = simulate;
    }
    if let Ok(v) = std::env::var("PI2C_MAX_SLAVES")
        && let Ok(n) = v.parse::<usize>()
    {
        cfg.max_slaves = n;
    }
    if let Ok(v) = std::env::var("PI2C_TICK_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.tick_ms = ms;
    }
    if let Ok(v) = std::env::var("PI2C_THRESHOLD")
        && let Ok(ticks) = v.parse::<u32>()
    {
        cfg.threshold_ticks = ticks;
    }
}
