use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index type used to address a slave within the pool.
///
/// Its width bounds the pool size: see [`MAX_SLAVES_LIMIT`].
pub type SlaveIndex = u8;

/// Largest slave count representable with [`SlaveIndex`].
pub const MAX_SLAVES_LIMIT: usize = SlaveIndex::MAX as usize;

/// Lifecycle state of a single slave handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlaveState {
    /// Released, or never brought up.
    Closed,
    /// Allocated and ready for processing on an open bus.
    Active,
}

/// Result of the last processing call made against a slave.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlaveStatus {
    /// No error recorded. Freshly allocated handles start here.
    #[default]
    Ok,
    /// The last processing call failed.
    Failed(ProcessError),
}

impl SlaveStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, SlaveStatus::Ok)
    }
}

/// Process exit statuses.  Every code is a fixed constant, never derived
/// from `errno`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitStatus {
    /// Normal exit.
    Success,
    /// The operator interrupted the daemon (SIGINT).
    Interrupted,
    /// The bus could not be opened at startup.
    BusInitFailed,
    /// The configured slave count is out of range.
    InvalidConfig,
    /// The slave pool could not be allocated.
    AllocationFailure,
}

impl ExitStatus {
    /// Process exit code reported to the parent.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Interrupted => 130,
            ExitStatus::BusInitFailed => 69,
            ExitStatus::InvalidConfig => 78,
            ExitStatus::AllocationFailure => 71,
        }
    }

    /// Legacy diagnostic fault code printed alongside the exit message.
    pub fn fault_code(self) -> Option<u32> {
        match self {
            ExitStatus::Interrupted => Some(0x1EA),
            ExitStatus::BusInitFailed => Some(0x1F5),
            _ => None,
        }
    }
}

impl From<&AllocError> for ExitStatus {
    fn from(err: &AllocError) -> Self {
        match err {
            AllocError::InvalidConfig { .. } => ExitStatus::InvalidConfig,
            AllocError::AllocationFailure { .. } => ExitStatus::AllocationFailure,
        }
    }
}

/// Errors reported by a bus driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("Bus {bus} failed to initialise: {details}")]
    InitFailed { bus: String, details: String },

    #[error("Bus {bus} failed to close: {details}")]
    CloseFailed { bus: String, details: String },

    #[error("Bus {bus} is not open")]
    NotOpen { bus: String },
}

/// Fatal slave-pool allocation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    #[error("Invalid slave pool configuration: {requested} slaves requested, allowed range is 1..={max}")]
    InvalidConfig { requested: usize, max: usize },

    #[error("Out of memory allocating {requested} slave handles")]
    AllocationFailure { requested: usize },
}

/// Recoverable per-slave processing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessError {
    #[error("Slave {slave} did not acknowledge")]
    Nack { slave: SlaveIndex },

    #[error("Slave {slave} timed out")]
    Timeout { slave: SlaveIndex },

    #[error("Protocol error on slave {slave}: {details}")]
    Protocol { slave: SlaveIndex, details: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let all = [
            ExitStatus::Success,
            ExitStatus::Interrupted,
            ExitStatus::BusInitFailed,
            ExitStatus::InvalidConfig,
            ExitStatus::AllocationFailure,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.code(), b.code(), "{a:?} and {b:?} share an exit code");
            }
        }
        assert_eq!(ExitStatus::Success.code(), 0);
    }

    #[test]
    fn exit_codes_fit_in_a_byte() {
        for status in [
            ExitStatus::Interrupted,
            ExitStatus::BusInitFailed,
            ExitStatus::InvalidConfig,
            ExitStatus::AllocationFailure,
        ] {
            assert!((1..=255).contains(&status.code()));
        }
    }

    #[test]
    fn fault_codes_match_legacy_values() {
        assert_eq!(ExitStatus::Interrupted.fault_code(), Some(490));
        assert_eq!(ExitStatus::BusInitFailed.fault_code(), Some(501));
        assert_eq!(ExitStatus::Success.fault_code(), None);
    }

    #[test]
    fn alloc_error_maps_to_exit_status() {
        let invalid = AllocError::InvalidConfig { requested: 0, max: MAX_SLAVES_LIMIT };
        assert_eq!(ExitStatus::from(&invalid), ExitStatus::InvalidConfig);

        let oom = AllocError::AllocationFailure { requested: 4 };
        assert_eq!(ExitStatus::from(&oom), ExitStatus::AllocationFailure);
    }

    #[test]
    fn slave_status_defaults_to_ok() {
        assert!(SlaveStatus::default().is_ok());
        assert!(!SlaveStatus::Failed(ProcessError::Nack { slave: 0 }).is_ok());
    }

    #[test]
    fn slave_status_serialization_roundtrip() {
        let status = SlaveStatus::Failed(ProcessError::Protocol {
            slave: 3,
            details: "bad crc".to_string(),
        });
        let json = serde_json::to_string(&status).unwrap();
        let back: SlaveStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, back);
    }

    #[test]
    fn error_display_carries_context() {
        let err = BusError::InitFailed {
            bus: "/dev/i2c-1".to_string(),
            details: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("/dev/i2c-1"));

        let err = AllocError::InvalidConfig { requested: 300, max: 255 };
        assert!(err.to_string().contains("300"));
        assert!(err.to_string().contains("1..=255"));
    }
}
