//! [`DevBus`] – I²C master on a Linux character device.
//!
//! The kernel's `i2c-dev` driver exposes each adapter as `/dev/i2c-N`.
//! Holding the file open keeps the adapter claimed; dropping it releases
//! the adapter.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pi2c_types::BusError;
use tracing::{debug, info};

use crate::bus::BusDriver;

/// I²C adapter backed by a `/dev/i2c-N` device node.
pub struct DevBus {
    id: String,
    path: PathBuf,
    file: Option<File>,
}

impl DevBus {
    /// Create a driver for the device node at `path`.  Nothing is touched
    /// until [`BusDriver::open`] is called.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            id: path.display().to_string(),
            path,
            file: None,
        }
    }
}

impl BusDriver for DevBus {
    fn id(&self) -> &str {
        &self.id
    }

    fn open(&mut self) -> Result<(), BusError> {
        if self.file.is_some() {
            debug!(bus = %self.id, "bus already open");
            return Ok(());
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| BusError::InitFailed {
                bus: self.id.clone(),
                details: match e.kind() {
                    ErrorKind::PermissionDenied => format!("{e}; please run as root"),
                    _ => e.to_string(),
                },
            })?;
        self.file = Some(file);
        info!(bus = %self.id, "bus open");
        Ok(())
    }

    fn close(&mut self) -> Result<(), BusError> {
        if self.file.take().is_some() {
            info!(bus = %self.id, "bus closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_device_fails_with_init_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let mut bus = DevBus::new(dir.path().join("i2c-9"));
        let err = bus.open().unwrap_err();
        assert!(matches!(err, BusError::InitFailed { .. }));
        assert!(!bus.is_open());
    }

    #[test]
    fn open_and_close_device_node() {
        let node = tempfile::NamedTempFile::new().expect("tmp file");
        let mut bus = DevBus::new(node.path());
        bus.open().expect("open");
        assert!(bus.is_open());
        bus.close().expect("close");
        assert!(!bus.is_open());
    }

    #[test]
    fn close_is_idempotent() {
        let node = tempfile::NamedTempFile::new().expect("tmp file");
        let mut bus = DevBus::new(node.path());
        bus.close().expect("close before open");
        bus.open().expect("open");
        bus.close().expect("first close");
        bus.close().expect("second close");
        assert!(!bus.is_open());
    }

    #[test]
    fn id_is_device_path() {
        let bus = DevBus::new("/dev/i2c-1");
        assert_eq!(bus.id(), "/dev/i2c-1");
    }
}
