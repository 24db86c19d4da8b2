//! Advisory, cross-process exclusion for the serial device.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use fs2::FileExt;

use crate::errors::DriverError;

const LOCK_FILE_NAME: &str = "cplot-axidraw.lock";

fn lock_path() -> PathBuf {
    let dir = std::env::var("TMPDIR").filter(|v| !v.is_empty()).unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(dir).join(LOCK_FILE_NAME)
}

/// An exclusive hold on the device lock file; released on drop.
pub struct LockHandle {
    file: File,
}

impl LockHandle {
    /// Acquires the lock, failing fast with [`DriverError::Busy`] if another
    /// process already holds it.
    pub fn acquire() -> Result<Self, DriverError> {
        let path = lock_path();
        let mut opts = OpenOptions::new();
        opts.create(true).write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        let mut file = opts.open(&path)?;
        // Only touch the file's contents once we actually hold the lock: a
        // losing acquirer must not truncate the winner's pid line.
        file.try_lock_exclusive().map_err(|_| DriverError::Busy)?;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        writeln!(file, "pid={}", std::process::id())?;
        Ok(Self { file })
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
