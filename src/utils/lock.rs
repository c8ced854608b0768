//! Run-level mutual exclusion
//!
//! A single advisory file lock keeps two archiver runs from interleaving.
//! The OS drops the lock when the process dies, so a crashed run never
//! blocks the next one.

use crate::utils::error::VidvaultError;
use anyhow::Result;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Held for the duration of one run; released (and the file removed) on drop.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock, failing fast if another run already holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(VidvaultError::LockHeld.into());
        }

        // PID is informational only; exclusion comes from the OS lock.
        let _ = write!(file, "{}", std::process::id());
        debug!("Acquired run lock at {}", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs2::FileExt::unlock(&self.file) {
            warn!("Failed to release run lock: {}", e);
        }
        let _ = std::fs::remove_file(&self.path);
        debug!("Released run lock at {}", self.path.display());
    }
}
