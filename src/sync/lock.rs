//! Filesystem-backed sync lock
//!
//! The host relaunches the extension process for every event, so the lock
//! cannot live in memory. A marker file at a fixed path is the lock: its
//! presence means a sync run is active, whichever process created it.

use crate::error::{VaultIconError, VaultIconResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Contents of the marker file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

impl LockInfo {
    fn current() -> Self {
        Self {
            pid: std::process::id(),
            started_at: Utc::now(),
        }
    }

    /// Whether the holding process still exists
    #[cfg(target_os = "linux")]
    pub fn is_holder_alive(&self) -> bool {
        Path::new("/proc").join(self.pid.to_string()).exists()
    }

    /// Without procfs a recorded holder is always assumed alive.
    #[cfg(not(target_os = "linux"))]
    pub fn is_holder_alive(&self) -> bool {
        true
    }
}

/// Cross-process mutual exclusion for sync runs
#[derive(Debug, Clone)]
pub struct SyncLock {
    path: PathBuf,
}

impl SyncLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-blocking check, valid from any process
    pub fn try_is_held(&self) -> bool {
        self.path.exists()
    }

    /// Who holds the lock, if the marker is readable
    pub fn holder(&self) -> Option<LockInfo> {
        let content = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Create the marker
    ///
    /// Creation is exclusive: if another run created the marker first this
    /// fails with `SyncInProgress` instead of taking over its lock. The
    /// holder record is written to a scratch file and linked into place, so
    /// a visible marker is never empty.
    pub fn acquire(&self) -> VaultIconResult<SyncLockGuard> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut scratch = NamedTempFile::new_in(dir).map_err(|e| {
            VaultIconError::io(format!("creating sync lock in {}", dir.display()), e)
        })?;
        serde_json::to_writer(&mut scratch, &LockInfo::current())?;
        scratch.flush().map_err(|e| {
            VaultIconError::io(format!("writing sync lock {}", self.path.display()), e)
        })?;

        match scratch.persist_noclobber(&self.path) {
            Ok(_) => {}
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                return Err(VaultIconError::SyncInProgress(self.path.clone()));
            }
            Err(e) => {
                return Err(VaultIconError::io(
                    format!("creating sync lock {}", self.path.display()),
                    e.error,
                ))
            }
        }

        debug!("Acquired sync lock {}", self.path.display());
        Ok(SyncLockGuard {
            path: self.path.clone(),
            released: false,
        })
    }

    /// Remove a marker left behind by a process that no longer exists
    ///
    /// Returns whether a marker was removed. A live holder is never broken;
    /// a marker that does not parse as a holder record counts as stale.
    pub fn break_stale(&self) -> VaultIconResult<bool> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(VaultIconError::io(
                    format!("reading sync lock {}", self.path.display()),
                    e,
                ))
            }
        };
        let holder: Option<LockInfo> = serde_json::from_slice(&content).ok();
        if holder.is_some_and(|info| info.is_holder_alive()) {
            return Ok(false);
        }

        remove_marker(&self.path).map_err(|e| VaultIconError::LockRelease {
            path: self.path.clone(),
            source: e,
        })?;
        warn!("Removed stale sync lock {}", self.path.display());
        Ok(true)
    }
}

/// Held lock; the marker is removed on `release` or drop
#[derive(Debug)]
pub struct SyncLockGuard {
    path: PathBuf,
    released: bool,
}

impl SyncLockGuard {
    /// Remove the marker, reporting failure
    pub fn release(mut self) -> VaultIconResult<()> {
        self.released = true;
        remove_marker(&self.path).map_err(|e| VaultIconError::LockRelease {
            path: self.path.clone(),
            source: e,
        })?;
        debug!("Released sync lock {}", self.path.display());
        Ok(())
    }
}

impl Drop for SyncLockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = remove_marker(&self.path) {
            warn!("Failed to remove sync lock {}: {}", self.path.display(), e);
        }
    }
}

fn remove_marker(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
