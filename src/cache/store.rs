//! Disk-backed icon store keyed by entry id
//!
//! The file `<cache_dir>/<id>.png` existing *is* the cache record. Every write
//! goes to its own temporary file in the cache directory and is renamed into
//! place, so a visible file always holds a complete icon and concurrent saves
//! of one id never share a scratch file.

use crate::entries::EntryId;
use crate::error::{VaultIconError, VaultIconResult};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

const ICON_EXTENSION: &str = "png";

/// Write-once, read-many icon cache
#[derive(Debug, Clone)]
pub struct IconCache {
    dir: PathBuf,
    default_icon: PathBuf,
}

impl IconCache {
    /// Read-only view of the cache; touches nothing on disk
    pub fn new(dir: impl Into<PathBuf>, default_icon: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            default_icon: default_icon.into(),
        }
    }

    /// Open the cache for writing, creating its directory if absent
    ///
    /// Failing to create the directory is fatal for a sync run.
    pub fn open(dir: impl Into<PathBuf>, default_icon: impl Into<PathBuf>) -> VaultIconResult<Self> {
        let cache = Self::new(dir, default_icon);
        fs::create_dir_all(&cache.dir).map_err(|e| VaultIconError::CacheDirCreate {
            path: cache.dir.clone(),
            source: e,
        })?;
        Ok(cache)
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic location of the icon for `id`
    pub fn path_for(&self, id: &EntryId) -> PathBuf {
        self.dir.join(format!("{}.{}", id, ICON_EXTENSION))
    }

    /// Whether an icon was previously fetched for `id`
    pub fn has(&self, id: &EntryId) -> bool {
        self.path_for(id).is_file()
    }

    /// Store icon bytes for `id`, returning the final path
    ///
    /// The last writer wins when the same id is saved more than once.
    pub fn save(&self, id: &EntryId, bytes: &[u8]) -> VaultIconResult<PathBuf> {
        let target = self.path_for(id);

        let mut partial = NamedTempFile::new_in(&self.dir).map_err(|e| {
            VaultIconError::io(format!("creating icon file in {}", self.dir.display()), e)
        })?;
        partial
            .write_all(bytes)
            .map_err(|e| VaultIconError::io(format!("writing icon for {}", id), e))?;
        // The temporary file is deleted when the persist error drops it.
        partial.persist(&target).map_err(|e| {
            VaultIconError::io(
                format!("moving icon into place at {}", target.display()),
                e.error,
            )
        })?;

        debug!("Cached icon for {} ({} bytes)", id, bytes.len());
        Ok(target)
    }

    /// Fallback icon used whenever nothing is cached
    pub fn default_icon(&self) -> &Path {
        &self.default_icon
    }

    /// Icon to display for `id`: the cached file, else the default
    pub fn resolve(&self, id: &EntryId) -> PathBuf {
        let path = self.path_for(id);
        if path.is_file() {
            path
        } else {
            self.default_icon.clone()
        }
    }

    /// Number of cached icons; zero if the directory was never created
    pub fn cached_count(&self) -> VaultIconResult<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(VaultIconError::io(
                    format!("reading cache directory {}", self.dir.display()),
                    e,
                ))
            }
        };

        let mut count = 0;
        for entry in entries {
            let entry = entry.map_err(|e| VaultIconError::io("reading cache entry", e))?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == ICON_EXTENSION) {
                count += 1;
            }
        }
        Ok(count)
    }
}
