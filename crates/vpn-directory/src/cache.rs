// ============================================
// File: crates/vpn-directory/src/cache.rs
// ============================================
//! # Directory Cache Store
//!
//! ## Creation Reason
//! Keeps the last successfully fetched directory on disk so `list` works
//! without network access.
//!
//! ## Main Functionality
//! - `DirectoryCache::save`: Atomic replace (temp file + rename)
//! - `DirectoryCache::try_load`: Path search with typed errors
//! - `DirectoryCache::load`: Degraded load, placeholder on any failure
//!
//! ## Search Order
//! ```text
//! <dir>/<file>        (primary, also the save target)
//! <dir>/../<file>     (fallback)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The file is exactly a JSON array of records, no envelope
//! - The temp file must live in the target directory, rename is only
//!   atomic within one filesystem
//!
//! ## Last Modified
//! v0.1.0 - Initial cache store

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{DirectoryError, Result};
use crate::record::DirectoryRecord;

/// Default cache file name.
pub const DEFAULT_CACHE_FILE: &str = "servers.json";

// ============================================
// DirectoryCache
// ============================================

/// On-disk store for the last known-good directory.
#[derive(Debug, Clone)]
pub struct DirectoryCache {
    candidates: Vec<PathBuf>,
}

impl DirectoryCache {
    /// Creates a cache rooted at `dir`, with a parent-directory fallback.
    pub fn new(dir: impl AsRef<Path>, file_name: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            candidates: vec![dir.join(file_name), dir.join("..").join(file_name)],
        }
    }

    /// Creates a cache with an explicit search list. The first path is
    /// the save target.
    ///
    /// # Panics
    /// Panics if `candidates` is empty.
    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        assert!(!candidates.is_empty(), "cache needs at least one path");
        Self { candidates }
    }

    /// Path written by [`save`](Self::save).
    #[must_use]
    pub fn primary_path(&self) -> &Path {
        &self.candidates[0]
    }

    /// Paths searched by [`load`](Self::load), in order.
    #[must_use]
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Loads the first readable, parseable candidate.
    ///
    /// # Errors
    /// - `CacheNotFound` if no candidate exists
    /// - The error of the last candidate that existed but could not be used
    pub fn try_load(&self) -> Result<Vec<DirectoryRecord>> {
        let mut last_error = None;

        for path in &self.candidates {
            if !path.is_file() {
                continue;
            }
            match read_records(path) {
                Ok(records) => {
                    debug!(path = %path.display(), count = records.len(), "Directory cache loaded");
                    return Ok(records);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unusable directory cache");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DirectoryError::CacheNotFound {
            searched: self.candidates.clone(),
        }))
    }

    /// Loads the cached directory, or the single placeholder record if no
    /// candidate can be used.
    #[must_use]
    pub fn load(&self) -> Vec<DirectoryRecord> {
        match self.try_load() {
            Ok(records) => records,
            Err(e) => {
                debug!(error = %e, "Falling back to placeholder directory");
                vec![DirectoryRecord::placeholder()]
            }
        }
    }

    /// Replaces the cache content with `records`.
    ///
    /// Readers see either the previous file or the new one, never a
    /// partial write.
    ///
    /// # Errors
    /// Returns `Io` if the directory, temp file or rename fails.
    pub fn save(&self, records: &[DirectoryRecord]) -> Result<()> {
        let path = self.primary_path();
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        std::fs::create_dir_all(parent)
            .map_err(|e| DirectoryError::io(format!("creating {}", parent.display()), e))?;

        let json = serde_json::to_vec(records)
            .map_err(|e| DirectoryError::io("serializing directory", e.into()))?;

        let mut tmp = NamedTempFile::new_in(parent)
            .map_err(|e| DirectoryError::io(format!("creating temp file in {}", parent.display()), e))?;
        tmp.write_all(&json)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| DirectoryError::io("writing directory cache", e))?;
        tmp.persist(path)
            .map_err(|e| DirectoryError::io(format!("replacing {}", path.display()), e.error))?;

        info!(path = %path.display(), count = records.len(), "Directory cache saved");
        Ok(())
    }
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new(".", DEFAULT_CACHE_FILE)
    }
}

fn read_records(path: &Path) -> Result<Vec<DirectoryRecord>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| DirectoryError::io(format!("reading {}", path.display()), e))?;
    serde_json::from_str(&content).map_err(|e| DirectoryError::cache_parse(path, e.to_string()))
}

// ============================================
// Tests
// ============================================
