//! Domain list loading.
//!
//! Reads a domain list file, validates each line and installs the result into
//! a [`SuffixSet`]. [`ListLoader`] adds reload-on-change driven by the file's
//! modification time.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Result, SetError};
use crate::matcher::SuffixSet;
use crate::parser::{parse_domain_list_from_file, DEFAULT_MAX_ENTRIES};
use crate::types::{LoadStats, ParsedList};

/// Load a domain list file into `set`.
///
/// Lines failing domain validation are counted as rejected and never reach
/// the build. If nothing survives, the error reports rejected and redundant
/// lines as one skipped count and the previous index stays live.
pub fn load_file(set: &SuffixSet, path: impl AsRef<Path>) -> Result<LoadStats> {
    let parsed = parse_domain_list_from_file(path.as_ref(), DEFAULT_MAX_ENTRIES)?;
    load_parsed(set, parsed)
}

/// Install an already parsed list into `set`.
pub fn load_parsed(set: &SuffixSet, parsed: ParsedList) -> Result<LoadStats> {
    let rejected = parsed.rejected;
    match set.build(&parsed.domains) {
        Ok(build) => Ok(LoadStats::new(build, rejected)),
        Err(SetError::EmptyResult { skipped }) => Err(SetError::EmptyResult {
            skipped: skipped + rejected,
        }),
        Err(e) => Err(e),
    }
}

/// File-backed domain list with reload-on-change
pub struct ListLoader {
    path: PathBuf,
    max_entries: usize,
    /// Modification time of the last successfully installed list
    loaded_mtime: Mutex<Option<SystemTime>>,
}

impl ListLoader {
    /// Create a loader for the list at `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_entries: DEFAULT_MAX_ENTRIES,
            loaded_mtime: Mutex::new(None),
        }
    }

    /// Set maximum number of candidate lines accepted from the list
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Path of the list file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the list into `set` unconditionally.
    pub fn load(&self, set: &SuffixSet) -> Result<LoadStats> {
        let mtime = self.modified();
        let stats = self.load_inner(set)?;
        *self.loaded_mtime.lock() = mtime;
        Ok(stats)
    }

    /// Reload the list if its modification time differs from the last
    /// successful load. Returns `Ok(None)` when nothing changed.
    ///
    /// A failed load leaves the previous index live and does not record the
    /// new modification time, so the next call retries.
    pub fn reload_if_changed(&self, set: &SuffixSet) -> Result<Option<LoadStats>> {
        let mtime = self.modified();
        {
            let loaded = self.loaded_mtime.lock();
            if mtime.is_some() && *loaded == mtime {
                debug!(path = %self.path.display(), "domain list unchanged");
                return Ok(None);
            }
        }

        let stats = self.load_inner(set)?;
        *self.loaded_mtime.lock() = mtime;
        Ok(Some(stats))
    }

    fn load_inner(&self, set: &SuffixSet) -> Result<LoadStats> {
        let parsed = parse_domain_list_from_file(&self.path, self.max_entries).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "unable to read domain list");
            e
        })?;

        match load_parsed(set, parsed) {
            Ok(stats) => {
                info!(
                    path = %self.path.display(),
                    inserted = stats.inserted,
                    redundant = stats.redundant,
                    rejected = stats.rejected,
                    "domain list loaded"
                );
                Ok(stats)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "domain list not loaded");
                Err(e)
            }
        }
    }

    fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }
}
