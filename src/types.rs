/// Outcome of a successful suffix set build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Domains inserted into the new index
    pub inserted: usize,
    /// Domains dropped because an inserted suffix already covers them
    pub skipped: usize,
}

/// Outcome of loading a domain list into a suffix set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Domains inserted into the new index
    pub inserted: usize,
    /// Valid domains covered by another entry
    pub redundant: usize,
    /// Lines that failed domain syntax validation
    pub rejected: usize,
}

impl LoadStats {
    /// Combine parser and build results
    pub fn new(build: BuildStats, rejected: usize) -> Self {
        Self {
            inserted: build.inserted,
            redundant: build.skipped,
            rejected,
        }
    }

    /// Total number of lines that did not end up in the index
    pub fn skipped(&self) -> usize {
        self.redundant + self.rejected
    }
}

/// Validated domains extracted from a list source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedList {
    /// Domains that passed syntax validation, lowercased, in input order
    pub domains: Vec<String>,
    /// Number of non-blank lines that failed validation
    pub rejected: usize,
}
