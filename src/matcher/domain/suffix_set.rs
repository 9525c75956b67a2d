//! Domain suffix set.
//!
//! `SuffixIndex` is an immutable, suffix-minimal radix tree of reversed domain
//! keys. `SuffixSet` holds the live index behind a read-write lock and replaces
//! it wholesale on every build, so readers always see a complete snapshot.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::key::{is_label_boundary, normalize, reverse};
use super::radix::RadixTree;
use crate::error::{Result, SetError};
use crate::matcher::HostMatcher;
use crate::types::BuildStats;

/// Immutable suffix-minimal index of reversed domain keys
#[derive(Debug, Clone, Default)]
pub struct SuffixIndex {
    tree: RadixTree,
}

impl SuffixIndex {
    /// Build a suffix-minimal index from domain names.
    ///
    /// Domains are normalized like lookup names, reversed and sorted so every
    /// suffix precedes the domains it covers; a single pass then inserts only
    /// the keys that no earlier key covers on a label boundary. Duplicates and
    /// names that normalize to nothing count as skipped.
    ///
    /// Returns the index and build statistics. The index may be empty; it is
    /// up to [`SuffixSet::build`] to refuse installing it.
    pub fn build<I, S>(domains: I) -> (Self, BuildStats)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stats = BuildStats::default();
        let mut keys: Vec<String> = Vec::new();
        for domain in domains {
            let domain = normalize(domain.as_ref());
            if domain.is_empty() {
                stats.skipped += 1;
                continue;
            }
            keys.push(reverse(&domain));
        }
        keys.sort_unstable();

        let mut tree = RadixTree::new();

        for key in &keys {
            if covered(&tree, key) {
                stats.skipped += 1;
                continue;
            }
            tree.insert(key);
            stats.inserted += 1;
        }

        (Self { tree }, stats)
    }

    /// Number of entries in the index
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Check if `name` equals or is a subdomain of any indexed domain.
    pub fn contains(&self, name: &str) -> bool {
        let name = normalize(name);
        if name.is_empty() {
            return false;
        }
        covered(&self.tree, &reverse(&name))
    }

    /// Check an already reversed key
    #[inline]
    pub fn contains_reversed(&self, key: &str) -> bool {
        covered(&self.tree, key)
    }

    /// Indexed domains in their normal (non-reversed) form, ordered by
    /// reversed key.
    pub fn domains(&self) -> Vec<String> {
        self.tree.keys().iter().map(|k| reverse(k)).collect()
    }
}

/// Longest-prefix lookup followed by the label boundary check.
///
/// The index is suffix-minimal, so if the longest prefix is a partial-label
/// match no shorter prefix can be a label-aligned one.
#[inline]
fn covered(tree: &RadixTree, key: &str) -> bool {
    match tree.longest_prefix(key) {
        Some(prefix) => is_label_boundary(prefix, key),
        None => false,
    }
}

impl HostMatcher for SuffixIndex {
    fn matches(&self, name: &str) -> bool {
        self.contains(name)
    }
}

/// Concurrently readable, atomically replaceable domain suffix set
///
/// ```
/// use domain_set_r::SuffixSet;
///
/// let set = SuffixSet::new();
/// let stats = set.build(["example.com", "mail.example.com"]).unwrap();
/// assert_eq!(stats.inserted, 1);
/// assert_eq!(stats.skipped, 1);
///
/// assert!(set.contains("www.example.com"));
/// assert!(!set.contains("notexample.com"));
/// ```
#[derive(Debug, Default)]
pub struct SuffixSet {
    index: RwLock<Arc<SuffixIndex>>,
}

impl SuffixSet {
    /// Create an empty set. Nothing matches until the first successful build.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the live index with one built from `domains`.
    ///
    /// The new index is built without holding the lock; the write lock only
    /// covers the pointer swap. If no domain survives, nothing is installed
    /// and the previous index stays live.
    pub fn build<I, S>(&self, domains: I) -> Result<BuildStats>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (index, stats) = SuffixIndex::build(domains);
        debug!(
            inserted = stats.inserted,
            skipped = stats.skipped,
            "suffix index built"
        );

        if index.is_empty() {
            warn!(skipped = stats.skipped, "refusing to install empty suffix index");
            return Err(SetError::EmptyResult {
                skipped: stats.skipped,
            });
        }

        self.install(index);
        info!(entries = stats.inserted, "suffix index installed");
        Ok(stats)
    }

    fn install(&self, index: SuffixIndex) {
        let index = Arc::new(index);
        // Old snapshot is dropped after the guard is released
        let _old = {
            let mut live = self.index.write();
            std::mem::replace(&mut *live, index)
        };
    }

    /// Check if `name` equals or is a subdomain of any domain in the set.
    pub fn contains(&self, name: &str) -> bool {
        let name = normalize(name);
        if name.is_empty() {
            return false;
        }
        let key = reverse(&name);
        self.index.read().contains_reversed(&key)
    }

    /// Number of entries in the live index
    pub fn size(&self) -> usize {
        self.index.read().len()
    }

    /// Check if the live index is empty (nothing built yet)
    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Current snapshot. Stays valid after later builds replace it.
    pub fn snapshot(&self) -> Arc<SuffixIndex> {
        self.index.read().clone()
    }
}

impl HostMatcher for SuffixSet {
    fn matches(&self, name: &str) -> bool {
        self.contains(name)
    }
}
