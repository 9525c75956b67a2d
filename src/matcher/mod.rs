pub mod domain;

pub use domain::{RadixTree, SuffixIndex, SuffixSet};

/// Trait for host matchers
pub trait HostMatcher: Send + Sync {
    /// Check if the host name matches this matcher
    fn matches(&self, name: &str) -> bool;
}

impl<M: HostMatcher + ?Sized> HostMatcher for std::sync::Arc<M> {
    fn matches(&self, name: &str) -> bool {
        (**self).matches(name)
    }
}
