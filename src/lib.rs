//! Domain Set - A concurrent, atomically reloadable domain suffix set for Rust
//!
//! This library decides whether a domain name equals or is a subdomain of any
//! entry in a configured list, matching whole labels only:
//! - Suffix-minimal radix tree over label-reversed keys
//! - Lookups under a shared lock, reloads swap the whole index atomically
//! - Domain list parsing and validation with reload-on-change
//! - Host route announcements driven by membership answers
//!
//! # Example
//!
//! ```rust
//! use domain_set_r::{parse_domain_list, SuffixSet};
//!
//! let list = "
//! ## Mining pools
//! antpool.com
//! eth.antpool.com   # covered by antpool.com
//! f2pool.com
//! not a domain
//! ";
//!
//! // Validate
//! let parsed = parse_domain_list(list);
//! assert_eq!(parsed.rejected, 1);
//!
//! // Build
//! let set = SuffixSet::new();
//! let stats = set.build(&parsed.domains).unwrap();
//! assert_eq!(stats.inserted, 2);
//! assert_eq!(stats.skipped, 1);
//!
//! // Match
//! assert!(set.contains("www.antpool.com"));
//! assert!(!set.contains("notantpool.com"));
//! ```
//!
//! # Matching Rules
//!
//! | Entry | Name | Match |
//! |-------|------|-------|
//! | `example.com` | `example.com` | yes |
//! | `example.com` | `a.b.example.com` | yes |
//! | `example.com` | `notexample.com` | no |
//! | `example.com` | `example.org` | no |
//! | `a.com` | `ab.com` | no |

pub mod error;
pub mod loader;
pub mod matcher;
pub mod parser;
pub mod route;
pub mod types;

// Re-export commonly used items
pub use error::{ListErrorKind, Result, RouteErrorKind, SetError};
pub use loader::{load_file, load_parsed, ListLoader};
pub use matcher::{HostMatcher, RadixTree, SuffixIndex, SuffixSet};
pub use parser::{
    is_valid_domain, parse_domain_list, parse_domain_list_from_file, parse_domain_reader,
    DEFAULT_MAX_ENTRIES,
};
pub use types::{BuildStats, LoadStats, ParsedList};

// Re-export route types
pub use route::{HostRoute, MemorySink, RouteConfig, RouteController, RouteSink};

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    #[test]
    fn test_full_workflow() {
        let list = r#"
# Blocked suffixes
example.com
mail.example.com
tracker.net

# Invalid entries
-bad.com
localhost
"#;

        // Parse and validate
        let parsed = parse_domain_list(list);
        assert_eq!(parsed.domains.len(), 3);
        assert_eq!(parsed.rejected, 2);

        // Build
        let set = Arc::new(SuffixSet::new());
        let stats = load_parsed(&set, parsed).unwrap();
        assert_eq!(stats.inserted, 2);
        assert_eq!(stats.redundant, 1);
        assert_eq!(stats.rejected, 2);
        assert_eq!(set.size(), 2);

        // Route matching names
        let sink = Arc::new(MemorySink::new());
        let config = RouteConfig::new(Ipv4Addr::new(10, 0, 0, 1));
        let controller = RouteController::new(set.clone(), sink.clone(), config).unwrap();

        let ip: IpAddr = "198.51.100.4".parse().unwrap();
        assert_eq!(controller.observe("cdn.tracker.net", &[ip]).unwrap(), 1);
        assert_eq!(controller.observe("nottracker.net", &[ip]).unwrap(), 0);
        assert!(sink.has(ip));

        // Reload drops the old list
        set.build(["other.org"]).unwrap();
        assert!(!set.contains("cdn.tracker.net"));
        assert!(set.contains("www.other.org"));
    }
}
