//! Label-aware domain suffix matching.
//!
//! This module provides:
//! - Reversed-key helpers (`mail.example.com` <-> `com.example.mail`)
//! - A radix tree with longest-prefix lookup
//! - A suffix-minimal index and a concurrently readable, atomically
//!   replaceable set built on top of it
//!
//! ## Example
//!
//! ```
//! use domain_set_r::matcher::domain::SuffixSet;
//!
//! let set = SuffixSet::new();
//! set.build(["google.com", "mail.google.com", "youtube.com"]).unwrap();
//!
//! assert_eq!(set.size(), 2);                 // mail.google.com is covered
//! assert!(set.contains("google.com"));       // the suffix itself
//! assert!(set.contains("www.google.com"));   // subdomain
//! assert!(!set.contains("notgoogle.com"));   // whole labels only
//! ```

pub mod key;
pub mod radix;
mod suffix_set;

pub use key::{level, reverse};
pub use radix::RadixTree;
pub use suffix_set::{SuffixIndex, SuffixSet};
