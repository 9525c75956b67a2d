//! Domain key helpers.
//!
//! Domains are stored label-reversed (`mail.example.com` -> `com.example.mail`)
//! so that "is a domain suffix of" becomes "is a string prefix of".

use std::borrow::Cow;

/// Reverse the label order of a domain (or of a reversed key).
///
/// `reverse(reverse(d)) == d` for any input.
pub fn reverse(domain: &str) -> String {
    let mut out = String::with_capacity(domain.len());
    for (i, label) in domain.rsplit('.').enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(label);
    }
    out
}

/// Number of labels in a domain or reversed key.
#[inline]
pub fn level(domain: &str) -> usize {
    domain.bytes().filter(|&b| b == b'.').count() + 1
}

/// Check that `prefix` ends on a label boundary of `key`.
///
/// `prefix` must be a string prefix of `key`. The boundary is derived from the
/// byte length of the prefix: either the key ends exactly there, or the next
/// byte in the key is a label separator. `com.a` is a prefix of `com.ab` but
/// not on a boundary; it is a boundary of `com.a.www`.
#[inline]
pub fn is_label_boundary(prefix: &str, key: &str) -> bool {
    debug_assert!(key.starts_with(prefix));
    match key.as_bytes().get(prefix.len()) {
        None => true,
        Some(&b) => b == b'.',
    }
}

/// Normalize a lookup name: strip one trailing root dot and lowercase.
///
/// Only allocates when the name contains uppercase ASCII.
pub fn normalize(name: &str) -> Cow<'_, str> {
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}
