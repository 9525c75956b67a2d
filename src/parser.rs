use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use crate::error::{ListErrorKind, Result, SetError};
use crate::types::ParsedList;

/// Regex pattern for a canonical domain name
/// Labels of lowercase letters, digits and inner hyphens; at least two labels;
/// alphabetic top-level label of length >= 2.
static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z0-9]+(-[a-z0-9]+)*\.)+[a-z]{2,}$")
        .expect("DOMAIN_PATTERN: hardcoded regex is invalid")
});

/// Default maximum number of candidate lines accepted from one list.
pub const DEFAULT_MAX_ENTRIES: usize = 1_000_000;

/// Check domain syntax. Input must already be lowercased.
pub fn is_valid_domain(domain: &str) -> bool {
    DOMAIN_PATTERN.is_match(domain)
}

/// Strip comments and whitespace from a list line.
/// Returns `None` for blank and comment-only lines.
fn clean_line(line: &str) -> Option<&str> {
    let line = match line.find('#') {
        Some(comment_pos) => &line[..comment_pos],
        None => line,
    };
    let line = line.trim();
    (!line.is_empty()).then_some(line)
}

/// Accumulates validated domains and the rejected count
struct ListBuilder {
    parsed: ParsedList,
    candidates: usize,
    max_entries: usize,
}

impl ListBuilder {
    fn new(max_entries: usize) -> Self {
        Self {
            parsed: ParsedList::default(),
            candidates: 0,
            max_entries,
        }
    }

    fn push_line(&mut self, line: &str) -> Result<()> {
        let Some(candidate) = clean_line(line) else {
            return Ok(());
        };

        self.candidates += 1;
        if self.candidates > self.max_entries {
            return Err(SetError::ListError {
                kind: ListErrorKind::TooLarge,
                message: format!("More than {} entries in domain list", self.max_entries),
            });
        }

        let domain = candidate.to_ascii_lowercase();
        if is_valid_domain(&domain) {
            self.parsed.domains.push(domain);
        } else {
            self.parsed.rejected += 1;
        }
        Ok(())
    }

    /// Raw line from a reader. Invalid UTF-8 becomes U+FFFD, which never
    /// passes validation, so such lines count as rejected.
    fn push_bytes(&mut self, line: &[u8]) -> Result<()> {
        self.push_line(&String::from_utf8_lossy(line))
    }

    fn finish(self) -> ParsedList {
        self.parsed
    }
}

/// Parse a newline-separated domain list.
///
/// `#` starts a comment; blank lines are ignored. Every other line is
/// lowercased and validated, failures are counted in `rejected`.
pub fn parse_domain_list(text: &str) -> ParsedList {
    let mut builder = ListBuilder::new(usize::MAX);
    for line in text.lines() {
        // Unbounded builder never fails
        let _ = builder.push_line(line);
    }
    builder.finish()
}

/// Parse a domain list from a buffered reader, refusing lists with more than
/// `max_entries` candidate lines.
pub fn parse_domain_reader<R: BufRead>(reader: R, max_entries: usize) -> Result<ParsedList> {
    let mut builder = ListBuilder::new(max_entries);
    for line in reader.split(b'\n') {
        let line = line.map_err(|e| SetError::ListError {
            kind: ListErrorKind::Unreadable,
            message: format!("Unable to read file: {}", e),
        })?;
        builder.push_bytes(&line)?;
    }
    Ok(builder.finish())
}

/// Parse a domain list file.
pub fn parse_domain_list_from_file(
    path: impl AsRef<Path>,
    max_entries: usize,
) -> Result<ParsedList> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        let kind = match e.kind() {
            ErrorKind::NotFound => ListErrorKind::NotFound,
            _ => ListErrorKind::Unreadable,
        };
        SetError::ListError {
            kind,
            message: format!("Unable to open file '{}': {}", path.display(), e),
        }
    })?;
    parse_domain_reader(BufReader::new(file), max_entries)
}
