use thiserror::Error;

/// Classifies domain list errors for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListErrorKind {
    /// List file does not exist
    NotFound,
    /// List file could not be opened or read
    Unreadable,
    /// List has more candidate lines than the configured limit
    TooLarge,
}

/// Classifies route controller errors for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteErrorKind {
    /// The route sink refused the announcement or withdrawal
    Rejected,
}

/// Domain set error types
#[derive(Error, Debug)]
pub enum SetError {
    #[error("No domains loaded ({skipped} skipped)")]
    EmptyResult { skipped: usize },

    #[error("Domain list error: {message}")]
    ListError {
        kind: ListErrorKind,
        message: String,
    },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Route error: {message}")]
    RouteError {
        kind: RouteErrorKind,
        message: String,
    },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SetError {
    /// Number of skipped entries carried by an `EmptyResult`, if this is one.
    pub fn skipped(&self) -> Option<usize> {
        match self {
            SetError::EmptyResult { skipped } => Some(*skipped),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_display_includes_skipped() {
        let err = SetError::EmptyResult { skipped: 7 };
        let display = format!("{}", err);
        assert_eq!(display, "No domains loaded (7 skipped)");
        assert_eq!(err.skipped(), Some(7));
    }

    #[test]
    fn test_list_error_kind_is_matchable() {
        let err = SetError::ListError {
            kind: ListErrorKind::NotFound,
            message: "Unable to open file: /nope".into(),
        };
        match &err {
            SetError::ListError { kind, .. } => {
                assert!(matches!(kind, ListErrorKind::NotFound));
            }
            _ => panic!("expected ListError"),
        }
        assert_eq!(err.skipped(), None);
    }

    #[test]
    fn test_route_error_kind_is_matchable() {
        let err = SetError::RouteError {
            kind: RouteErrorKind::Rejected,
            message: "Unable to announce 192.0.2.1/32: peer down".into(),
        };
        match &err {
            SetError::RouteError { kind, .. } => {
                assert!(matches!(kind, RouteErrorKind::Rejected));
            }
            _ => panic!("expected RouteError"),
        }
    }

    #[test]
    fn test_json_error_converts() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: SetError = json_err.into();
        assert!(format!("{}", err).starts_with("JSON error:"));
    }
}
