//! Error types for the resort-routes pipeline
//!
//! Fatal pre-flight errors (bad input files, malformed coordinates, unknown
//! home ids) bubble up to the caller; per-resort routing failures are caught
//! at the worker boundary and never surface here as anything but counts.

use std::fmt;

use strsim::jaro_winkler;

/// Minimum similarity before a home-id suggestion is offered
const SUGGESTION_THRESHOLD: f64 = 0.78;

/// Main error type for pipeline operations
#[derive(Debug)]
pub enum Error {
    /// Requested home id is not present in the homes file
    HomeNotFound {
        id: String,
        suggestion: Option<String>,
    },

    /// Invalid configuration, input file, or coordinate
    InvalidInput(String),

    /// HTTP-specific error (non-success status, undecodable body)
    HttpError(String),

    /// Network connectivity issues
    NetworkError(String),

    /// The routing engine answered but produced no usable route
    NoRoute(String),

    /// File I/O error
    IoError(std::io::Error),

    /// JSON (de)serialization error
    JsonError(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::HomeNotFound { id, suggestion } => match suggestion {
                Some(s) => write!(f, "Home '{}' not found. Did you mean '{}'?", id, s),
                None => write!(f, "Home '{}' not found in the homes file", id),
            },
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {}", msg)
            }
            Error::HttpError(msg) => {
                write!(f, "HTTP error: {}", msg)
            }
            Error::NetworkError(msg) => {
                write!(f, "Network error: {}", msg)
            }
            Error::NoRoute(msg) => {
                write!(f, "No route: {}", msg)
            }
            Error::IoError(err) => {
                write!(f, "I/O error: {}", err)
            }
            Error::JsonError(err) => {
                write!(f, "JSON error: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            Error::JsonError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::NetworkError(err.to_string())
        } else {
            Error::HttpError(err.to_string())
        }
    }
}

/// Convenience result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Suggest the closest known home id for a potentially misspelled one
pub fn suggest_home_id<'a, I>(requested: &str, known: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let requested_lower = requested.to_lowercase();
    let mut best: Option<(f64, &str)> = None;

    for id in known {
        let score = jaro_winkler(&requested_lower, &id.to_lowercase());
        if score > best.map(|(s, _)| s).unwrap_or(0.0) {
            best = Some((score, id));
        }
    }

    best.filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .map(|(_, id)| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_home_id_typo() {
        let ids = ["muc", "lju", "innsbruck"];
        assert_eq!(
            suggest_home_id("insbruck", ids.iter().copied()),
            Some("innsbruck".to_string())
        );
        assert_eq!(
            suggest_home_id("MUC", ids.iter().copied()),
            Some("muc".to_string())
        );
    }

    #[test]
    fn test_suggest_home_id_no_match() {
        let ids = ["muc", "lju"];
        assert_eq!(suggest_home_id("xyzzy", ids.iter().copied()), None);
    }

    #[test]
    fn test_home_not_found_display() {
        let err = Error::HomeNotFound {
            id: "insbruck".to_string(),
            suggestion: Some("innsbruck".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("insbruck"));
        assert!(msg.contains("Did you mean 'innsbruck'"));
    }
}
