//! Error types for rewrite operations
//!
//! Classification itself never fails. Errors only surface while building
//! strategies, loading routing tables or assembling modules.

use thiserror::Error;

/// Main error type for rewrite operations
#[derive(Debug, Error)]
pub enum RewriteError {
    /// A configured pattern failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RewriteError {
    pub fn pattern(pattern: &str, source: regex::Error) -> Self {
        RewriteError::Pattern {
            pattern: pattern.to_string(),
            source,
        }
    }
}

/// Compile a regex, attaching the offending pattern on failure
pub(crate) fn compile(pattern: &str) -> Result<regex::Regex, RewriteError> {
    regex::Regex::new(pattern).map_err(|e| RewriteError::pattern(pattern, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_reports_source() {
        let err = compile("(unclosed").unwrap_err();
        assert!(matches!(err, RewriteError::Pattern { ref pattern, .. } if pattern == "(unclosed"));
        assert!(err.to_string().starts_with("Invalid pattern '(unclosed'"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: RewriteError = io.into();
        assert_eq!(err.to_string(), "I/O error: missing");
    }
}
