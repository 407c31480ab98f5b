//! Error types for execopts.

use thiserror::Error;

/// Main error type for execopts operations.
#[derive(Error, Debug)]
pub enum ExecOptionsError {
    /// A redaction pattern failed to compile.
    #[error("invalid redact pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Stat of a file-backed input source failed.
    #[error("failed to stat reader: {0}")]
    ReaderStat(#[source] std::io::Error),
}

/// Convenience Result type for execopts operations.
pub type Result<T> = std::result::Result<T, ExecOptionsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_display() {
        let source = regex::Regex::new("(unclosed").unwrap_err();
        let err = ExecOptionsError::InvalidPattern {
            pattern: "(unclosed".into(),
            source,
        };
        assert!(err.to_string().contains("invalid redact pattern"));
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_reader_stat_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ExecOptionsError::ReaderStat(io_err);
        assert!(err.to_string().contains("failed to stat reader"));
        assert!(err.to_string().contains("denied"));
    }
}
