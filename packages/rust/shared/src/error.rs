//! Error types for ReportDesk.
//!
//! Library crates use [`ReportDeskError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ReportDesk operations.
#[derive(Debug, thiserror::Error)]
pub enum ReportDeskError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Malformed fragment data (JSON body or timestamp field).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (missing template, malformed input, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A rendering backend failed to produce its artifact.
    ///
    /// This never escapes the backend selector — it exists so backends can
    /// report failures that the selector turns into a fallback.
    #[error("render error: {0}")]
    Render(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ReportDeskError>;

impl ReportDeskError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ReportDeskError::config("no downloads directory");
        assert_eq!(err.to_string(), "config error: no downloads directory");

        let err = ReportDeskError::parse("invalid JSON at byte 12");
        assert!(err.to_string().contains("byte 12"));
    }
}
