//! Error types for groqspec.
//!
//! Library crates use [`GroqSpecError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all groqspec operations.
#[derive(Debug, thiserror::Error)]
pub enum GroqSpecError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The content-store access token env var is unset or empty.
    #[error("{env_var} is required")]
    MissingToken { env_var: String },

    /// Network/HTTP error talking to the content store.
    #[error("network error: {0}")]
    Network(String),

    /// The content store answered, but with an error or an unusable payload.
    #[error("content store error: {0}")]
    ContentStore(String),

    /// Payload or input parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Markdown-to-HTML compilation error.
    #[error("compile error: {0}")]
    Compile(String),

    /// Data validation error (empty document set, bad config value, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GroqSpecError>;

impl GroqSpecError {
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
        let err = GroqSpecError::config("unknown compiler 'latex'");
        assert_eq!(err.to_string(), "config error: unknown compiler 'latex'");

        let err = GroqSpecError::MissingToken {
            env_var: "SANITY_TOKEN".into(),
        };
        assert_eq!(err.to_string(), "SANITY_TOKEN is required");
    }

    #[test]
    fn io_error_keeps_path() {
        let err = GroqSpecError::io(
            "spec/GROQ.md",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("spec/GROQ.md"));
    }
}
