//! Error types for the task board
//!
//! Four board-level error kinds are surfaced to the user:
//! - Fetch failures (roster or initial group load)
//! - Validation failures (empty names, unknown members, empty task text)
//! - Write failures (remote add/update/delete)
//! - Subscription failures (live channel setup)
//!
//! None of them is fatal. The operation boundary converts each into a
//! banner message and carries on.

use std::path::PathBuf;

/// Errors reported by a remote store adapter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Addressed document does not exist
    #[error("document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },

    /// Store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Caller is not allowed to perform the operation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Document payload was rejected
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Classification of board errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Fetch,
    Validation,
    Write,
    Subscription,
}

/// Main board error type
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Initial roster or group load failed
    #[error("fetch failed: {message}")]
    Fetch {
        message: String,
        #[source]
        source: StoreError,
    },

    /// Input rejected before any remote call was made
    #[error("validation failed: {0}")]
    Validation(String),

    /// Remote add/update/delete failed
    #[error("write failed: {message}")]
    Write {
        message: String,
        #[source]
        source: StoreError,
    },

    /// Live channel could not be established
    #[error("subscription failed: {message}")]
    Subscription {
        message: String,
        #[source]
        source: StoreError,
    },
}

impl BoardError {
    /// Create fetch error
    #[inline]
    pub fn fetch(message: impl Into<String>, source: StoreError) -> Self {
        Self::Fetch {
            message: message.into(),
            source,
        }
    }

    /// Create validation error
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create write error
    #[inline]
    pub fn write(message: impl Into<String>, source: StoreError) -> Self {
        Self::Write {
            message: message.into(),
            source,
        }
    }

    /// Create subscription error
    #[inline]
    pub fn subscription(message: impl Into<String>, source: StoreError) -> Self {
        Self::Subscription {
            message: message.into(),
            source,
        }
    }

    /// Error classification
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Write { .. } => ErrorKind::Write,
            Self::Subscription { .. } => ErrorKind::Subscription,
        }
    }

    /// Text shown in the dashboard error banner
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Fetch { message, .. }
            | Self::Write { message, .. }
            | Self::Subscription { message, .. } => message,
            Self::Validation(message) => message,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for `BoardConfig`
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but a value is unusable
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_error_display() {
        let err = BoardError::validation("Group name cannot be empty");
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn user_message_is_banner_text() {
        let err = BoardError::write(
            "Failed to assign task",
            StoreError::Unavailable("offline".to_string()),
        );
        assert_eq!(err.user_message(), "Failed to assign task");
        assert_eq!(err.kind(), ErrorKind::Write);
    }

    #[test]
    fn source_is_preserved() {
        use std::error::Error;

        let err = BoardError::fetch(
            "Failed to fetch employees data",
            StoreError::PermissionDenied("employees".to_string()),
        );
        let source = err.source().unwrap();
        assert!(source.to_string().contains("permission denied"));
    }

    #[test]
    fn kinds() {
        let unavailable = || StoreError::Unavailable("x".to_string());
        assert_eq!(BoardError::fetch("f", unavailable()).kind(), ErrorKind::Fetch);
        assert_eq!(BoardError::validation("v").kind(), ErrorKind::Validation);
        assert_eq!(
            BoardError::subscription("s", unavailable()).kind(),
            ErrorKind::Subscription
        );
    }
}
