//! Error types for the moderation console.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire console.
///
/// Every failure in the core is recoverable: callers either surface it to the
/// operator as a notice or return it from a console operation. Nothing here
/// terminates the process.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ModconError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Selection references records that do not exist
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Action is hidden for the current permissions or selection
    #[error("Action '{action}' is not available: {reason}")]
    ActionUnavailable { action: String, reason: String },

    /// Dispatch attempted without a captured reason
    #[error("Action '{0}' requires a reason")]
    ReasonRequired(String),

    /// Reason rejected by the reason policy
    #[error("Invalid reason: {0}")]
    InvalidReason(String),

    /// A batch is still loading
    #[error("A batch is already running")]
    Busy,

    /// confirm/submit_reason called with nothing pending
    #[error("No pending action")]
    NoPendingAction,

    /// Transport-level failure (connect, timeout, body read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ModconError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an ActionUnavailable error
    pub fn unavailable(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ActionUnavailable {
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates an Http error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if the backend rejected the request for exceeding its quota
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Http { status: 429, .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ModconError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ModconError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ModconError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ModconError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ModconError>`.
pub type Result<T> = std::result::Result<T, ModconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited() {
        assert!(ModconError::http(429, "Too many requests").is_rate_limited());
        assert!(!ModconError::http(500, "Internal Server Error").is_rate_limited());
        assert!(!ModconError::Busy.is_rate_limited());
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let err: ModconError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml").into();
        assert!(err.to_string().contains("NotFound"));
    }
}
