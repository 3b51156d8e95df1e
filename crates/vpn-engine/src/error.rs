// ============================================
// File: crates/vpn-engine/src/error.rs
// ============================================
//! # Engine Error Types
//!
//! ## Last Modified
//! v0.1.0 - Initial engine errors with CLI tokens

use thiserror::Error;

use vpn_common::error::CommonError;
use vpn_directory::error::DirectoryError;

use crate::services::session::SessionState;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine error types.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration file could not be read or parsed.
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        /// Config file path
        path: String,
        /// Reader or parser message
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        /// Dotted field name
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// A server identifier failed validation.
    #[error("Invalid server id: {reason}")]
    InvalidId {
        /// Validator message
        reason: String,
    },

    /// The operation is not allowed from the current session state.
    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        /// Requested operation
        operation: &'static str,
        /// State at the time of the request
        state: SessionState,
    },

    /// A connect was cancelled by a disconnect.
    #[error("Connect cancelled")]
    Cancelled,

    /// A connection phase failed.
    #[error("Phase {phase} failed: {reason}")]
    PhaseFailed {
        /// Phase name
        phase: String,
        /// Driver message
        reason: String,
    },

    /// Directory error.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl EngineError {
    /// Creates a `ConfigLoad` error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ConfigInvalid` error.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `PhaseFailed` error.
    pub fn phase_failed(phase: impl ToString, reason: impl Into<String>) -> Self {
        Self::PhaseFailed {
            phase: phase.to_string(),
            reason: reason.into(),
        }
    }

    /// Maps a validator rejection to `InvalidId`.
    #[must_use]
    pub fn from_validation(err: CommonError) -> Self {
        let CommonError::InvalidInput { reason, .. } = err;
        Self::InvalidId { reason }
    }

    /// Single-token form printed by the CLI.
    #[must_use]
    pub const fn token(&self) -> &'static str {
        match self {
            Self::ConfigLoad { .. } | Self::ConfigInvalid { .. } => "ERROR_CONFIG",
            Self::InvalidId { .. } => "ERROR_INVALID_ID",
            Self::InvalidTransition { .. } => "ERROR_INVALID_TRANSITION",
            Self::Cancelled => "ERROR_CANCELLED",
            Self::PhaseFailed { .. } => "ERROR_PHASE_FAILED",
            Self::Directory(_) => "ERROR_INTERNAL",
        }
    }

    /// Returns `true` for configuration errors.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::ConfigInvalid { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::config_load("/etc/vpn-engine.toml", "file not found");
        assert!(err.to_string().contains("/etc/vpn-engine.toml"));

        let err = EngineError::InvalidTransition {
            operation: "disconnect",
            state: SessionState::Disconnected,
        };
        assert_eq!(err.to_string(), "Cannot disconnect while Disconnected");
    }

    #[test]
    fn test_tokens() {
        assert_eq!(EngineError::Cancelled.token(), "ERROR_CANCELLED");
        assert_eq!(
            EngineError::phase_failed("Handshake", "timeout").token(),
            "ERROR_PHASE_FAILED"
        );
        let err = EngineError::from_validation(CommonError::invalid_input("id", "bad"));
        assert_eq!(err.token(), "ERROR_INVALID_ID");

        let err = EngineError::from(DirectoryError::Cancelled);
        assert_eq!(err.token(), "ERROR_INTERNAL");
    }

    #[test]
    fn test_error_classification() {
        let config_err = EngineError::config_invalid("session.phase_delay_ms", "too large");
        assert!(config_err.is_config_error());
        assert_eq!(config_err.token(), "ERROR_CONFIG");
        assert!(EngineError::config_load("x", "y").is_config_error());
        assert!(!EngineError::Cancelled.is_config_error());
    }
}
